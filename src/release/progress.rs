//! In-memory progress tracking for running releases.
//!
//! Each orchestrator instance owns its own tracker; nothing here is
//! process-global. Updates are expressed as typed patches and applied as a
//! single unit so a reader never sees a percentage computed from a stale
//! total paired with a newer processed count.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Lifecycle state of a release's progress entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    /// Entry exists but no processing has started.
    #[default]
    Pending,
    /// Pipeline stages are running.
    Processing,
    /// Terminal success.
    Completed,
    /// Terminal failure.
    Failed,
}

/// Transient per-release progress snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReleaseProgress {
    /// Lifecycle state.
    pub state: ProgressState,
    /// Derived completion percentage, never independently settable.
    pub percentage: f64,
    /// Free-form tag for the current pipeline step.
    pub current_step: String,
    /// Number of source images in scope.
    pub total_images: u64,
    /// Number of source images processed so far.
    pub processed_images: u64,
    /// Number of variants generated so far.
    pub generated_images: u64,
    /// Error message when state is failed.
    pub error_message: Option<String>,
    /// When processing started.
    pub started_at: Option<DateTime<Utc>>,
    /// When a terminal state was reached.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Typed partial update for a progress entry.
///
/// Only the fields set on the patch are merged; the percentage is always
/// recomputed from the merged counts.
#[derive(Debug, Clone, Default)]
pub struct ProgressPatch {
    state: Option<ProgressState>,
    current_step: Option<String>,
    total_images: Option<u64>,
    processed_images: Option<u64>,
    generated_images: Option<u64>,
    error_message: Option<String>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl ProgressPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lifecycle state.
    pub fn state(mut self, state: ProgressState) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the current step tag.
    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.current_step = Some(step.into());
        self
    }

    /// Sets the total image count.
    pub fn total_images(mut self, total: u64) -> Self {
        self.total_images = Some(total);
        self
    }

    /// Sets the processed image count.
    pub fn processed_images(mut self, processed: u64) -> Self {
        self.processed_images = Some(processed);
        self
    }

    /// Sets the generated variant count.
    pub fn generated_images(mut self, generated: u64) -> Self {
        self.generated_images = Some(generated);
        self
    }

    /// Sets the error message.
    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Sets the start timestamp.
    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(at);
        self
    }

    /// Sets the completion timestamp.
    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }
}

/// Keyed store of progress entries, one per release id.
#[derive(Default)]
pub struct ProgressTracker {
    entries: RwLock<HashMap<Uuid, ReleaseProgress>>,
}

impl ProgressTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a patch to a release's entry, creating a pending entry with
    /// zero counts on first reference.
    pub fn update(&self, release_id: Uuid, patch: ProgressPatch) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.entry(release_id).or_default();
        merge(entry, patch);
    }

    /// Returns a snapshot of a release's progress, if tracked.
    pub fn get(&self, release_id: Uuid) -> Option<ReleaseProgress> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(&release_id).cloned()
    }

    /// Removes a release's entry. No-op when absent.
    pub fn remove(&self, release_id: Uuid) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(&release_id);
    }
}

/// Merges a patch into an entry and recomputes the derived percentage.
///
/// The percentage is 100 * processed / total when total > 0, else 0; it is
/// forced to 100 on completion and never decreases while processing.
fn merge(entry: &mut ReleaseProgress, patch: ProgressPatch) {
    let previous_percentage = entry.percentage;

    if let Some(state) = patch.state {
        entry.state = state;
    }
    if let Some(step) = patch.current_step {
        entry.current_step = step;
    }
    if let Some(total) = patch.total_images {
        entry.total_images = total;
    }
    if let Some(processed) = patch.processed_images {
        entry.processed_images = processed;
    }
    if let Some(generated) = patch.generated_images {
        entry.generated_images = generated;
    }
    if let Some(message) = patch.error_message {
        entry.error_message = Some(message);
    }
    if let Some(at) = patch.started_at {
        entry.started_at = Some(at);
    }
    if let Some(at) = patch.completed_at {
        entry.completed_at = Some(at);
    }

    entry.percentage = if entry.state == ProgressState::Completed {
        100.0
    } else if entry.total_images > 0 {
        100.0 * entry.processed_images as f64 / entry.total_images as f64
    } else {
        0.0
    };

    if entry.state == ProgressState::Processing && entry.percentage < previous_percentage {
        entry.percentage = previous_percentage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_reference_creates_pending_entry() {
        let tracker = ProgressTracker::new();
        let id = Uuid::new_v4();

        tracker.update(id, ProgressPatch::new().step("loading_data"));

        let progress = tracker.get(id).unwrap();
        assert_eq!(progress.state, ProgressState::Pending);
        assert_eq!(progress.current_step, "loading_data");
        assert_eq!(progress.total_images, 0);
        assert_eq!(progress.percentage, 0.0);
    }

    #[test]
    fn test_percentage_derived_from_counts() {
        let tracker = ProgressTracker::new();
        let id = Uuid::new_v4();

        tracker.update(
            id,
            ProgressPatch::new()
                .state(ProgressState::Processing)
                .total_images(8)
                .processed_images(2),
        );
        assert_eq!(tracker.get(id).unwrap().percentage, 25.0);

        tracker.update(id, ProgressPatch::new().processed_images(8));
        assert_eq!(tracker.get(id).unwrap().percentage, 100.0);
    }

    #[test]
    fn test_zero_total_is_zero_percent() {
        let tracker = ProgressTracker::new();
        let id = Uuid::new_v4();

        tracker.update(
            id,
            ProgressPatch::new()
                .state(ProgressState::Processing)
                .processed_images(5),
        );
        assert_eq!(tracker.get(id).unwrap().percentage, 0.0);
    }

    #[test]
    fn test_completed_forces_full_percentage() {
        let tracker = ProgressTracker::new();
        let id = Uuid::new_v4();

        tracker.update(
            id,
            ProgressPatch::new()
                .state(ProgressState::Completed)
                .total_images(10)
                .processed_images(3),
        );
        assert_eq!(tracker.get(id).unwrap().percentage, 100.0);
    }

    #[test]
    fn test_percentage_monotonic_while_processing() {
        let tracker = ProgressTracker::new();
        let id = Uuid::new_v4();

        tracker.update(
            id,
            ProgressPatch::new()
                .state(ProgressState::Processing)
                .total_images(4)
                .processed_images(3),
        );
        assert_eq!(tracker.get(id).unwrap().percentage, 75.0);

        // A larger total would compute a lower value; the guard holds it.
        tracker.update(id, ProgressPatch::new().total_images(100));
        assert_eq!(tracker.get(id).unwrap().percentage, 75.0);
    }

    #[test]
    fn test_error_message_and_timestamps() {
        let tracker = ProgressTracker::new();
        let id = Uuid::new_v4();
        let now = Utc::now();

        tracker.update(
            id,
            ProgressPatch::new()
                .state(ProgressState::Failed)
                .error_message("no images")
                .completed_at(now),
        );

        let progress = tracker.get(id).unwrap();
        assert_eq!(progress.state, ProgressState::Failed);
        assert_eq!(progress.error_message.as_deref(), Some("no images"));
        assert_eq!(progress.completed_at, Some(now));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let tracker = ProgressTracker::new();
        let id = Uuid::new_v4();

        tracker.update(id, ProgressPatch::new());
        tracker.remove(id);
        assert!(tracker.get(id).is_none());
        tracker.remove(id);
    }
}
