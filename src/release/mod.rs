//! Release generation pipeline.

mod aggregator;
mod config;
mod orchestrator;
mod paths;
mod progress;
mod selector;

pub use aggregator::aggregate;
pub use config::ReleaseConfig;
pub use orchestrator::{ReleaseError, ReleaseOrchestrator, ReleaseSummary};
pub use paths::PathResolver;
pub use progress::{ProgressPatch, ProgressState, ProgressTracker, ReleaseProgress};
pub use selector::select_export_format;
