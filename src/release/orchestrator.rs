//! Release generation orchestration.
//!
//! Sequences catalog loading, image resolution, augmentation, annotation
//! aggregation, format selection, and artifact writing for one release
//! attempt, while keeping the release record and the in-memory progress
//! entry in step with the pipeline.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::fs;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::augment::{
    AugmentationExecutor, AugmentationRequest, ExecutorError, GenerationResults, SplitSection,
    TransformationExpander,
};
use crate::export::{
    ExportArtifactWriter, ExportError, ExportFormat, TaskType, WriteRequest,
};
use crate::storage::{Database, DatabaseError, ImageRecord, ReleaseRecord};

use super::aggregator::aggregate;
use super::config::ReleaseConfig;
use super::paths::PathResolver;
use super::progress::{ProgressPatch, ProgressState, ProgressTracker, ReleaseProgress};
use super::selector::select_export_format;

/// Errors surfaced by release generation.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// No enabled, pending transformations exist for the requested version.
    #[error("No pending transformations for version '{0}'")]
    NoTransformations(String),

    /// The requested datasets contain no eligible images.
    #[error("No images found in datasets {0:?}")]
    NoImages(Vec<String>),

    /// Persistence operation failed.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Export artifact generation failed (strict mode only).
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// The augmentation executor failed.
    #[error("Augmentation error: {0}")]
    Execution(#[from] ExecutorError),

    /// Filesystem operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Condensed view of a past release for history listings.
#[derive(Debug, Clone)]
pub struct ReleaseSummary {
    /// Release id.
    pub id: Uuid,
    /// Release name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Export format tag recorded for the release.
    pub export_format: String,
    /// Task the release served.
    pub task_type: TaskType,
    /// Count of source images actually processed.
    pub total_original_images: Option<i64>,
    /// Count of generated variants.
    pub total_augmented_images: Option<i64>,
    /// Final image total, once counts were committed.
    pub final_image_count: Option<i64>,
    /// Output location, once set.
    pub output_path: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<ReleaseRecord> for ReleaseSummary {
    fn from(record: ReleaseRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            export_format: record.export_format.as_str().to_string(),
            task_type: record.task_type,
            total_original_images: record.total_original_images,
            total_augmented_images: record.total_augmented_images,
            final_image_count: record.final_image_count,
            output_path: record.output_path,
            created_at: record.created_at,
        }
    }
}

/// Drives the full release generation pipeline.
///
/// Each instance owns its own progress tracker; concurrent releases share
/// nothing beyond the database, which serializes its own writes.
pub struct ReleaseOrchestrator {
    db: Arc<Database>,
    expander: Arc<dyn TransformationExpander>,
    executor: Arc<dyn AugmentationExecutor>,
    resolver: PathResolver,
    progress: ProgressTracker,
    writer: ExportArtifactWriter,
    release_root: PathBuf,
    strict_export: bool,
}

impl ReleaseOrchestrator {
    /// Creates an orchestrator writing releases under `release_root`.
    pub fn new(
        db: Arc<Database>,
        expander: Arc<dyn TransformationExpander>,
        executor: Arc<dyn AugmentationExecutor>,
        release_root: impl Into<PathBuf>,
    ) -> Self {
        let release_root = release_root.into();
        Self {
            db,
            expander,
            executor,
            resolver: PathResolver::with_default_bases(),
            progress: ProgressTracker::new(),
            writer: ExportArtifactWriter::new(release_root.clone()),
            release_root,
            strict_export: false,
        }
    }

    /// Replaces the path resolver.
    pub fn with_resolver(mut self, resolver: PathResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Fails the whole release when export generation fails.
    ///
    /// Off by default: an export failure is logged and the release still
    /// completes without artifacts.
    pub fn with_strict_export(mut self, strict: bool) -> Self {
        self.strict_export = strict;
        self
    }

    /// Generates a release from the given configuration and catalog version.
    ///
    /// Runs the pipeline to completion or failure; there is no retry and no
    /// internal timeout. On any failure the progress entry is moved to
    /// failed with the error message before the error is returned.
    pub async fn generate(
        &self,
        config: ReleaseConfig,
        version: &str,
    ) -> Result<Uuid, ReleaseError> {
        let release_id = Uuid::new_v4();
        info!(
            %release_id,
            release_name = %config.name,
            version,
            "Starting release generation"
        );

        match self.run_pipeline(release_id, &config, version).await {
            Ok(()) => {
                info!(%release_id, "Release generation completed");
                Ok(release_id)
            }
            Err(err) => {
                error!(%release_id, error = %err, "Release generation failed");
                self.progress.update(
                    release_id,
                    ProgressPatch::new()
                        .state(ProgressState::Failed)
                        .error_message(err.to_string())
                        .completed_at(Utc::now()),
                );
                Err(err)
            }
        }
    }

    async fn run_pipeline(
        &self,
        release_id: Uuid,
        config: &ReleaseConfig,
        version: &str,
    ) -> Result<(), ReleaseError> {
        let record = ReleaseRecord {
            id: release_id,
            project_id: config.project_id.clone(),
            name: config.name.clone(),
            description: config.description.clone(),
            export_format: config.export_format,
            task_type: config.task_type,
            dataset_ids: config.dataset_ids.clone(),
            options: config.options(),
            total_original_images: None,
            total_augmented_images: None,
            final_image_count: None,
            output_path: None,
            created_at: Utc::now(),
        };
        self.db.insert_release(&record).await?;
        self.progress.update(
            release_id,
            ProgressPatch::new()
                .state(ProgressState::Processing)
                .step("loading_data")
                .started_at(Utc::now()),
        );

        let transformations = self.db.pending_transformations(version).await?;
        if transformations.is_empty() {
            return Err(ReleaseError::NoTransformations(version.to_string()));
        }

        let images = self.db.dataset_images(&config.dataset_ids).await?;
        if images.is_empty() {
            return Err(ReleaseError::NoImages(config.dataset_ids.clone()));
        }
        info!(
            %release_id,
            transformations = transformations.len(),
            images = images.len(),
            "Loaded catalog and image index"
        );

        self.progress.update(
            release_id,
            ProgressPatch::new()
                .total_images(images.len() as u64)
                .step("generating_configurations"),
        );
        let image_ids: Vec<String> = images.iter().map(|image| image.id.clone()).collect();
        let assignments =
            self.expander
                .expand(&transformations, &image_ids, config.images_per_original);

        self.progress
            .update(release_id, ProgressPatch::new().step("processing_images"));
        let resolved = self.resolve_images(&images);

        let output_root = self.release_root.join(release_id.to_string());
        let request = AugmentationRequest {
            image_paths: resolved.paths.clone(),
            assignments,
            splits: resolved.splits,
            image_ids: resolved.ids,
            output_root: output_root.clone(),
            output_encoding: config.output_encoding.clone(),
        };
        let results = self.executor.run(request).await?;

        let processed = resolved.paths.len() as u64;
        let generated: u64 = results
            .iter()
            .map(|(_, variants)| variants.len() as u64)
            .sum();
        let final_count = generated as i64
            + if config.include_original {
                processed as i64
            } else {
                0
            };
        self.progress.update(
            release_id,
            ProgressPatch::new()
                .processed_images(processed)
                .generated_images(generated)
                .step("finalizing"),
        );
        self.db
            .update_release_counts(
                release_id,
                processed as i64,
                generated as i64,
                final_count,
                &output_root.display().to_string(),
            )
            .await?;

        let transformation_ids: Vec<String> = transformations
            .iter()
            .map(|record| record.id.clone())
            .collect();
        self.db
            .mark_transformations_completed(&transformation_ids, release_id)
            .await?;

        let format = select_export_format(&results, config.export_format, config.task_type);
        self.write_export(release_id, config, &results, format)
            .await?;

        self.progress.update(
            release_id,
            ProgressPatch::new()
                .state(ProgressState::Completed)
                .step("completed")
                .completed_at(Utc::now()),
        );
        Ok(())
    }

    /// Resolves each image's stored path, skipping unresolvable images with
    /// a warning. Skipped images are excluded from the executor call and
    /// from the processed/generated counts.
    fn resolve_images(&self, images: &[ImageRecord]) -> ResolvedImages {
        let mut resolved = ResolvedImages::default();
        for image in images {
            let path = self.resolver.resolve(std::path::Path::new(&image.file_path));
            if !path.exists() {
                warn!(
                    image_id = %image.id,
                    path = %image.file_path,
                    "Image path did not resolve, skipping"
                );
                continue;
            }
            resolved.splits.insert(path.clone(), image.split_section);
            resolved.ids.insert(path.clone(), image.id.clone());
            resolved.paths.push(path);
        }
        resolved
    }

    /// Aggregates the results and writes export artifacts.
    ///
    /// In lenient mode (the default) a failure here is logged and swallowed,
    /// so the release still completes without an export artifact. Strict
    /// mode propagates the failure instead.
    async fn write_export(
        &self,
        release_id: Uuid,
        config: &ReleaseConfig,
        results: &GenerationResults,
        format: ExportFormat,
    ) -> Result<(), ReleaseError> {
        let payload = aggregate(results);
        let request = WriteRequest {
            release_id,
            format,
            include_images: config.include_images,
            dataset_name: config.name.clone(),
            task_type: config.task_type,
            project_type: config.task_type.to_string(),
        };

        match self.writer.write(&payload, &request).await {
            Ok(export_dir) => {
                self.db
                    .update_release_export(
                        release_id,
                        &export_dir.display().to_string(),
                        format.as_str(),
                        config.task_type,
                    )
                    .await?;
                Ok(())
            }
            Err(err) if self.strict_export => Err(err.into()),
            Err(err) => {
                error!(
                    %release_id,
                    error = %err,
                    "Export generation failed, release completes without artifacts"
                );
                Ok(())
            }
        }
    }

    /// Returns a snapshot of a release's progress, if tracked.
    pub fn progress(&self, release_id: Uuid) -> Option<ReleaseProgress> {
        self.progress.get(release_id)
    }

    /// Lists a project's past releases, most recent first.
    pub async fn history(
        &self,
        project_id: &str,
        limit: i64,
    ) -> Result<Vec<ReleaseSummary>, ReleaseError> {
        let records = self.db.list_releases(project_id, limit).await?;
        Ok(records.into_iter().map(ReleaseSummary::from).collect())
    }

    /// Removes a failed release's output directory and progress entry.
    ///
    /// Idempotent: calling it again, or for a release that never produced
    /// output, is a no-op.
    pub async fn cleanup_failed(&self, release_id: Uuid) -> Result<(), ReleaseError> {
        let output_dir = self.release_root.join(release_id.to_string());
        if fs::metadata(&output_dir).await.is_ok() {
            fs::remove_dir_all(&output_dir).await?;
            info!(%release_id, "Removed failed release output");
        }
        self.progress.remove(release_id);
        Ok(())
    }
}

#[derive(Default)]
struct ResolvedImages {
    paths: Vec<PathBuf>,
    splits: HashMap<PathBuf, SplitSection>,
    ids: HashMap<PathBuf, String>,
}
