//! Augmentation execution seam.
//!
//! The executor owns everything pixel-level: applying transform chains,
//! re-projecting annotations, and writing output images under the
//! release-scoped output root. The orchestrator invokes it as a single
//! blocking call; any internal parallelism is opaque.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;

use super::types::{GeneratedVariant, GenerationResults, SplitSection, TransformAssignment};

/// Errors surfaced by an augmentation executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Reading a source or writing an output image failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The executor rejected the request or failed mid-run.
    #[error("Augmentation failed: {0}")]
    Failed(String),
}

/// Everything an executor needs for one release run.
#[derive(Debug, Clone)]
pub struct AugmentationRequest {
    /// Resolved source image paths, in processing order.
    pub image_paths: Vec<PathBuf>,
    /// Per-image transform assignments from the expander.
    pub assignments: Vec<TransformAssignment>,
    /// Split section for each resolved path.
    pub splits: HashMap<PathBuf, SplitSection>,
    /// Source image id for each resolved path.
    pub image_ids: HashMap<PathBuf, String>,
    /// Release-scoped root for output images.
    pub output_root: PathBuf,
    /// Encoding for output images (e.g. "jpg").
    pub output_encoding: String,
}

/// Applies transform assignments to images and returns transformed images
/// with transformed annotations.
#[async_trait]
pub trait AugmentationExecutor: Send + Sync {
    /// Runs the full augmentation pass for one release.
    ///
    /// Returns one variant list per source path, in the order the paths
    /// were supplied. Every produced annotation carries a geometry-kind tag.
    async fn run(&self, request: AugmentationRequest) -> Result<GenerationResults, ExecutorError>;
}

/// Executor that copies each source once per assigned variant without
/// touching pixels or producing annotations.
///
/// Useful for wiring the pipeline before a real augmentation engine is
/// plugged in, and as the CLI default.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughExecutor;

#[async_trait]
impl AugmentationExecutor for PassthroughExecutor {
    async fn run(&self, request: AugmentationRequest) -> Result<GenerationResults, ExecutorError> {
        let mut results: GenerationResults = Vec::with_capacity(request.image_paths.len());

        for path in &request.image_paths {
            let image_id = match request.image_ids.get(path) {
                Some(id) => id.as_str(),
                None => continue,
            };
            let split = request.splits.get(path).copied().unwrap_or_default();
            let split_dir = request.output_root.join(split.as_str());
            fs::create_dir_all(&split_dir).await?;

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("image")
                .to_string();

            let mut variants = Vec::new();
            for assignment in request.assignments.iter().filter(|a| a.image_id == image_id) {
                let filename = format!(
                    "{}_aug{}.{}",
                    stem, assignment.variant_index, request.output_encoding
                );
                let output_path = split_dir.join(&filename);
                fs::copy(path, &output_path).await?;

                variants.push(GeneratedVariant {
                    output_filename: Some(filename),
                    output_path,
                    width: None,
                    height: None,
                    annotations: Vec::new(),
                });
            }
            results.push((path.clone(), variants));
        }

        Ok(results)
    }
}
