//! Release generation configuration.

use crate::export::{FormatChoice, TaskType};
use crate::storage::ReleaseOptions;

/// Immutable input describing one release attempt.
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    /// Release name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Owning project.
    pub project_id: String,
    /// Ordered set of datasets to draw images from.
    pub dataset_ids: Vec<String>,
    /// Requested export format, or the "auto" sentinel.
    pub export_format: FormatChoice,
    /// Task the release serves.
    pub task_type: TaskType,
    /// Augmented variants to generate per original image.
    pub images_per_original: u32,
    /// Sampling strategy tag passed through to the expander.
    pub sampling_strategy: String,
    /// Encoding for generated images.
    pub output_encoding: String,
    /// Count originals toward the final image total.
    pub include_original: bool,
    /// Bundle source images into the export artifact.
    pub include_images: bool,
}

impl ReleaseConfig {
    /// Creates a configuration with default generation options.
    pub fn new(name: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            project_id: project_id.into(),
            dataset_ids: Vec::new(),
            export_format: FormatChoice::Auto,
            task_type: TaskType::ObjectDetection,
            images_per_original: 4,
            sampling_strategy: "intelligent".to_string(),
            output_encoding: "jpg".to_string(),
            include_original: true,
            include_images: true,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the datasets to include.
    pub fn with_datasets(mut self, dataset_ids: Vec<String>) -> Self {
        self.dataset_ids = dataset_ids;
        self
    }

    /// Sets the export format choice.
    pub fn with_format(mut self, export_format: FormatChoice) -> Self {
        self.export_format = export_format;
        self
    }

    /// Sets the task type.
    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    /// Sets the variants-per-original count.
    pub fn with_images_per_original(mut self, count: u32) -> Self {
        self.images_per_original = count;
        self
    }

    /// Sets whether originals count toward the final total.
    pub fn with_include_original(mut self, include: bool) -> Self {
        self.include_original = include;
        self
    }

    /// Snapshot of the numeric/flag options for persistence.
    pub fn options(&self) -> ReleaseOptions {
        ReleaseOptions {
            images_per_original: self.images_per_original,
            sampling_strategy: self.sampling_strategy.clone(),
            output_encoding: self.output_encoding.clone(),
            include_original: self.include_original,
        }
    }
}
