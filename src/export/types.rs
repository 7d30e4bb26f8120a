//! Format and task-type tags.

use std::str::FromStr;

/// Annotation interchange formats the writer can materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// YOLO detection text format (normalized bboxes, one txt per image).
    YoloDetection,
    /// YOLO segmentation text format (normalized polygons).
    YoloSegmentation,
    /// Unified COCO JSON container.
    Coco,
    /// Pascal VOC, one XML document per image.
    PascalVoc,
    /// Flat tabular format, one row per annotation.
    Csv,
}

impl ExportFormat {
    /// Canonical lowercase tag used in records and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::YoloDetection => "yolo_detection",
            ExportFormat::YoloSegmentation => "yolo_segmentation",
            ExportFormat::Coco => "coco",
            ExportFormat::PascalVoc => "pascal_voc",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yolo_detection" | "yolo" => Ok(ExportFormat::YoloDetection),
            "yolo_segmentation" => Ok(ExportFormat::YoloSegmentation),
            "coco" => Ok(ExportFormat::Coco),
            "pascal_voc" | "voc" => Ok(ExportFormat::PascalVoc),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format '{}'", other)),
        }
    }
}

/// User-facing format selection, including the "auto" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatChoice {
    /// Let the selector inspect the results and pick a format.
    Auto,
    /// Use exactly this format, no inspection performed.
    Explicit(ExportFormat),
}

impl FormatChoice {
    /// Canonical tag ("auto" or the explicit format tag).
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatChoice::Auto => "auto",
            FormatChoice::Explicit(format) => format.as_str(),
        }
    }
}

impl std::fmt::Display for FormatChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "auto" {
            Ok(FormatChoice::Auto)
        } else {
            s.parse().map(FormatChoice::Explicit)
        }
    }
}

/// Task the release serves; drives automatic format selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskType {
    /// Bounding-box detection.
    #[default]
    ObjectDetection,
    /// Polygon segmentation.
    Segmentation,
    /// Anything else; COCO is used as the flexible fallback.
    Other,
}

impl TaskType {
    /// Canonical lowercase tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::ObjectDetection => "object_detection",
            TaskType::Segmentation => "segmentation",
            TaskType::Other => "other",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "object_detection" => Ok(TaskType::ObjectDetection),
            "segmentation" => Ok(TaskType::Segmentation),
            _ => Ok(TaskType::Other),
        }
    }
}
