//! Per-format annotation encoders.
//!
//! Each encoder consumes an [`EncodeRequest`] and produces either a
//! filename→content mapping or a single structured document. Encoders are
//! pure; all filesystem work happens in the artifact writer.

mod coco;
mod csv;
mod pascal_voc;
mod yolo;

use super::payload::ExportPayload;
use super::types::{ExportFormat, TaskType};
use super::ExportError;

/// Encoder input, shaped after the export request of the annotation tool.
#[derive(Debug, Clone)]
pub struct EncodeRequest<'a> {
    /// Payload with unified class ids.
    pub payload: &'a ExportPayload,
    /// Target interchange format.
    pub format: ExportFormat,
    /// Whether source images should be bundled alongside the annotations.
    pub include_images: bool,
    /// Dataset name embedded in container formats.
    pub dataset_name: String,
    /// Task the release serves.
    pub task_type: TaskType,
    /// Project type label embedded in container formats.
    pub project_type: String,
}

/// Encoder output.
#[derive(Debug, Clone)]
pub enum EncodedArtifacts {
    /// Filename → text content mapping (YOLO, Pascal VOC, CSV).
    Files(Vec<(String, String)>),
    /// A single JSON-serializable document (COCO).
    Document(serde_json::Value),
}

impl EncodedArtifacts {
    /// Number of files this output materializes to.
    pub fn file_count(&self) -> usize {
        match self {
            EncodedArtifacts::Files(files) => files.len(),
            EncodedArtifacts::Document(_) => 1,
        }
    }
}

/// Dispatches to the encoder for the requested format.
pub fn encode(request: &EncodeRequest<'_>) -> Result<EncodedArtifacts, ExportError> {
    match request.format {
        ExportFormat::YoloDetection => Ok(EncodedArtifacts::Files(yolo::encode_detection(
            request.payload,
        ))),
        ExportFormat::YoloSegmentation => Ok(EncodedArtifacts::Files(yolo::encode_segmentation(
            request.payload,
        ))),
        ExportFormat::Coco => Ok(EncodedArtifacts::Document(coco::encode(request))),
        ExportFormat::PascalVoc => Ok(EncodedArtifacts::Files(pascal_voc::encode(
            request.payload,
        )?)),
        ExportFormat::Csv => Ok(EncodedArtifacts::Files(csv::encode(request.payload))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::Geometry;
    use crate::export::payload::{ExportAnnotation, ExportImage, UnifiedClass};

    /// Two-image payload with one bbox and one polygon annotation.
    pub(super) fn sample_payload() -> ExportPayload {
        ExportPayload {
            images: vec![
                ExportImage {
                    id: 0,
                    name: "frame_0.jpg".to_string(),
                    width: 640,
                    height: 480,
                    file_path: "/data/frame_0.jpg".into(),
                },
                ExportImage {
                    id: 1,
                    name: "frame_1.jpg".to_string(),
                    width: 320,
                    height: 240,
                    file_path: "/data/frame_1.jpg".into(),
                },
            ],
            annotations: vec![
                ExportAnnotation {
                    id: 1,
                    image_id: 0,
                    class_id: 0,
                    class_name: "car".to_string(),
                    geometry: Geometry::Bbox {
                        bbox: [160.0, 120.0, 320.0, 240.0],
                    },
                    confidence: 0.9,
                },
                ExportAnnotation {
                    id: 2,
                    image_id: 1,
                    class_id: 1,
                    class_name: "person".to_string(),
                    geometry: Geometry::Polygon {
                        points: vec![[0.0, 0.0], [320.0, 0.0], [160.0, 240.0]],
                    },
                    confidence: 1.0,
                },
            ],
            classes: vec![UnifiedClass::new(0, "car"), UnifiedClass::new(1, "person")],
        }
    }

    pub(super) fn sample_request(payload: &ExportPayload, format: ExportFormat) -> EncodeRequest<'_> {
        EncodeRequest {
            payload,
            format,
            include_images: true,
            dataset_name: "release_test".to_string(),
            task_type: TaskType::ObjectDetection,
            project_type: "general".to_string(),
        }
    }

    #[test]
    fn test_encode_dispatch_covers_all_formats() {
        let payload = sample_payload();
        for format in [
            ExportFormat::YoloDetection,
            ExportFormat::YoloSegmentation,
            ExportFormat::Coco,
            ExportFormat::PascalVoc,
            ExportFormat::Csv,
        ] {
            let request = sample_request(&payload, format);
            let artifacts = encode(&request).unwrap();
            assert!(artifacts.file_count() >= 1, "{} produced nothing", format);
        }
    }
}
