//! Export-format selection.

use tracing::debug;

use crate::augment::GenerationResults;
use crate::export::{ExportFormat, FormatChoice, TaskType};

/// Chooses the export format for a release.
///
/// An explicit user choice always wins without inspecting the results.
/// Under the "auto" sentinel the decision is driven by the task type and
/// the geometry kinds present in the generated annotations:
///
/// * segmentation with polygons uses the YOLO segmentation format;
/// * segmentation without polygons falls back to COCO;
/// * detection with only bboxes (or no geometry at all) uses YOLO detection;
/// * detection with polygons present falls back to COCO;
/// * any other task type uses COCO.
pub fn select_export_format(
    results: &GenerationResults,
    choice: FormatChoice,
    task_type: TaskType,
) -> ExportFormat {
    if let FormatChoice::Explicit(format) = choice {
        return format;
    }

    let mut has_polygons = false;
    let mut has_bboxes = false;
    for (_, variants) in results {
        for variant in variants {
            for annotation in &variant.annotations {
                has_polygons |= annotation.geometry.is_polygon();
                has_bboxes |= annotation.geometry.is_bbox();
            }
        }
    }

    let format = match task_type {
        TaskType::Segmentation if has_polygons => ExportFormat::YoloSegmentation,
        TaskType::Segmentation => ExportFormat::Coco,
        TaskType::ObjectDetection if has_polygons => ExportFormat::Coco,
        TaskType::ObjectDetection => ExportFormat::YoloDetection,
        TaskType::Other => ExportFormat::Coco,
    };

    debug!(
        task_type = %task_type,
        has_polygons,
        has_bboxes,
        format = %format,
        "Selected export format"
    );
    format
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::{Annotation, GeneratedVariant, Geometry};
    use std::path::PathBuf;

    fn results_with(geometries: Vec<Geometry>) -> GenerationResults {
        let annotations = geometries
            .into_iter()
            .map(|geometry| Annotation::new("obj", 0, geometry))
            .collect();
        vec![(
            PathBuf::from("a.jpg"),
            vec![GeneratedVariant {
                output_filename: Some("a_aug0.jpg".to_string()),
                output_path: PathBuf::from("out/a_aug0.jpg"),
                width: Some(640),
                height: Some(480),
                annotations,
            }],
        )]
    }

    fn bbox() -> Geometry {
        Geometry::Bbox {
            bbox: [0.0, 0.0, 10.0, 10.0],
        }
    }

    fn polygon() -> Geometry {
        Geometry::Polygon {
            points: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        }
    }

    #[test]
    fn test_explicit_choice_wins() {
        let results = results_with(vec![polygon()]);
        assert_eq!(
            select_export_format(
                &results,
                FormatChoice::Explicit(ExportFormat::Coco),
                TaskType::Segmentation
            ),
            ExportFormat::Coco
        );
    }

    #[test]
    fn test_segmentation_with_polygons() {
        let results = results_with(vec![polygon(), bbox()]);
        assert_eq!(
            select_export_format(&results, FormatChoice::Auto, TaskType::Segmentation),
            ExportFormat::YoloSegmentation
        );
    }

    #[test]
    fn test_segmentation_without_polygons() {
        let results = results_with(vec![bbox()]);
        assert_eq!(
            select_export_format(&results, FormatChoice::Auto, TaskType::Segmentation),
            ExportFormat::Coco
        );
    }

    #[test]
    fn test_detection_bbox_only() {
        let results = results_with(vec![bbox()]);
        assert_eq!(
            select_export_format(&results, FormatChoice::Auto, TaskType::ObjectDetection),
            ExportFormat::YoloDetection
        );
    }

    #[test]
    fn test_detection_with_polygons() {
        let results = results_with(vec![bbox(), polygon()]);
        assert_eq!(
            select_export_format(&results, FormatChoice::Auto, TaskType::ObjectDetection),
            ExportFormat::Coco
        );
    }

    #[test]
    fn test_detection_no_annotations_defaults() {
        let results = results_with(vec![]);
        assert_eq!(
            select_export_format(&results, FormatChoice::Auto, TaskType::ObjectDetection),
            ExportFormat::YoloDetection
        );
    }

    #[test]
    fn test_other_task_type() {
        let results = results_with(vec![bbox()]);
        assert_eq!(
            select_export_format(&results, FormatChoice::Auto, TaskType::Other),
            ExportFormat::Coco
        );
    }
}
