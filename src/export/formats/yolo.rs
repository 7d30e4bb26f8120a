//! YOLO text encoders (detection and segmentation).
//!
//! One label file per image plus a `classes.txt` listing unified class
//! names, one per line, in unified-id order. Coordinates are normalized to
//! the image dimensions.

use std::path::Path;

use crate::augment::Geometry;
use crate::export::payload::{ExportImage, ExportPayload};

/// Encodes the detection variant: `class cx cy w h` per bbox annotation.
///
/// Polygon annotations are skipped; the selector never routes a
/// polygon-bearing detection payload here unless the user forced it.
pub fn encode_detection(payload: &ExportPayload) -> Vec<(String, String)> {
    encode_labels(payload, |geometry, image| match geometry {
        Geometry::Bbox { bbox } => {
            let [x, y, w, h] = *bbox;
            let (iw, ih) = image_dims(image);
            let cx = (x + w / 2.0) / iw;
            let cy = (y + h / 2.0) / ih;
            Some(format!(
                "{:.6} {:.6} {:.6} {:.6}",
                cx,
                cy,
                w / iw,
                h / ih
            ))
        }
        Geometry::Polygon { .. } => None,
    })
}

/// Encodes the segmentation variant: `class x1 y1 x2 y2 ...` per polygon.
///
/// Bbox annotations are skipped.
pub fn encode_segmentation(payload: &ExportPayload) -> Vec<(String, String)> {
    encode_labels(payload, |geometry, image| match geometry {
        Geometry::Polygon { points } => {
            let (iw, ih) = image_dims(image);
            let coords: Vec<String> = points
                .iter()
                .flat_map(|[x, y]| [format!("{:.6}", x / iw), format!("{:.6}", y / ih)])
                .collect();
            Some(coords.join(" "))
        }
        Geometry::Bbox { .. } => None,
    })
}

fn image_dims(image: &ExportImage) -> (f64, f64) {
    (image.width.max(1) as f64, image.height.max(1) as f64)
}

fn label_filename(image: &ExportImage) -> String {
    let stem = Path::new(&image.name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    format!("{}.txt", stem)
}

fn encode_labels<F>(payload: &ExportPayload, mut line_for: F) -> Vec<(String, String)>
where
    F: FnMut(&Geometry, &ExportImage) -> Option<String>,
{
    let mut files = Vec::with_capacity(payload.images.len() + 1);

    let classes: Vec<&str> = payload.classes.iter().map(|c| c.name.as_str()).collect();
    files.push(("classes.txt".to_string(), classes.join("\n")));

    for image in &payload.images {
        let mut lines = Vec::new();
        for annotation in payload.annotations.iter().filter(|a| a.image_id == image.id) {
            if let Some(coords) = line_for(&annotation.geometry, image) {
                lines.push(format!("{} {}", annotation.class_id, coords));
            }
        }
        files.push((label_filename(image), lines.join("\n")));
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::formats::tests::sample_payload;

    #[test]
    fn test_detection_normalizes_center_coordinates() {
        let files = encode_detection(&sample_payload());
        let (_, content) = files.iter().find(|(name, _)| name == "frame_0.txt").unwrap();
        // bbox [160, 120, 320, 240] in a 640x480 image is centered
        assert_eq!(content, "0 0.500000 0.500000 0.500000 0.500000");
    }

    #[test]
    fn test_detection_skips_polygons() {
        let files = encode_detection(&sample_payload());
        let (_, content) = files.iter().find(|(name, _)| name == "frame_1.txt").unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_segmentation_emits_normalized_points() {
        let files = encode_segmentation(&sample_payload());
        let (_, content) = files.iter().find(|(name, _)| name == "frame_1.txt").unwrap();
        assert_eq!(
            content,
            "1 0.000000 0.000000 1.000000 0.000000 0.500000 1.000000"
        );
    }

    #[test]
    fn test_classes_file_lists_unified_names_in_id_order() {
        let files = encode_detection(&sample_payload());
        let (_, content) = files.iter().find(|(name, _)| name == "classes.txt").unwrap();
        assert_eq!(content, "car\nperson");
    }
}
