//! Flat tabular encoder: one row per annotation.

use std::collections::HashMap;

use crate::augment::Geometry;
use crate::export::payload::ExportPayload;

const HEADER: &str =
    "image_name,image_width,image_height,class_id,class_name,type,confidence,x,y,width,height,points";

/// Encodes the payload as a single `annotations.csv` file.
pub fn encode(payload: &ExportPayload) -> Vec<(String, String)> {
    let images: HashMap<usize, _> = payload.images.iter().map(|i| (i.id, i)).collect();

    let mut lines = Vec::with_capacity(payload.annotations.len() + 1);
    lines.push(HEADER.to_string());

    for annotation in &payload.annotations {
        let (name, width, height) = match images.get(&annotation.image_id) {
            Some(image) => (image.name.as_str(), image.width, image.height),
            None => ("", 0, 0),
        };
        let name = escape(name);
        let class_name = escape(&annotation.class_name);

        let (kind, bbox_cols, points_col) = match &annotation.geometry {
            Geometry::Bbox { bbox } => {
                let [x, y, w, h] = *bbox;
                ("bbox", format!("{},{},{},{}", x, y, w, h), String::new())
            }
            Geometry::Polygon { points } => {
                let serialized: Vec<String> =
                    points.iter().map(|[x, y]| format!("{} {}", x, y)).collect();
                ("polygon", ",,,".to_string(), serialized.join(";"))
            }
        };

        lines.push(format!(
            "{},{},{},{},{},{},{},{},{}",
            name,
            width,
            height,
            annotation.class_id,
            class_name,
            kind,
            annotation.confidence,
            bbox_cols,
            points_col
        ));
    }

    vec![("annotations.csv".to_string(), lines.join("\n"))]
}

/// Quotes a field when it would otherwise shift the column layout.
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
