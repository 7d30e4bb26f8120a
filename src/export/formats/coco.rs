//! COCO JSON encoder.
//!
//! Produces the standard info/images/annotations/categories container.
//! Polygons are emitted as COCO segmentations with a derived bounding box;
//! bboxes pass through with an empty segmentation list.

use chrono::Utc;
use serde_json::{json, Value};

use crate::augment::Geometry;
use crate::export::formats::EncodeRequest;

/// Encodes the payload as one COCO document.
pub fn encode(request: &EncodeRequest<'_>) -> Value {
    let payload = request.payload;

    let images: Vec<Value> = payload
        .images
        .iter()
        .map(|image| {
            json!({
                "id": image.id,
                "file_name": image.name,
                "width": image.width,
                "height": image.height,
            })
        })
        .collect();

    let annotations: Vec<Value> = payload
        .annotations
        .iter()
        .map(|annotation| {
            let (bbox, segmentation) = match &annotation.geometry {
                Geometry::Bbox { bbox } => (bbox.to_vec(), Vec::<Vec<f64>>::new()),
                Geometry::Polygon { points } => {
                    (polygon_extent(points), vec![flatten_points(points)])
                }
            };
            let area = bbox[2] * bbox[3];
            json!({
                "id": annotation.id,
                "image_id": annotation.image_id,
                "category_id": annotation.class_id,
                "bbox": bbox,
                "segmentation": segmentation,
                "area": area,
                "iscrowd": 0,
                "score": annotation.confidence,
            })
        })
        .collect();

    let categories: Vec<Value> = payload
        .classes
        .iter()
        .map(|class| {
            json!({
                "id": class.id,
                "name": class.name,
                "supercategory": class.supercategory,
            })
        })
        .collect();

    json!({
        "info": {
            "description": request.dataset_name,
            "task_type": request.task_type.as_str(),
            "project_type": request.project_type,
            "date_created": Utc::now().to_rfc3339(),
        },
        "licenses": [],
        "images": images,
        "annotations": annotations,
        "categories": categories,
    })
}

/// `[x, y, w, h]` extent of a polygon.
fn polygon_extent(points: &[[f64; 2]]) -> Vec<f64> {
    if points.is_empty() {
        return vec![0.0, 0.0, 0.0, 0.0];
    }
    let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
    let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
    for [x, y] in points {
        min_x = min_x.min(*x);
        min_y = min_y.min(*y);
        max_x = max_x.max(*x);
        max_y = max_y.max(*y);
    }
    vec![min_x, min_y, max_x - min_x, max_y - min_y]
}

fn flatten_points(points: &[[f64; 2]]) -> Vec<f64> {
    points.iter().flat_map(|[x, y]| [*x, *y]).collect()
}
