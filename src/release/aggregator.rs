//! Annotation aggregation into a format-agnostic export payload.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::augment::GenerationResults;
use crate::export::{ExportAnnotation, ExportImage, ExportPayload, UnifiedClass};

const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;

/// Merges per-image generation output into one [`ExportPayload`].
///
/// Image ids are assigned sequentially from 0 in iteration order over all
/// variants of all sources; annotation ids start at 1. Class ids are
/// unified: every distinct class name across the results is collected,
/// sorted lexicographically, and assigned ids 0..k-1 in that order, so two
/// annotations with the same class name always share an id regardless of
/// the executor-scoped local ids they arrived with.
pub fn aggregate(results: &GenerationResults) -> ExportPayload {
    let mut names = BTreeSet::new();
    for (_, variants) in results {
        for variant in variants {
            for annotation in &variant.annotations {
                names.insert(annotation.class_name.clone());
            }
        }
    }

    let classes: Vec<UnifiedClass> = names
        .iter()
        .enumerate()
        .map(|(id, name)| UnifiedClass::new(id, name.clone()))
        .collect();
    let class_ids: HashMap<&str, usize> = classes
        .iter()
        .map(|class| (class.name.as_str(), class.id))
        .collect();

    let mut images = Vec::new();
    let mut annotations = Vec::new();
    let mut annotation_id = 1;

    for (_, variants) in results {
        for variant in variants {
            let image_id = images.len();
            let name = variant
                .output_filename
                .clone()
                .unwrap_or_else(|| format!("image_{}.jpg", image_id));

            images.push(ExportImage {
                id: image_id,
                name,
                width: variant.width.unwrap_or(DEFAULT_WIDTH),
                height: variant.height.unwrap_or(DEFAULT_HEIGHT),
                file_path: variant.output_path.clone(),
            });

            for annotation in &variant.annotations {
                let class_id = match class_ids.get(annotation.class_name.as_str()) {
                    Some(&id) => id,
                    None => {
                        warn!(
                            class_name = %annotation.class_name,
                            "Class name missing from unified lookup"
                        );
                        0
                    }
                };
                annotations.push(ExportAnnotation {
                    id: annotation_id,
                    image_id,
                    class_id,
                    class_name: annotation.class_name.clone(),
                    geometry: annotation.geometry.clone(),
                    confidence: annotation.confidence,
                });
                annotation_id += 1;
            }
        }
    }

    debug!(
        images = images.len(),
        annotations = annotations.len(),
        classes = classes.len(),
        "Aggregated generation results"
    );

    ExportPayload {
        images,
        annotations,
        classes,
    }
}
