//! Transform-assignment expansion seam.

use crate::storage::TransformationRecord;

use super::types::{TransformAssignment, TransformStep};

/// Expands a transformation catalog into per-image transform assignments.
///
/// The expansion policy (sampling, combination, parameter jitter) is an
/// external concern; the orchestrator only requires that every assignment
/// references a loaded image id.
pub trait TransformationExpander: Send + Sync {
    /// Produces assignments for `image_ids` from the ordered catalog,
    /// `images_per_original` variants per image.
    fn expand(
        &self,
        transformations: &[TransformationRecord],
        image_ids: &[String],
        images_per_original: u32,
    ) -> Vec<TransformAssignment>;
}

/// Default expander: every variant applies the full enabled chain in
/// catalog order.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChainExpander;

impl TransformationExpander for ChainExpander {
    fn expand(
        &self,
        transformations: &[TransformationRecord],
        image_ids: &[String],
        images_per_original: u32,
    ) -> Vec<TransformAssignment> {
        let steps: Vec<TransformStep> = transformations
            .iter()
            .map(|t| TransformStep {
                transformation_type: t.transformation_type.clone(),
                parameters: t.parameters.clone(),
            })
            .collect();

        let mut assignments = Vec::with_capacity(image_ids.len() * images_per_original as usize);
        for image_id in image_ids {
            for variant_index in 0..images_per_original {
                assignments.push(TransformAssignment {
                    image_id: image_id.clone(),
                    variant_index,
                    steps: steps.clone(),
                });
            }
        }
        assignments
    }
}
