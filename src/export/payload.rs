//! Format-agnostic export payload consumed by the encoders.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::augment::Geometry;

/// Supercategory label applied to every unified class.
pub const SUPERCATEGORY: &str = "object";

/// One image entry in the export payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportImage {
    /// Sequential id, 0-based, in the order images were encountered.
    pub id: usize,
    /// Output filename.
    pub name: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Location of the image on disk (source for the `images/` copy).
    pub file_path: PathBuf,
}

/// One annotation entry, rewritten against the unified class list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportAnnotation {
    /// Sequential id, 1-based.
    pub id: usize,
    /// Image this annotation belongs to.
    pub image_id: usize,
    /// Index into the payload's unified class list.
    pub class_id: usize,
    /// Unified class name.
    pub class_name: String,
    /// Geometry payload with its kind tag.
    #[serde(flatten)]
    pub geometry: Geometry,
    /// Detection confidence.
    pub confidence: f64,
}

/// A class name/id pairing consistent across the entire payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedClass {
    /// Position in the alphabetically sorted class-name set.
    pub id: usize,
    /// Class name.
    pub name: String,
    /// Constant supercategory label.
    pub supercategory: String,
}

impl UnifiedClass {
    /// Creates a unified class with the constant supercategory.
    pub fn new(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            supercategory: SUPERCATEGORY.to_string(),
        }
    }
}

/// Aggregator output and encoder input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportPayload {
    /// Image list with sequential ids.
    pub images: Vec<ExportImage>,
    /// Annotations referencing unified class ids.
    pub annotations: Vec<ExportAnnotation>,
    /// Unified class list, sorted by name.
    pub classes: Vec<UnifiedClass>,
}

impl ExportPayload {
    /// Default constructor for an empty payload.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unified_class_supercategory() {
        let class = UnifiedClass::new(0, "car");
        assert_eq!(class.supercategory, "object");
        assert_eq!(class.name, "car");
    }
}
