//! Data exchanged with the augmentation collaborators.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Train/val/test partition an image belongs to within its dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitSection {
    /// Training split (the default when a record carries none).
    #[default]
    Train,
    /// Validation split.
    Val,
    /// Test split.
    Test,
}

impl SplitSection {
    /// Returns the canonical lowercase name of the split.
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitSection::Train => "train",
            SplitSection::Val => "val",
            SplitSection::Test => "test",
        }
    }
}

impl std::fmt::Display for SplitSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(SplitSection::Train),
            "val" | "valid" | "validation" => Ok(SplitSection::Val),
            "test" => Ok(SplitSection::Test),
            other => Err(format!("unknown split section '{}'", other)),
        }
    }
}

/// Geometry carried by an annotation, tagged by kind.
///
/// Bounding boxes are `[x, y, width, height]` in pixels; polygons are
/// lists of `[x, y]` points in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    /// Axis-aligned bounding box.
    Bbox {
        /// `[x, y, width, height]` in pixel coordinates.
        bbox: [f64; 4],
    },
    /// Closed polygon outline.
    Polygon {
        /// `[x, y]` vertices in pixel coordinates.
        points: Vec<[f64; 2]>,
    },
}

impl Geometry {
    /// Returns true for bounding-box geometry.
    pub fn is_bbox(&self) -> bool {
        matches!(self, Geometry::Bbox { .. })
    }

    /// Returns true for polygon geometry.
    pub fn is_polygon(&self) -> bool {
        matches!(self, Geometry::Polygon { .. })
    }
}

fn default_confidence() -> f64 {
    1.0
}

/// One annotation produced by the augmentation executor.
///
/// The class id is executor-scoped; the aggregator rewrites it against the
/// unified class list before export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Class label as the executor named it.
    pub class_name: String,
    /// Executor-local class id, not yet unified.
    #[serde(default)]
    pub class_id: i64,
    /// Geometry payload with its kind tag.
    #[serde(flatten)]
    pub geometry: Geometry,
    /// Detection confidence, 1.0 when absent.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl Annotation {
    /// Creates an annotation with full confidence.
    pub fn new(class_name: impl Into<String>, class_id: i64, geometry: Geometry) -> Self {
        Self {
            class_name: class_name.into(),
            class_id,
            geometry,
            confidence: 1.0,
        }
    }
}

/// One augmented output derived from a single source image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedVariant {
    /// Filename of the produced image, if the executor reported one.
    pub output_filename: Option<String>,
    /// Path of the produced image on disk.
    pub output_path: PathBuf,
    /// Pixel width, if known.
    pub width: Option<u32>,
    /// Pixel height, if known.
    pub height: Option<u32>,
    /// Transformed annotations for this variant.
    pub annotations: Vec<Annotation>,
}

/// Per-source-image generation output, in the order images were processed.
pub type GenerationResults = Vec<(PathBuf, Vec<GeneratedVariant>)>;

/// One transform applied as part of a variant's chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformStep {
    /// Transformation type tag (e.g. "rotate", "hflip").
    pub transformation_type: String,
    /// Parameter mapping for this transform.
    pub parameters: serde_json::Value,
}

/// Transform chain assigned to one variant of one source image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformAssignment {
    /// Source image id this assignment applies to.
    pub image_id: String,
    /// Index of the variant within the image (0-based).
    pub variant_index: u32,
    /// Ordered transform chain to apply.
    pub steps: Vec<TransformStep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_section_round_trip() {
        assert_eq!("val".parse::<SplitSection>().unwrap(), SplitSection::Val);
        assert_eq!(SplitSection::Test.to_string(), "test");
        assert_eq!(SplitSection::default(), SplitSection::Train);
        assert!("holdout".parse::<SplitSection>().is_err());
    }

    #[test]
    fn test_geometry_kind_predicates() {
        let bbox = Geometry::Bbox {
            bbox: [0.0, 0.0, 10.0, 10.0],
        };
        let poly = Geometry::Polygon {
            points: vec![[0.0, 0.0], [10.0, 0.0], [5.0, 10.0]],
        };
        assert!(bbox.is_bbox() && !bbox.is_polygon());
        assert!(poly.is_polygon() && !poly.is_bbox());
    }

    #[test]
    fn test_annotation_confidence_default() {
        let json = r#"{"class_name": "car", "type": "bbox", "bbox": [1.0, 2.0, 3.0, 4.0]}"#;
        let ann: Annotation = serde_json::from_str(json).unwrap();
        assert_eq!(ann.confidence, 1.0);
        assert_eq!(ann.class_id, 0);
        assert!(ann.geometry.is_bbox());
    }

    #[test]
    fn test_geometry_serde_tag() {
        let ann = Annotation::new(
            "dog",
            3,
            Geometry::Polygon {
                points: vec![[1.0, 1.0], [2.0, 2.0], [0.0, 2.0]],
            },
        );
        let value = serde_json::to_value(&ann).unwrap();
        assert_eq!(value["type"], "polygon");
        assert_eq!(value["points"][2][1], 2.0);
    }
}
