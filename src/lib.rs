//! labelforge: dataset release generation for labeled image collections.
//!
//! Turns a dataset of labeled images plus a versioned catalog of pending
//! transformation definitions into augmented image variants and a packaged
//! annotation export (YOLO detection/segmentation, COCO, Pascal VOC, or
//! CSV), with per-release progress tracking and failure cleanup.

pub mod augment;
pub mod cli;
pub mod export;
pub mod release;
pub mod storage;

pub use export::{ExportFormat, ExportPayload, FormatChoice, TaskType};
pub use release::{ReleaseConfig, ReleaseError, ReleaseOrchestrator, ReleaseProgress};
pub use storage::{Database, DatabaseError};
