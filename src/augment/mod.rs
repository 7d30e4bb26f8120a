//! Augmentation collaborator seams and generation types.
//!
//! The orchestrator treats transform expansion and pixel-level augmentation
//! as external collaborators behind the [`TransformationExpander`] and
//! [`AugmentationExecutor`] traits. This module defines those seams, the
//! data they exchange, and minimal default implementations for wiring.

mod executor;
mod expander;
mod types;

pub use executor::{
    AugmentationExecutor, AugmentationRequest, ExecutorError, PassthroughExecutor,
};
pub use expander::{ChainExpander, TransformationExpander};
pub use types::{
    Annotation, GeneratedVariant, GenerationResults, Geometry, SplitSection, TransformAssignment,
    TransformStep,
};
