//! Kinu Image Processing Library
//!
//! This crate computes resize/crop geometry for image requests and drives the
//! resize pipeline against an [`ImageEngine`]. The engine is pluggable; the
//! `image` feature bundles [`RasterEngine`], built on the `image` crate.

pub mod image;

// Re-export commonly used types
pub use crate::image::{
    Coordinates, CoordinatesCalculator, CoordinatesError, EngineError, EngineFactory,
    ImageEngine, PipelineStep, ResizeError, ResizeOption, ResizeResult, Resizer,
    DEFAULT_QUALITY,
};
#[cfg(feature = "image")]
pub use crate::image::{resize, RasterEngine, RasterFactory};
