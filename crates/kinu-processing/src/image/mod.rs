//! Image processing module
//!
//! - Request options and geometry (option, coordinates)
//! - The engine contract the pipeline drives (engine)
//! - The pipeline itself (resizer)
//! - The bundled `image`-crate engine (raster)

pub mod coordinates;
pub mod engine;
pub mod option;
#[cfg(feature = "image")]
pub mod raster;
pub mod resizer;

pub use coordinates::{Coordinates, CoordinatesCalculator, CoordinatesError};
pub use engine::{EngineError, EngineFactory, ImageEngine};
pub use option::{ResizeOption, DEFAULT_QUALITY};
#[cfg(feature = "image")]
pub use raster::{RasterEngine, RasterFactory};
#[cfg(feature = "image")]
pub use resizer::resize;
pub use resizer::{PipelineStep, ResizeError, ResizeResult, Resizer};
