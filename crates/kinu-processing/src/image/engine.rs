//! Image engine contract
//!
//! The pipeline never touches pixels itself; it drives an engine session
//! through these calls in a fixed order.

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("image session is not open")]
    NotOpen,
}

/// One engine session over a single source image
pub trait ImageEngine {
    /// Ask the decoder to produce roughly `width`x`height` instead of full resolution.
    /// Must be called before [`open`](ImageEngine::open).
    fn set_size_hint(&mut self, width: u32, height: u32);

    /// Decode the source image
    fn open(&mut self) -> Result<(), EngineError>;

    fn image_width(&self) -> u32;

    fn image_height(&self) -> u32;

    fn resize(&mut self, width: u32, height: u32) -> Result<(), EngineError>;

    fn crop(
        &mut self,
        width: u32,
        height: u32,
        x_offset: u32,
        y_offset: u32,
    ) -> Result<(), EngineError>;

    /// Encode the current image
    fn generate(&mut self, quality: u8) -> Result<Vec<u8>, EngineError>;

    /// Release everything the session holds
    fn close(&mut self);
}

/// Creates engine sessions over raw image bytes
pub trait EngineFactory {
    type Engine<'a>: ImageEngine;

    /// Fails if `image` is not in a format the engine recognises.
    fn create<'a>(&self, image: &'a [u8]) -> Result<Self::Engine<'a>, EngineError>;
}
