//! Engine backed by the `image` crate.

use crate::image::engine::{EngineError, EngineFactory, ImageEngine};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

#[derive(Debug, Clone, Copy, Default)]
pub struct RasterFactory;

impl EngineFactory for RasterFactory {
    type Engine<'a> = RasterEngine<'a>;

    fn create<'a>(&self, image: &'a [u8]) -> Result<RasterEngine<'a>, EngineError> {
        RasterEngine::new(image)
    }
}

pub struct RasterEngine<'a> {
    source: &'a [u8],
    format: ImageFormat,
    size_hint: Option<(u32, u32)>,
    image: Option<DynamicImage>,
}

impl<'a> RasterEngine<'a> {
    pub fn new(source: &'a [u8]) -> Result<Self, EngineError> {
        let format = image::guess_format(source)
            .map_err(|e| EngineError::UnsupportedFormat(e.to_string()))?;

        match format {
            ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP => {}
            other => {
                return Err(EngineError::UnsupportedFormat(format!("{:?}", other)));
            }
        }

        Ok(RasterEngine {
            source,
            format,
            size_hint: None,
            image: None,
        })
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    fn image_mut(&mut self) -> Result<&mut DynamicImage, EngineError> {
        self.image.as_mut().ok_or(EngineError::NotOpen)
    }

    /// Size hint recorded for this session, if any
    pub fn size_hint(&self) -> Option<(u32, u32)> {
        self.size_hint
    }
}

/// Select appropriate filter type based on resize ratio
fn select_filter(orig_width: u32, orig_height: u32, new_width: u32, new_height: u32) -> FilterType {
    let width_ratio = orig_width as f32 / new_width as f32;
    let height_ratio = orig_height as f32 / new_height as f32;
    let max_ratio = width_ratio.max(height_ratio);

    if max_ratio > 2.0 {
        FilterType::Triangle
    } else if max_ratio > 1.5 {
        FilterType::CatmullRom
    } else {
        FilterType::Lanczos3
    }
}

impl ImageEngine for RasterEngine<'_> {
    fn set_size_hint(&mut self, width: u32, height: u32) {
        self.size_hint = Some((width, height));
    }

    fn open(&mut self) -> Result<(), EngineError> {
        let img = image::load_from_memory_with_format(self.source, self.format)
            .map_err(|e| EngineError::Decode(e.to_string()))?;

        // No reduced-scale decode in `image`; the hint is recorded only.
        if let Some((hint_width, hint_height)) = self.size_hint {
            tracing::debug!(
                hint_width,
                hint_height,
                width = img.width(),
                height = img.height(),
                "Size hint ignored, decoded at full resolution"
            );
        }

        self.image = Some(img);
        Ok(())
    }

    fn image_width(&self) -> u32 {
        self.image.as_ref().map_or(0, |img| img.width())
    }

    fn image_height(&self) -> u32 {
        self.image.as_ref().map_or(0, |img| img.height())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidGeometry(format!(
                "cannot resize to {}x{}",
                width, height
            )));
        }

        let img = self.image_mut()?;
        let (orig_width, orig_height) = img.dimensions();
        if (orig_width, orig_height) != (width, height) {
            let filter = select_filter(orig_width, orig_height, width, height);
            *img = img.resize_exact(width, height, filter);
        }
        Ok(())
    }

    fn crop(
        &mut self,
        width: u32,
        height: u32,
        x_offset: u32,
        y_offset: u32,
    ) -> Result<(), EngineError> {
        let img = self.image_mut()?;
        let (img_width, img_height) = img.dimensions();

        let fits = width > 0
            && height > 0
            && x_offset.checked_add(width).is_some_and(|right| right <= img_width)
            && y_offset.checked_add(height).is_some_and(|bottom| bottom <= img_height);
        if !fits {
            return Err(EngineError::InvalidGeometry(format!(
                "crop {}x{}+{}+{} outside {}x{} image",
                width, height, x_offset, y_offset, img_width, img_height
            )));
        }

        *img = img.crop_imm(x_offset, y_offset, width, height);
        Ok(())
    }

    fn generate(&mut self, quality: u8) -> Result<Vec<u8>, EngineError> {
        let format = self.format;
        let img = self.image_mut()?;
        let (width, height) = img.dimensions();
        let mut buffer = Vec::with_capacity(width as usize * height as usize * 3);

        let result = match format {
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
                DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
            }
            ImageFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Gif),
            // PNG and WebP are lossless here; quality does not apply.
            other => img.write_to(&mut Cursor::new(&mut buffer), other),
        };

        result.map_err(|e| EngineError::Encode(e.to_string()))?;
        Ok(buffer)
    }

    fn close(&mut self) {
        self.image = None;
    }
}
