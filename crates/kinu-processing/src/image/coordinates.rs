//! Resize and crop geometry
//!
//! Scaled dimensions are rounded to the nearest pixel (halves round up) using
//! integer arithmetic, and never drop below one pixel.

use crate::image::option::ResizeOption;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoordinatesError {
    #[error("invalid resize option: {0}")]
    InvalidOption(String),

    #[error("image has no area ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

/// Geometry for one pipeline run
///
/// Crop fields are all zero when no crop is needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coordinates {
    pub resize_width: u32,
    pub resize_height: u32,
    pub crop_width: u32,
    pub crop_height: u32,
    pub width_offset: u32,
    pub height_offset: u32,
}

impl Coordinates {
    pub fn needs_crop(&self) -> bool {
        self.crop_width > 0 && self.crop_height > 0
    }
}

/// Derives [`Coordinates`] from a request and the source image size
#[derive(Debug, Clone)]
pub struct CoordinatesCalculator {
    target_width: u32,
    target_height: u32,
    image_width: u32,
    image_height: u32,
}

impl CoordinatesCalculator {
    /// Validate `option` and build a calculator for it
    ///
    /// At least one target dimension must be set, auto-crop needs both, and
    /// quality may not exceed 100.
    pub fn new(option: &ResizeOption) -> Result<Self, CoordinatesError> {
        if option.width == 0 && option.height == 0 {
            return Err(CoordinatesError::InvalidOption(
                "width or height must be specified".to_string(),
            ));
        }
        if option.needs_auto_crop && (option.width == 0 || option.height == 0) {
            return Err(CoordinatesError::InvalidOption(
                "auto crop requires both width and height".to_string(),
            ));
        }
        if option.quality > 100 {
            return Err(CoordinatesError::InvalidOption(format!(
                "quality must be between 1 and 100, got {}",
                option.quality
            )));
        }

        Ok(CoordinatesCalculator {
            target_width: option.width,
            target_height: option.height,
            image_width: 0,
            image_height: 0,
        })
    }

    pub fn set_image_size(&mut self, width: u32, height: u32) {
        self.image_width = width;
        self.image_height = height;
    }

    /// Fit within the target box, preserving aspect ratio. No crop.
    pub fn resize(&self) -> Result<Coordinates, CoordinatesError> {
        self.ensure_image_size()?;
        let (sw, sh) = (self.image_width, self.image_height);
        let (tw, th) = (self.target_width, self.target_height);

        let width_limited = match (tw, th) {
            (_, 0) => true,
            (0, _) => false,
            _ => u64::from(tw) * u64::from(sh) <= u64::from(th) * u64::from(sw),
        };

        let (resize_width, resize_height) = if width_limited {
            (tw, scale_round(sh, tw, sw))
        } else {
            (scale_round(sw, th, sh), th)
        };

        Ok(Coordinates {
            resize_width,
            resize_height,
            ..Default::default()
        })
    }

    /// Cover the target box, then crop its center to exactly the target size.
    pub fn auto_crop(&self) -> Result<Coordinates, CoordinatesError> {
        self.ensure_image_size()?;
        let (sw, sh) = (self.image_width, self.image_height);
        let (tw, th) = (self.target_width, self.target_height);

        // The axis with the larger scale factor lands exactly on its target;
        // the other axis overshoots (or matches) and is cropped.
        let width_dominant = u64::from(tw) * u64::from(sh) >= u64::from(th) * u64::from(sw);
        let (resize_width, resize_height) = if width_dominant {
            (tw, scale_round(sh, tw, sw).max(th))
        } else {
            (scale_round(sw, th, sh).max(tw), th)
        };

        let mut coordinates = Coordinates {
            resize_width,
            resize_height,
            ..Default::default()
        };

        if resize_width != tw || resize_height != th {
            coordinates.crop_width = tw;
            coordinates.crop_height = th;
            coordinates.width_offset = (resize_width - tw) / 2;
            coordinates.height_offset = (resize_height - th) / 2;
        }

        Ok(coordinates)
    }

    fn ensure_image_size(&self) -> Result<(), CoordinatesError> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(CoordinatesError::EmptyImage {
                width: self.image_width,
                height: self.image_height,
            });
        }
        Ok(())
    }
}

/// `value * num / den`, rounded to nearest (halves up), at least 1 and
/// saturating at `u32::MAX`
fn scale_round(value: u32, num: u32, den: u32) -> u32 {
    let (value, num, den) = (u128::from(value), u128::from(num), u128::from(den));
    let scaled = (2 * value * num + den) / (2 * den);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}
