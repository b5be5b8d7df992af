/// Output quality used when a request leaves it unset (zero)
pub const DEFAULT_QUALITY: u8 = 85;

/// Parameters of one resize request
///
/// A zero `width` or `height` means the dimension was not requested. The size
/// hint only takes effect when both of its dimensions are positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeOption {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub size_hint_width: u32,
    pub size_hint_height: u32,
    pub needs_auto_crop: bool,
}

impl ResizeOption {
    /// Plain (fit-within) resize to the given box
    pub fn fit(width: u32, height: u32) -> Self {
        ResizeOption {
            width,
            height,
            ..Default::default()
        }
    }

    /// Cover-then-crop resize to exactly the given box
    pub fn auto_crop(width: u32, height: u32) -> Self {
        ResizeOption {
            width,
            height,
            needs_auto_crop: true,
            ..Default::default()
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_size_hint(mut self, width: u32, height: u32) -> Self {
        self.size_hint_width = width;
        self.size_hint_height = height;
        self
    }

    /// Quality to encode with, `DEFAULT_QUALITY` when unset
    pub fn effective_quality(&self) -> u8 {
        if self.quality == 0 {
            DEFAULT_QUALITY
        } else {
            self.quality
        }
    }

    /// The size hint, if both dimensions are positive
    pub fn size_hint(&self) -> Option<(u32, u32)> {
        (self.size_hint_width > 0 && self.size_hint_height > 0)
            .then_some((self.size_hint_width, self.size_hint_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_defaults_when_zero() {
        assert_eq!(ResizeOption::fit(100, 100).effective_quality(), 85);
        assert_eq!(
            ResizeOption::fit(100, 100).with_quality(60).effective_quality(),
            60
        );
    }

    #[test]
    fn test_size_hint_needs_both_dimensions() {
        assert_eq!(ResizeOption::fit(100, 100).size_hint(), None);
        assert_eq!(
            ResizeOption::fit(100, 100).with_size_hint(400, 0).size_hint(),
            None
        );
        assert_eq!(
            ResizeOption::fit(100, 100).with_size_hint(400, 300).size_hint(),
            Some((400, 300))
        );
    }
}
