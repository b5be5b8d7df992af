//! Resize pipeline
//!
//! One call to [`Resizer::resize`] runs, in order: option validation, engine
//! session creation, optional size hint, decode, geometry, resize, optional
//! crop, encode. The first failing step ends the run. Once the session exists
//! it is closed exactly once on every path out of the function.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::{Deref, DerefMut};

use bytes::Bytes;

use crate::image::coordinates::{CoordinatesCalculator, CoordinatesError};
use crate::image::engine::{EngineError, EngineFactory, ImageEngine};
use crate::image::option::ResizeOption;

/// Engine-facing step of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Open,
    Decode,
    Resize,
    Crop,
    Generate,
}

impl Display for PipelineStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            PipelineStep::Open => "open",
            PipelineStep::Decode => "decode",
            PipelineStep::Resize => "resize",
            PipelineStep::Crop => "crop",
            PipelineStep::Generate => "generate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResizeError {
    #[error("invalid resize option: {0}")]
    InvalidOption(String),

    #[error("invalid geometry: {0}")]
    Geometry(CoordinatesError),

    #[error("image {step} failed: {source}")]
    Engine {
        step: PipelineStep,
        #[source]
        source: EngineError,
    },
}

impl ResizeError {
    fn engine(step: PipelineStep) -> impl FnOnce(EngineError) -> ResizeError {
        move |source| ResizeError::Engine { step, source }
    }

    /// The request itself was malformed (as opposed to an engine failure)
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ResizeError::InvalidOption(_))
    }

    /// The engine step that failed, if any
    pub fn step(&self) -> Option<PipelineStep> {
        match self {
            ResizeError::Engine { step, .. } => Some(*step),
            ResizeError::InvalidOption(_) | ResizeError::Geometry(_) => None,
        }
    }
}

impl From<CoordinatesError> for ResizeError {
    fn from(err: CoordinatesError) -> Self {
        match err {
            CoordinatesError::InvalidOption(message) => ResizeError::InvalidOption(message),
            other => ResizeError::Geometry(other),
        }
    }
}

/// Encoded image bytes, or the error of the step that failed
pub type ResizeResult = Result<Bytes, ResizeError>;

/// Owns an engine for the duration of one run and closes it on drop
struct EngineSession<E: ImageEngine> {
    engine: E,
}

impl<E: ImageEngine> EngineSession<E> {
    fn new(engine: E) -> Self {
        EngineSession { engine }
    }
}

impl<E: ImageEngine> Deref for EngineSession<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.engine
    }
}

impl<E: ImageEngine> DerefMut for EngineSession<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E: ImageEngine> Drop for EngineSession<E> {
    fn drop(&mut self) {
        self.engine.close();
    }
}

/// Runs the resize pipeline against engines from `F`
#[derive(Debug, Clone, Default)]
pub struct Resizer<F> {
    factory: F,
}

impl<F: EngineFactory> Resizer<F> {
    pub fn new(factory: F) -> Self {
        Resizer { factory }
    }

    pub fn resize(&self, image: &[u8], option: &ResizeOption) -> ResizeResult {
        let mut calculator = CoordinatesCalculator::new(option)?;
        let quality = option.effective_quality();

        let engine = self
            .factory
            .create(image)
            .map_err(ResizeError::engine(PipelineStep::Open))?;
        let mut session = EngineSession::new(engine);

        match option.size_hint() {
            Some((width, height)) => {
                session.set_size_hint(width, height);
                tracing::debug!(
                    width_size_hint = width,
                    height_size_hint = height,
                    "size hint"
                );
            }
            None => tracing::debug!(
                width_size_hint = option.size_hint_width,
                height_size_hint = option.size_hint_height,
                "not set size hint"
            ),
        }

        session
            .open()
            .map_err(ResizeError::engine(PipelineStep::Decode))?;

        calculator.set_image_size(session.image_width(), session.image_height());
        let coordinates = if option.needs_auto_crop {
            calculator.auto_crop()?
        } else {
            calculator.resize()?
        };

        tracing::debug!(
            image_width = session.image_width(),
            image_height = session.image_height(),
            coordinates = ?coordinates,
            auto_crop = option.needs_auto_crop,
            "computed coordinates"
        );

        session
            .resize(coordinates.resize_width, coordinates.resize_height)
            .map_err(ResizeError::engine(PipelineStep::Resize))?;

        if coordinates.needs_crop() {
            session
                .crop(
                    coordinates.crop_width,
                    coordinates.crop_height,
                    coordinates.width_offset,
                    coordinates.height_offset,
                )
                .map_err(ResizeError::engine(PipelineStep::Crop))?;
        }

        let encoded = session
            .generate(quality)
            .map_err(ResizeError::engine(PipelineStep::Generate))?;

        Ok(Bytes::from(encoded))
    }
}

/// Resize `image` with the bundled `image`-crate engine
#[cfg(feature = "image")]
pub fn resize(image: &[u8], option: &ResizeOption) -> ResizeResult {
    Resizer::new(crate::image::raster::RasterFactory).resize(image, option)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        SetSizeHint(u32, u32),
        Open,
        Resize(u32, u32),
        Crop(u32, u32, u32, u32),
        Generate(u8),
        Close,
    }

    /// Engine that records every call and can be told to fail at one step
    #[derive(Clone)]
    struct MockFactory {
        calls: Arc<Mutex<Vec<Call>>>,
        width: u32,
        height: u32,
        fail_at: Option<PipelineStep>,
    }

    impl MockFactory {
        fn new(width: u32, height: u32) -> Self {
            MockFactory {
                calls: Arc::new(Mutex::new(Vec::new())),
                width,
                height,
                fail_at: None,
            }
        }

        fn failing_at(mut self, step: PipelineStep) -> Self {
            self.fail_at = Some(step);
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn count(&self, call: &Call) -> usize {
            self.calls().iter().filter(|c| *c == call).count()
        }
    }

    struct MockEngine {
        factory: MockFactory,
        opened: bool,
    }

    impl MockEngine {
        fn record(&self, call: Call) {
            self.factory.calls.lock().unwrap().push(call);
        }

        fn check(&self, step: PipelineStep) -> Result<(), EngineError> {
            if self.factory.fail_at == Some(step) {
                Err(EngineError::Decode(format!("{} failed", step)))
            } else {
                Ok(())
            }
        }
    }

    impl ImageEngine for MockEngine {
        fn set_size_hint(&mut self, width: u32, height: u32) {
            self.record(Call::SetSizeHint(width, height));
        }

        fn open(&mut self) -> Result<(), EngineError> {
            self.record(Call::Open);
            self.check(PipelineStep::Decode)?;
            self.opened = true;
            Ok(())
        }

        fn image_width(&self) -> u32 {
            if self.opened {
                self.factory.width
            } else {
                0
            }
        }

        fn image_height(&self) -> u32 {
            if self.opened {
                self.factory.height
            } else {
                0
            }
        }

        fn resize(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
            self.record(Call::Resize(width, height));
            self.check(PipelineStep::Resize)
        }

        fn crop(&mut self, width: u32, height: u32, x: u32, y: u32) -> Result<(), EngineError> {
            self.record(Call::Crop(width, height, x, y));
            self.check(PipelineStep::Crop)
        }

        fn generate(&mut self, quality: u8) -> Result<Vec<u8>, EngineError> {
            self.record(Call::Generate(quality));
            self.check(PipelineStep::Generate)?;
            Ok(b"encoded".to_vec())
        }

        fn close(&mut self) {
            self.record(Call::Close);
        }
    }

    impl EngineFactory for MockFactory {
        type Engine<'a> = MockEngine;

        fn create<'a>(&self, _image: &'a [u8]) -> Result<MockEngine, EngineError> {
            self.check_create()?;
            Ok(MockEngine {
                factory: self.clone(),
                opened: false,
            })
        }
    }

    impl MockFactory {
        fn check_create(&self) -> Result<(), EngineError> {
            if self.fail_at == Some(PipelineStep::Open) {
                Err(EngineError::UnsupportedFormat("mock".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_auto_crop_runs_every_step_in_order() {
        let factory = MockFactory::new(1000, 500);
        let resizer = Resizer::new(factory.clone());

        let output = resizer
            .resize(b"img", &ResizeOption::auto_crop(300, 300))
            .unwrap();

        assert_eq!(output.as_ref(), b"encoded");
        assert_eq!(
            factory.calls(),
            vec![
                Call::Open,
                Call::Resize(600, 300),
                Call::Crop(300, 300, 150, 0),
                Call::Generate(85),
                Call::Close,
            ]
        );
    }

    #[test]
    fn test_plain_resize_never_crops() {
        let factory = MockFactory::new(1000, 500);
        let resizer = Resizer::new(factory.clone());

        resizer
            .resize(b"img", &ResizeOption::fit(300, 300))
            .unwrap();

        assert_eq!(
            factory.calls(),
            vec![
                Call::Open,
                Call::Resize(300, 150),
                Call::Generate(85),
                Call::Close
            ]
        );
    }

    #[test]
    fn test_auto_crop_matching_aspect_skips_crop() {
        let factory = MockFactory::new(800, 600);
        let resizer = Resizer::new(factory.clone());

        resizer
            .resize(b"img", &ResizeOption::auto_crop(400, 300))
            .unwrap();

        assert!(factory
            .calls()
            .iter()
            .all(|call| !matches!(call, Call::Crop(..))));
    }

    #[test]
    fn test_explicit_quality_is_passed_through() {
        let factory = MockFactory::new(100, 100);
        let resizer = Resizer::new(factory.clone());

        resizer
            .resize(b"img", &ResizeOption::fit(50, 50).with_quality(40))
            .unwrap();

        assert_eq!(factory.count(&Call::Generate(40)), 1);
    }

    #[test]
    fn test_size_hint_is_set_before_open() {
        let factory = MockFactory::new(400, 200);
        let resizer = Resizer::new(factory.clone());

        resizer
            .resize(
                b"img",
                &ResizeOption::fit(100, 100).with_size_hint(200, 100),
            )
            .unwrap();

        let calls = factory.calls();
        assert_eq!(calls[0], Call::SetSizeHint(200, 100));
        assert_eq!(calls[1], Call::Open);
    }

    #[test]
    fn test_partial_size_hint_is_ignored() {
        let factory = MockFactory::new(400, 200);
        let resizer = Resizer::new(factory.clone());

        resizer
            .resize(b"img", &ResizeOption::fit(100, 100).with_size_hint(200, 0))
            .unwrap();

        assert!(factory
            .calls()
            .iter()
            .all(|call| !matches!(call, Call::SetSizeHint(..))));
    }

    #[test]
    fn test_invalid_option_touches_no_engine() {
        let factory = MockFactory::new(400, 200);
        let resizer = Resizer::new(factory.clone());

        let err = resizer
            .resize(b"img", &ResizeOption::fit(0, 0))
            .unwrap_err();

        assert!(err.is_invalid_input());
        assert_eq!(err.step(), None);
        assert!(factory.calls().is_empty());
    }

    #[test]
    fn test_create_failure_has_nothing_to_close() {
        let factory = MockFactory::new(400, 200).failing_at(PipelineStep::Open);
        let resizer = Resizer::new(factory.clone());

        let err = resizer
            .resize(b"img", &ResizeOption::fit(100, 100))
            .unwrap_err();

        assert_eq!(err.step(), Some(PipelineStep::Open));
        assert!(!err.is_invalid_input());
        assert!(factory.calls().is_empty());
    }

    #[test]
    fn test_engine_closed_exactly_once_whichever_step_fails() {
        for step in [
            PipelineStep::Decode,
            PipelineStep::Resize,
            PipelineStep::Crop,
            PipelineStep::Generate,
        ] {
            let factory = MockFactory::new(1000, 500).failing_at(step);
            let resizer = Resizer::new(factory.clone());

            let err = resizer
                .resize(b"img", &ResizeOption::auto_crop(300, 300))
                .unwrap_err();

            assert_eq!(err.step(), Some(step));
            assert_eq!(factory.count(&Call::Close), 1, "step {}", step);
            assert_eq!(factory.calls().last(), Some(&Call::Close));
        }
    }

    #[test]
    fn test_failed_step_short_circuits() {
        let factory = MockFactory::new(1000, 500).failing_at(PipelineStep::Resize);
        let resizer = Resizer::new(factory.clone());

        resizer
            .resize(b"img", &ResizeOption::auto_crop(300, 300))
            .unwrap_err();

        assert_eq!(
            factory.calls(),
            vec![Call::Open, Call::Resize(600, 300), Call::Close]
        );
    }

    #[test]
    fn test_zero_sized_image_is_an_error_and_still_closes() {
        let factory = MockFactory::new(0, 500);
        let resizer = Resizer::new(factory.clone());

        let err = resizer
            .resize(b"img", &ResizeOption::fit(100, 100))
            .unwrap_err();

        assert!(matches!(
            err,
            ResizeError::Geometry(CoordinatesError::EmptyImage { .. })
        ));
        assert!(!err.is_invalid_input());
        assert_eq!(factory.calls(), vec![Call::Open, Call::Close]);
    }

    #[cfg(feature = "image")]
    mod raster {
        use super::super::resize;
        use crate::image::{PipelineStep, ResizeOption};
        use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
        use std::io::Cursor;

        fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
            let img = RgbImage::from_fn(width, height, |x, y| {
                Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
            });
            let mut buffer = Vec::new();
            DynamicImage::ImageRgb8(img)
                .write_to(&mut Cursor::new(&mut buffer), format)
                .unwrap();
            buffer
        }

        #[test]
        fn test_auto_crop_produces_target_size() {
            let source = encoded_image(1000, 500, ImageFormat::Jpeg);

            let output = resize(&source, &ResizeOption::auto_crop(300, 300)).unwrap();

            let decoded = image::load_from_memory(&output).unwrap();
            assert_eq!(decoded.dimensions(), (300, 300));
            assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Jpeg);
        }

        #[test]
        fn test_fit_preserves_aspect_ratio() {
            let source = encoded_image(640, 480, ImageFormat::Png);

            let output = resize(&source, &ResizeOption::fit(320, 320)).unwrap();

            let decoded = image::load_from_memory(&output).unwrap();
            assert_eq!(decoded.dimensions(), (320, 240));
        }

        #[test]
        fn test_size_hint_does_not_change_output_geometry() {
            let source = encoded_image(1600, 800, ImageFormat::Png);
            let option = ResizeOption::auto_crop(100, 100);

            let plain = resize(&source, &option).unwrap();
            let hinted = resize(&source, &option.with_size_hint(200, 100)).unwrap();

            let plain = image::load_from_memory(&plain).unwrap();
            let hinted = image::load_from_memory(&hinted).unwrap();
            assert_eq!(plain.dimensions(), (100, 100));
            assert_eq!(hinted.dimensions(), plain.dimensions());
        }

        #[test]
        fn test_size_hint_does_not_change_fit_output() {
            let source = encoded_image(800, 411, ImageFormat::Png);

            for option in [ResizeOption::fit(0, 150), ResizeOption::fit(300, 300)] {
                for (hint_width, hint_height) in [(100, 50), (300, 150), (799, 410)] {
                    let plain = resize(&source, &option).unwrap();
                    let hinted =
                        resize(&source, &option.with_size_hint(hint_width, hint_height)).unwrap();

                    let plain = image::load_from_memory(&plain).unwrap().dimensions();
                    let hinted = image::load_from_memory(&hinted).unwrap().dimensions();
                    assert_eq!(plain, hinted, "{:?} hint {}x{}", option, hint_width, hint_height);
                }
            }

            let output = resize(&source, &ResizeOption::fit(0, 150)).unwrap();
            let decoded = image::load_from_memory(&output).unwrap();
            // 800 * 150 / 411 = 291.97
            assert_eq!(decoded.dimensions(), (292, 150));
        }

        #[test]
        fn test_non_image_bytes_fail_at_open() {
            let err = resize(b"plain text", &ResizeOption::fit(10, 10)).unwrap_err();
            assert_eq!(err.step(), Some(PipelineStep::Open));
        }

        #[test]
        fn test_corrupt_image_fails_at_decode() {
            let source = encoded_image(64, 64, ImageFormat::Png);
            let err = resize(&source[..32], &ResizeOption::fit(10, 10)).unwrap_err();
            assert_eq!(err.step(), Some(PipelineStep::Decode));
        }
    }
}
