use std::path::Path;

use tracing::{debug, info, warn};

use super::model::DetectionResult;
use super::render;
use super::yolo::YoloParams;
use crate::artifact;
use crate::error::{CoreError, CoreResult};
use crate::metric::compute_percentage;

#[cfg(feature = "onnx")]
use super::onnx::OnnxDetector;

/// Coverage the mock detector reports for every image.
pub const MOCK_CORROSION_PERCENTAGE: f64 = 15.7;

/// Run inference on an image path and turn the result into a metric and a
/// processed artifact.
pub trait Detector: Send + Sync {
    fn detect(&self, image_path: &Path) -> CoreResult<DetectionResult>;

    fn coverage(&self, result: &DetectionResult) -> CoreResult<f64> {
        compute_percentage(
            result.boxes(),
            result.image_width() as i64,
            result.image_height() as i64,
        )
    }

    /// Write the "processed" image for `result`. Runs after `detect`.
    fn render(&self, result: &DetectionResult, destination: &Path) -> CoreResult<()> {
        render::draw_detections(result, destination)
    }
}

/// Deterministic stand-in used when no model is available.
#[derive(Debug, Default, Clone)]
pub struct MockDetector;

impl Detector for MockDetector {
    fn detect(&self, image_path: &Path) -> CoreResult<DetectionResult> {
        if !image_path.is_file() {
            return Err(CoreError::NotFound(image_path.display().to_string()));
        }

        let (width, height) = image::image_dimensions(image_path).unwrap_or_else(|e| {
            debug!("mock detector could not read {}: {}", image_path.display(), e);
            (0, 0)
        });

        Ok(DetectionResult::empty(image_path, width, height))
    }

    fn coverage(&self, _result: &DetectionResult) -> CoreResult<f64> {
        Ok(MOCK_CORROSION_PERCENTAGE)
    }

    fn render(&self, result: &DetectionResult, destination: &Path) -> CoreResult<()> {
        artifact::copy_file(result.source_image_path(), destination)
    }
}

/// The detector chosen at startup.
pub enum DetectorBackend {
    Mock(MockDetector),
    #[cfg(feature = "onnx")]
    Onnx(OnnxDetector),
}

impl DetectorBackend {
    /// Load the real model, failing with [`CoreError::ModelLoad`].
    pub fn load_real(model_path: &Path, params: YoloParams) -> CoreResult<Self> {
        #[cfg(feature = "onnx")]
        {
            OnnxDetector::load(model_path, params).map(DetectorBackend::Onnx)
        }
        #[cfg(not(feature = "onnx"))]
        {
            let _ = params;
            Err(CoreError::ModelLoad(format!(
                "{}: built without the `onnx` feature",
                model_path.display()
            )))
        }
    }

    /// Load the real model, falling back to the mock when it cannot be loaded.
    pub fn load_or_mock(model_path: &Path, params: YoloParams) -> Self {
        match Self::load_real(model_path, params) {
            Ok(detector) => {
                info!("Loaded detection model from {}", model_path.display());
                detector
            }
            Err(e) => {
                warn!("{}; using mock detector", e);
                DetectorBackend::Mock(MockDetector)
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DetectorBackend::Mock(_) => "mock",
            #[cfg(feature = "onnx")]
            DetectorBackend::Onnx(_) => "onnx",
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, DetectorBackend::Mock(_))
    }
}

impl Detector for DetectorBackend {
    fn detect(&self, image_path: &Path) -> CoreResult<DetectionResult> {
        match self {
            DetectorBackend::Mock(d) => d.detect(image_path),
            #[cfg(feature = "onnx")]
            DetectorBackend::Onnx(d) => d.detect(image_path),
        }
    }

    fn coverage(&self, result: &DetectionResult) -> CoreResult<f64> {
        match self {
            DetectorBackend::Mock(d) => d.coverage(result),
            #[cfg(feature = "onnx")]
            DetectorBackend::Onnx(d) => d.coverage(result),
        }
    }

    fn render(&self, result: &DetectionResult, destination: &Path) -> CoreResult<()> {
        match self {
            DetectorBackend::Mock(d) => d.render(result, destination),
            #[cfg(feature = "onnx")]
            DetectorBackend::Onnx(d) => d.render(result, destination),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::BoundingBox;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("corrode-detector-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn mock_reports_empty_boxes_with_real_dimensions() {
        let dir = scratch_dir();
        let src = dir.join("pipe.png");
        RgbImage::from_pixel(12, 7, Rgb([0, 0, 0])).save(&src).unwrap();

        let result = MockDetector.detect(&src).unwrap();

        assert!(result.boxes().is_empty());
        assert_eq!((result.image_width(), result.image_height()), (12, 7));
        assert_eq!(MockDetector.coverage(&result).unwrap(), MOCK_CORROSION_PERCENTAGE);
    }

    #[test]
    fn mock_tolerates_undecodable_files() {
        let dir = scratch_dir();
        let src = dir.join("notes.jpg");
        std::fs::write(&src, b"not an image").unwrap();

        let result = MockDetector.detect(&src).unwrap();

        assert_eq!((result.image_width(), result.image_height()), (0, 0));
    }

    #[test]
    fn mock_render_duplicates_the_original() {
        let dir = scratch_dir();
        let src = dir.join("notes.jpg");
        std::fs::write(&src, b"raw bytes").unwrap();
        let result = MockDetector.detect(&src).unwrap();

        MockDetector.render(&result, &dir.join("processed_notes.jpg")).unwrap();

        assert_eq!(std::fs::read(dir.join("processed_notes.jpg")).unwrap(), b"raw bytes");
    }

    #[test]
    fn mock_detect_on_missing_file_is_not_found() {
        let err = MockDetector.detect(Path::new("/definitely/not/here.jpg")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn missing_model_falls_back_to_mock() {
        let backend = DetectorBackend::load_or_mock(Path::new("/no/such/model.onnx"), YoloParams::default());
        assert!(backend.is_mock());
        assert_eq!(backend.kind(), "mock");
    }

    #[test]
    fn load_real_fails_with_model_load_error() {
        let err = DetectorBackend::load_real(Path::new("/no/such/model.onnx"), YoloParams::default())
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::ModelLoad(_)));
    }

    struct FixedBoxes;

    impl Detector for FixedBoxes {
        fn detect(&self, image_path: &Path) -> CoreResult<DetectionResult> {
            Ok(DetectionResult::new(
                image_path,
                100,
                100,
                vec![BoundingBox::new(0.0, 0.0, 10.0, 10.0), BoundingBox::new(0.0, 0.0, 10.0, 10.0)],
            ))
        }
    }

    #[test]
    fn default_coverage_uses_the_calculator() {
        let result = FixedBoxes.detect(Path::new("x.png")).unwrap();
        assert!((FixedBoxes.coverage(&result).unwrap() - 2.0).abs() < 1e-9);
    }
}
