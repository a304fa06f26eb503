// Detector capability: inference, metric hook and processed-image rendering
pub mod detector;
pub mod model;
pub mod render;
pub mod yolo;

#[cfg(feature = "onnx")]
pub mod onnx;

pub use detector::{Detector, DetectorBackend, MockDetector, MOCK_CORROSION_PERCENTAGE};
pub use model::{BoundingBox, DetectionResult, DetectionSummary};
pub use yolo::YoloParams;
