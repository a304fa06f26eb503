pub mod model;
pub mod service;

pub use model::{DetectRequest, DetectResponse, DetectionRecord};
