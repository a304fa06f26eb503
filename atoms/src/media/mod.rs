// Re-export model types and service functions
pub mod model;
pub mod naming;
pub mod service;

pub use model::{ImageRecord, UploadedImage};
pub use naming::*;
