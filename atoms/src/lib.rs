//! Domain atoms of the corrosion inspection service: the coverage metric,
//! the detector and store capabilities with their real and mock variants,
//! and the records they produce.

pub mod artifact;
pub mod comments;
pub mod dashboard;
pub mod detections;
pub mod error;
pub mod inference;
pub mod media;
pub mod metric;
pub mod store;

pub use error::{CoreError, CoreResult};
pub use metric::compute_percentage;
