use std::time::Duration;
use thiserror::Error;

/// Failure taxonomy shared by the detector, the stores and the handlers.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing or empty required field (file, image_id, comment text).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("remote service error: {0}")]
    RemoteService(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl CoreError {
    /// Failures of the hosted services that handlers are allowed to degrade past.
    pub fn is_remote(&self) -> bool {
        matches!(self, CoreError::RemoteService(_) | CoreError::Timeout(_))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Bound a remote call by `limit`, surfacing expiry as [`CoreError::Timeout`].
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> CoreResult<T>
where
    F: std::future::Future<Output = CoreResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(CoreError::Timeout(limit)),
    }
}
