use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Image domain model - one uploaded photograph
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageRecord {
    pub id: String,
    pub filename: String,
    #[serde(alias = "original_image_url")]
    pub original_url: String,
    /// Set once detection has produced a processed artifact
    #[serde(alias = "processed_image_url")]
    pub processed_url: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Response body of `POST /upload`
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UploadedImage {
    pub image_id: String,
    pub original_url: String,
    pub filename: String,
}
