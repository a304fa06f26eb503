use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::inference::DetectionSummary;

/// One persisted detection run for an image
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DetectionRecord {
    pub id: String,
    pub image_id: String,
    pub corrosion_percentage: f64,
    pub detection_data: DetectionSummary,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub image_id: Option<String>,
    pub filename: Option<String>,
}

/// Response body of `POST /detect`
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DetectResponse {
    pub processed_url: String,
    pub corrosion_percentage: f64,
    pub detection_data: DetectionSummary,
}
