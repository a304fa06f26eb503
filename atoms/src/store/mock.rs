use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;
use uuid::Uuid;

use super::{require, Store};
use crate::comments::Comment;
use crate::detections::DetectionRecord;
use crate::error::CoreResult;
use crate::inference::DetectionSummary;
use crate::media::ImageRecord;

/// Source of record timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Default)]
struct Records {
    images: Vec<ImageRecord>,
    detections: Vec<DetectionRecord>,
    comments: Vec<Comment>,
}

/// In-memory store used when the hosted database is unavailable.
/// Generates identifiers locally and never reports remote failures.
pub struct MockStore {
    records: Mutex<Records>,
    clock: Clock,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            records: Mutex::new(Records::default()),
            clock,
        }
    }

    /// Pre-loaded with two sample inspections so history and dashboard have data.
    pub fn seeded() -> Self {
        let store = Self::new();
        {
            let mut records = store.lock();
            for (n, uploaded_at, pct) in [
                (1, sample_time(15, 12, 0), 12.5),
                (2, sample_time(14, 10, 30), 8.3),
            ] {
                let image_id = format!("mock-id-{}", n);
                records.images.push(ImageRecord {
                    id: image_id.clone(),
                    filename: format!("sample{}.jpg", n),
                    original_url: format!("/static/sample{}.jpg", n),
                    processed_url: Some(format!("/static/sample{}_processed.jpg", n)),
                    uploaded_at,
                });
                records.detections.push(DetectionRecord {
                    id: format!("mock-detection-{}", n),
                    image_id: image_id.clone(),
                    corrosion_percentage: pct,
                    detection_data: DetectionSummary {
                        boxes: Vec::new(),
                        corrosion_percentage: pct,
                    },
                    created_at: uploaded_at,
                });
            }
            records.comments.push(Comment {
                id: "comment-1".to_string(),
                image_id: "mock-id-1".to_string(),
                comment_text: "This is a sample comment".to_string(),
                created_at: sample_time(15, 12, 30),
            });
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

fn sample_time(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 10, day, hour, min, 0)
        .single()
        .unwrap_or_default()
}

impl Store for MockStore {
    async fn insert_image(&self, filename: &str, original_url: &str) -> CoreResult<ImageRecord> {
        require("filename", filename)?;
        require("original_url", original_url)?;

        let image = ImageRecord {
            id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            original_url: original_url.to_string(),
            processed_url: None,
            uploaded_at: self.now(),
        };
        self.lock().images.push(image.clone());

        Ok(image)
    }

    async fn update_image_processed(&self, image_id: &str, processed_url: &str) -> CoreResult<()> {
        require("image_id", image_id)?;
        require("processed_url", processed_url)?;

        let mut records = self.lock();
        match records.images.iter_mut().find(|i| i.id == image_id) {
            Some(image) => image.processed_url = Some(processed_url.to_string()),
            None => debug!("mock store: no image {} to update", image_id),
        }

        Ok(())
    }

    async fn insert_detection(
        &self,
        image_id: &str,
        corrosion_percentage: f64,
        detection_data: &DetectionSummary,
    ) -> CoreResult<DetectionRecord> {
        require("image_id", image_id)?;

        let detection = DetectionRecord {
            id: Uuid::new_v4().to_string(),
            image_id: image_id.to_string(),
            corrosion_percentage,
            detection_data: detection_data.clone(),
            created_at: self.now(),
        };
        self.lock().detections.push(detection.clone());

        Ok(detection)
    }

    async fn insert_comment(&self, image_id: &str, comment_text: &str) -> CoreResult<Comment> {
        require("image_id", image_id)?;
        require("comment_text", comment_text)?;

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            image_id: image_id.to_string(),
            comment_text: comment_text.to_string(),
            created_at: self.now(),
        };
        self.lock().comments.push(comment.clone());

        Ok(comment)
    }

    async fn get_all_images(&self) -> CoreResult<Vec<ImageRecord>> {
        // newest insert first so that equal timestamps keep that order after the stable sort
        let mut images: Vec<ImageRecord> = self.lock().images.iter().rev().cloned().collect();
        images.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(images)
    }

    async fn get_image_comments(&self, image_id: &str) -> CoreResult<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .lock()
            .comments
            .iter()
            .filter(|c| c.image_id == image_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn get_image_detections(&self, image_id: &str) -> CoreResult<Vec<DetectionRecord>> {
        let mut detections: Vec<DetectionRecord> = self
            .lock()
            .detections
            .iter()
            .filter(|d| d.image_id == image_id)
            .cloned()
            .collect();
        detections.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(detections)
    }

    async fn archive_artifact(&self, local_path: &Path, key: &str) -> CoreResult<()> {
        debug!("mock store: keeping {} local as {}", local_path.display(), key);
        Ok(())
    }

    async fn artifact_url(&self, _key: &str) -> CoreResult<Option<String>> {
        Ok(None)
    }
}
