use std::future::Future;
use std::path::Path;

use crate::comments::Comment;
use crate::detections::DetectionRecord;
use crate::error::{CoreError, CoreResult};
use crate::inference::DetectionSummary;
use crate::media::ImageRecord;

pub mod dynamo;
pub mod items;
pub mod mock;

pub use dynamo::DynamoStore;
pub use mock::{Clock, MockStore};

/// Persistence of images, detections and comments plus their artifacts.
///
/// `get_all_images` is ordered by `uploaded_at` descending; comment and
/// detection listings by `created_at` ascending.
pub trait Store: Send + Sync {
    fn insert_image(
        &self,
        filename: &str,
        original_url: &str,
    ) -> impl Future<Output = CoreResult<ImageRecord>> + Send;

    fn update_image_processed(
        &self,
        image_id: &str,
        processed_url: &str,
    ) -> impl Future<Output = CoreResult<()>> + Send;

    fn insert_detection(
        &self,
        image_id: &str,
        corrosion_percentage: f64,
        detection_data: &DetectionSummary,
    ) -> impl Future<Output = CoreResult<DetectionRecord>> + Send;

    fn insert_comment(
        &self,
        image_id: &str,
        comment_text: &str,
    ) -> impl Future<Output = CoreResult<Comment>> + Send;

    fn get_all_images(&self) -> impl Future<Output = CoreResult<Vec<ImageRecord>>> + Send;

    fn get_image_comments(
        &self,
        image_id: &str,
    ) -> impl Future<Output = CoreResult<Vec<Comment>>> + Send;

    fn get_image_detections(
        &self,
        image_id: &str,
    ) -> impl Future<Output = CoreResult<Vec<DetectionRecord>>> + Send;

    /// Copy a local artifact into durable object storage under `key`.
    fn archive_artifact(
        &self,
        local_path: &Path,
        key: &str,
    ) -> impl Future<Output = CoreResult<()>> + Send;

    /// Time-limited download URL for an archived artifact, if the store has one.
    fn artifact_url(&self, key: &str) -> impl Future<Output = CoreResult<Option<String>>> + Send;
}

/// Reject a missing or blank required field.
pub fn require(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        Err(CoreError::InvalidInput(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

/// The store chosen at startup.
pub enum StoreBackend {
    Remote(DynamoStore),
    Mock(MockStore),
}

impl StoreBackend {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreBackend::Remote(_) => "dynamodb",
            StoreBackend::Mock(_) => "mock",
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, StoreBackend::Mock(_))
    }
}

impl Store for StoreBackend {
    async fn insert_image(&self, filename: &str, original_url: &str) -> CoreResult<ImageRecord> {
        match self {
            StoreBackend::Remote(s) => s.insert_image(filename, original_url).await,
            StoreBackend::Mock(s) => s.insert_image(filename, original_url).await,
        }
    }

    async fn update_image_processed(&self, image_id: &str, processed_url: &str) -> CoreResult<()> {
        match self {
            StoreBackend::Remote(s) => s.update_image_processed(image_id, processed_url).await,
            StoreBackend::Mock(s) => s.update_image_processed(image_id, processed_url).await,
        }
    }

    async fn insert_detection(
        &self,
        image_id: &str,
        corrosion_percentage: f64,
        detection_data: &DetectionSummary,
    ) -> CoreResult<DetectionRecord> {
        match self {
            StoreBackend::Remote(s) => {
                s.insert_detection(image_id, corrosion_percentage, detection_data).await
            }
            StoreBackend::Mock(s) => {
                s.insert_detection(image_id, corrosion_percentage, detection_data).await
            }
        }
    }

    async fn insert_comment(&self, image_id: &str, comment_text: &str) -> CoreResult<Comment> {
        match self {
            StoreBackend::Remote(s) => s.insert_comment(image_id, comment_text).await,
            StoreBackend::Mock(s) => s.insert_comment(image_id, comment_text).await,
        }
    }

    async fn get_all_images(&self) -> CoreResult<Vec<ImageRecord>> {
        match self {
            StoreBackend::Remote(s) => s.get_all_images().await,
            StoreBackend::Mock(s) => s.get_all_images().await,
        }
    }

    async fn get_image_comments(&self, image_id: &str) -> CoreResult<Vec<Comment>> {
        match self {
            StoreBackend::Remote(s) => s.get_image_comments(image_id).await,
            StoreBackend::Mock(s) => s.get_image_comments(image_id).await,
        }
    }

    async fn get_image_detections(&self, image_id: &str) -> CoreResult<Vec<DetectionRecord>> {
        match self {
            StoreBackend::Remote(s) => s.get_image_detections(image_id).await,
            StoreBackend::Mock(s) => s.get_image_detections(image_id).await,
        }
    }

    async fn archive_artifact(&self, local_path: &Path, key: &str) -> CoreResult<()> {
        match self {
            StoreBackend::Remote(s) => s.archive_artifact(local_path, key).await,
            StoreBackend::Mock(s) => s.archive_artifact(local_path, key).await,
        }
    }

    async fn artifact_url(&self, key: &str) -> CoreResult<Option<String>> {
        match self {
            StoreBackend::Remote(s) => s.artifact_url(key).await,
            StoreBackend::Mock(s) => s.artifact_url(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_rejects_blank_values() {
        assert!(require("image_id", "abc").is_ok());
        assert!(matches!(require("image_id", ""), Err(CoreError::InvalidInput(_))));
        assert!(matches!(require("comment", "   \n"), Err(CoreError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn backend_delegates_to_the_mock() {
        let backend = StoreBackend::Mock(MockStore::new());
        assert!(backend.is_mock());
        assert_eq!(backend.kind(), "mock");

        let image = backend.insert_image("a.jpg", "/uploads/a.jpg").await.unwrap();
        let all = backend.get_all_images().await.unwrap();

        assert_eq!(all, vec![image]);
        assert_eq!(backend.artifact_url("a.jpg").await.unwrap(), None);
    }
}
