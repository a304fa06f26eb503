use std::path::Path;
use std::time::Duration;

use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::{require, Store};
use crate::comments::{self, Comment};
use crate::detections::{self, DetectionRecord};
use crate::error::{with_timeout, CoreError, CoreResult};
use crate::inference::DetectionSummary;
use crate::media::{self, content_type_for, ImageRecord};

/// Prefix of every archived artifact inside the bucket.
pub const ARTIFACT_PREFIX: &str = "corrosion-images";
const PRESIGNED_URL_TTL: Duration = Duration::from_secs(60 * 60);

/// Hosted store: DynamoDB single table for records, S3 for artifacts.
/// Every call is bounded by `timeout`.
#[derive(Clone)]
pub struct DynamoStore {
    dynamo: DynamoClient,
    s3: S3Client,
    table_name: String,
    bucket_name: String,
    timeout: Duration,
}

impl DynamoStore {
    pub fn new(
        dynamo: DynamoClient,
        s3: S3Client,
        table_name: impl Into<String>,
        bucket_name: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            dynamo,
            s3,
            table_name: table_name.into(),
            bucket_name: bucket_name.into(),
            timeout,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Check that the table is reachable with the configured credentials.
    pub async fn probe(&self) -> CoreResult<()> {
        with_timeout(self.timeout, async {
            self.dynamo
                .describe_table()
                .table_name(&self.table_name)
                .send()
                .await
                .map_err(|e| CoreError::RemoteService(format!("DynamoDB describe_table error: {}", e)))?;
            Ok(())
        })
        .await
    }

    fn artifact_key(key: &str) -> String {
        format!("{}/{}", ARTIFACT_PREFIX, key)
    }
}

impl Store for DynamoStore {
    async fn insert_image(&self, filename: &str, original_url: &str) -> CoreResult<ImageRecord> {
        require("filename", filename)?;
        require("original_url", original_url)?;

        let image = ImageRecord {
            id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            original_url: original_url.to_string(),
            processed_url: None,
            uploaded_at: Utc::now(),
        };
        with_timeout(
            self.timeout,
            media::service::put_image(&self.dynamo, &self.table_name, &image),
        )
        .await?;

        Ok(image)
    }

    async fn update_image_processed(&self, image_id: &str, processed_url: &str) -> CoreResult<()> {
        require("image_id", image_id)?;
        require("processed_url", processed_url)?;

        with_timeout(
            self.timeout,
            media::service::set_processed_url(&self.dynamo, &self.table_name, image_id, processed_url),
        )
        .await
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
            created_at: Utc::now(),
        };
        with_timeout(
            self.timeout,
            detections::service::put_detection(&self.dynamo, &self.table_name, &detection),
        )
        .await?;

        Ok(detection)
    }

    async fn insert_comment(&self, image_id: &str, comment_text: &str) -> CoreResult<Comment> {
        require("image_id", image_id)?;
        require("comment_text", comment_text)?;

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            image_id: image_id.to_string(),
            comment_text: comment_text.to_string(),
            created_at: Utc::now(),
        };
        with_timeout(
            self.timeout,
            comments::service::put_comment(&self.dynamo, &self.table_name, &comment),
        )
        .await?;

        Ok(comment)
    }

    async fn get_all_images(&self) -> CoreResult<Vec<ImageRecord>> {
        with_timeout(self.timeout, media::service::list_images(&self.dynamo, &self.table_name)).await
    }

    async fn get_image_comments(&self, image_id: &str) -> CoreResult<Vec<Comment>> {
        with_timeout(
            self.timeout,
            comments::service::list_comments(&self.dynamo, &self.table_name, image_id),
        )
        .await
    }

    async fn get_image_detections(&self, image_id: &str) -> CoreResult<Vec<DetectionRecord>> {
        with_timeout(
            self.timeout,
            detections::service::list_detections(&self.dynamo, &self.table_name, image_id),
        )
        .await
    }

    async fn archive_artifact(&self, local_path: &Path, key: &str) -> CoreResult<()> {
        require("key", key)?;
        let bytes = tokio::fs::read(local_path).await?;
        let object_key = Self::artifact_key(key);

        with_timeout(self.timeout, async {
            self.s3
                .put_object()
                .bucket(&self.bucket_name)
                .key(&object_key)
                .content_type(content_type_for(key))
                .body(ByteStream::from(bytes))
                .send()
                .await
                .map_err(|e| CoreError::RemoteService(format!("S3 put_object error: {}", e)))?;
            Ok(())
        })
        .await?;

        info!("Archived {} to s3://{}/{}", local_path.display(), self.bucket_name, object_key);
        Ok(())
    }

    async fn artifact_url(&self, key: &str) -> CoreResult<Option<String>> {
        require("key", key)?;
        let presigning = PresigningConfig::expires_in(PRESIGNED_URL_TTL)
            .map_err(|e| CoreError::RemoteService(format!("S3 presigning config error: {}", e)))?;

        let request = with_timeout(self.timeout, async {
            self.s3
                .get_object()
                .bucket(&self.bucket_name)
                .key(Self::artifact_key(key))
                .presigned(presigning)
                .await
                .map_err(|e| CoreError::RemoteService(format!("S3 presign error: {}", e)))
        })
        .await?;

        Ok(Some(request.uri().to_string()))
    }
}
