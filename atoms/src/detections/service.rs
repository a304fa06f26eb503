use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use tracing::warn;

use super::model::DetectionRecord;
use crate::error::{CoreError, CoreResult};
use crate::store::items::{attr_f64, attr_s, attr_time, query_partition, sk_id, Item};

const DETECTION_SK_PREFIX: &str = "DETECTION#";

fn detection_from_item(image_id: &str, item: &Item) -> Option<DetectionRecord> {
    let id = sk_id(item, DETECTION_SK_PREFIX)?;
    let raw = attr_s(item, "detection_data").unwrap_or_default();
    let detection_data = match serde_json::from_str(&raw) {
        Ok(data) => data,
        Err(e) => {
            warn!("Skipping detection {} with unreadable detection_data: {}", id, e);
            return None;
        }
    };

    Some(DetectionRecord {
        id,
        image_id: image_id.to_string(),
        corrosion_percentage: attr_f64(item, "corrosion_percentage").unwrap_or_default(),
        detection_data,
        created_at: attr_time(item, "created_at"),
    })
}

pub async fn put_detection(
    client: &DynamoClient,
    table_name: &str,
    detection: &DetectionRecord,
) -> CoreResult<()> {
    let data_json = serde_json::to_string(&detection.detection_data)
        .map_err(|e| CoreError::InvalidInput(format!("Failed to serialize detection_data: {}", e)))?;

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(format!("IMAGE#{}", detection.image_id)))
        .item("SK", AttributeValue::S(format!("{}{}", DETECTION_SK_PREFIX, detection.id)))
        .item("corrosion_percentage", AttributeValue::N(detection.corrosion_percentage.to_string()))
        .item("detection_data", AttributeValue::S(data_json))
        .item("created_at", AttributeValue::S(detection.created_at.to_rfc3339()))
        .send()
        .await
        .map_err(|e| CoreError::RemoteService(format!("DynamoDB put_item error: {}", e)))?;

    Ok(())
}

/// Detections of one image, oldest first
pub async fn list_detections(
    client: &DynamoClient,
    table_name: &str,
    image_id: &str,
) -> CoreResult<Vec<DetectionRecord>> {
    let pk = format!("IMAGE#{}", image_id);
    let items = query_partition(client, table_name, &pk, DETECTION_SK_PREFIX).await?;
    Ok(detections_from_items(image_id, &items))
}

/// Map queried items to detections of `image_id`, oldest first. Items whose
/// `detection_data` cannot be parsed are skipped.
pub fn detections_from_items(image_id: &str, items: &[Item]) -> Vec<DetectionRecord> {
    let mut detections: Vec<DetectionRecord> = items
        .iter()
        .filter_map(|item| detection_from_item(image_id, item))
        .collect();
    detections.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    detections
}
