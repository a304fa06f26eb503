use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use tracing::warn;

use super::model::ImageRecord;
use crate::error::{CoreError, CoreResult};
use crate::store::items::{attr_s, attr_time, query_partition, sk_id, Item};

const IMAGES_PK: &str = "IMAGES";
const IMAGE_SK_PREFIX: &str = "IMAGE#";

fn image_from_item(item: &Item) -> Option<ImageRecord> {
    Some(ImageRecord {
        id: sk_id(item, IMAGE_SK_PREFIX)?,
        filename: attr_s(item, "filename").unwrap_or_default(),
        original_url: attr_s(item, "original_url").unwrap_or_default(),
        processed_url: attr_s(item, "processed_url"),
        uploaded_at: attr_time(item, "uploaded_at"),
    })
}

/// Store a freshly uploaded image
pub async fn put_image(
    client: &DynamoClient,
    table_name: &str,
    image: &ImageRecord,
) -> CoreResult<()> {
    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(IMAGES_PK.to_string()))
        .item("SK", AttributeValue::S(format!("{}{}", IMAGE_SK_PREFIX, image.id)))
        .item("filename", AttributeValue::S(image.filename.clone()))
        .item("original_url", AttributeValue::S(image.original_url.clone()))
        .item("uploaded_at", AttributeValue::S(image.uploaded_at.to_rfc3339()));

    if let Some(processed_url) = &image.processed_url {
        builder = builder.item("processed_url", AttributeValue::S(processed_url.clone()));
    }

    builder
        .send()
        .await
        .map_err(|e| CoreError::RemoteService(format!("DynamoDB put_item error: {}", e)))?;

    Ok(())
}

/// Record the processed artifact of an existing image.
/// Unknown ids are left alone instead of creating a partial item.
pub async fn set_processed_url(
    client: &DynamoClient,
    table_name: &str,
    image_id: &str,
    processed_url: &str,
) -> CoreResult<()> {
    let result = client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(IMAGES_PK.to_string()))
        .key("SK", AttributeValue::S(format!("{}{}", IMAGE_SK_PREFIX, image_id)))
        .update_expression("SET processed_url = :processed_url")
        .condition_expression("attribute_exists(SK)")
        .expression_attribute_values(":processed_url", AttributeValue::S(processed_url.to_string()))
        .send()
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(e)
            if e
                .as_service_error()
                .map(|se| se.is_conditional_check_failed_exception())
                .unwrap_or(false) =>
        {
            warn!("set_processed_url: image {} does not exist", image_id);
            Ok(())
        }
        Err(e) => Err(CoreError::RemoteService(format!("DynamoDB update_item error: {}", e))),
    }
}

/// All images, most recently uploaded first
pub async fn list_images(client: &DynamoClient, table_name: &str) -> CoreResult<Vec<ImageRecord>> {
    let items = query_partition(client, table_name, IMAGES_PK, IMAGE_SK_PREFIX).await?;
    Ok(images_from_items(&items))
}

/// Map queried items to image records, newest upload first.
/// Items without an `IMAGE#` sort key are skipped.
pub fn images_from_items(items: &[Item]) -> Vec<ImageRecord> {
    let mut images: Vec<ImageRecord> = items.iter().filter_map(image_from_item).collect();
    images.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
    images
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_item(id: &str, uploaded_at: &str) -> Item {
        [
            ("PK", IMAGES_PK.to_string()),
            ("SK", format!("{}{}", IMAGE_SK_PREFIX, id)),
            ("filename", format!("{}.jpg", id)),
            ("original_url", format!("/uploads/{}.jpg", id)),
            ("uploaded_at", uploaded_at.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), AttributeValue::S(v)))
        .collect()
    }

    #[test]
    fn images_are_newest_first() {
        let items = vec![
            image_item("t1", "2024-03-01T08:00:00Z"),
            image_item("t3", "2024-03-03T08:00:00Z"),
            image_item("t2", "2024-03-02T08:00:00Z"),
        ];

        let ids: Vec<String> = images_from_items(&items).into_iter().map(|i| i.id).collect();

        assert_eq!(ids, vec!["t3", "t2", "t1"]);
    }

    #[test]
    fn item_fields_map_onto_the_record() {
        let mut item = image_item("abc", "2024-03-01T08:00:00Z");
        item.insert(
            "processed_url".to_string(),
            AttributeValue::S("/processed/processed_abc.jpg".into()),
        );

        let image = &images_from_items(&[item])[0];

        assert_eq!(image.id, "abc");
        assert_eq!(image.filename, "abc.jpg");
        assert_eq!(image.original_url, "/uploads/abc.jpg");
        assert_eq!(image.processed_url.as_deref(), Some("/processed/processed_abc.jpg"));
        assert_eq!(image.uploaded_at.to_rfc3339(), "2024-03-01T08:00:00+00:00");
    }

    #[test]
    fn unprocessed_images_have_no_processed_url() {
        let images = images_from_items(&[image_item("abc", "2024-03-01T08:00:00Z")]);
        assert_eq!(images[0].processed_url, None);
    }

    #[test]
    fn foreign_sort_keys_are_skipped() {
        let mut stray = image_item("abc", "2024-03-01T08:00:00Z");
        stray.insert("SK".to_string(), AttributeValue::S("COMMENT#abc".into()));

        assert!(images_from_items(&[stray]).is_empty());
    }
}
