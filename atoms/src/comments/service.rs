use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;

use super::model::Comment;
use crate::error::{CoreError, CoreResult};
use crate::store::items::{attr_s, attr_time, query_partition, sk_id, Item};

const COMMENT_SK_PREFIX: &str = "COMMENT#";

pub async fn put_comment(client: &DynamoClient, table_name: &str, comment: &Comment) -> CoreResult<()> {
    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(format!("IMAGE#{}", comment.image_id)))
        .item("SK", AttributeValue::S(format!("{}{}", COMMENT_SK_PREFIX, comment.id)))
        .item("comment_text", AttributeValue::S(comment.comment_text.clone()))
        .item("created_at", AttributeValue::S(comment.created_at.to_rfc3339()))
        .send()
        .await
        .map_err(|e| CoreError::RemoteService(format!("DynamoDB put_item error: {}", e)))?;

    Ok(())
}

/// Comments of one image, oldest first
pub async fn list_comments(
    client: &DynamoClient,
    table_name: &str,
    image_id: &str,
) -> CoreResult<Vec<Comment>> {
    let pk = format!("IMAGE#{}", image_id);
    let items = query_partition(client, table_name, &pk, COMMENT_SK_PREFIX).await?;
    Ok(comments_from_items(image_id, &items))
}

/// Map queried items to comments of `image_id`, oldest first.
pub fn comments_from_items(image_id: &str, items: &[Item]) -> Vec<Comment> {
    let mut comments = Vec::new();
    for item in items {
        if let Some(id) = sk_id(item, COMMENT_SK_PREFIX) {
            comments.push(Comment {
                id,
                image_id: image_id.to_string(),
                comment_text: attr_s(item, "comment_text").unwrap_or_default(),
                created_at: attr_time(item, "created_at"),
            });
        }
    }
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    comments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment_item(id: &str, text: &str, created_at: &str) -> Item {
        [
            ("PK", "IMAGE#img-1".to_string()),
            ("SK", format!("{}{}", COMMENT_SK_PREFIX, id)),
            ("comment_text", text.to_string()),
            ("created_at", created_at.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), AttributeValue::S(v)))
        .collect()
    }

    #[test]
    fn comments_are_oldest_first() {
        let items = vec![
            comment_item("c2", "second look", "2024-03-01T09:00:00Z"),
            comment_item("c1", "first look", "2024-03-01T08:00:00Z"),
        ];

        let comments = comments_from_items("img-1", &items);

        assert_eq!(comments[0].id, "c1");
        assert_eq!(comments[0].comment_text, "first look");
        assert_eq!(comments[1].id, "c2");
        assert!(comments.iter().all(|c| c.image_id == "img-1"));
    }

    #[test]
    fn items_without_comment_keys_are_skipped() {
        let mut stray = comment_item("c1", "x", "2024-03-01T08:00:00Z");
        stray.insert("SK".to_string(), AttributeValue::S("DETECTION#c1".into()));

        assert!(comments_from_items("img-1", &[stray]).is_empty());
    }
}
