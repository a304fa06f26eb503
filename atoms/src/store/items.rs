use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};

pub type Item = HashMap<String, AttributeValue>;

pub fn attr_s(item: &Item, name: &str) -> Option<String> {
    item.get(name).and_then(|v| v.as_s().ok()).map(|s| s.to_string())
}

pub fn attr_f64(item: &Item, name: &str) -> Option<f64> {
    item.get(name).and_then(|v| v.as_n().ok()).and_then(|n| n.parse().ok())
}

pub fn attr_time(item: &Item, name: &str) -> DateTime<Utc> {
    attr_s(item, name)
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

/// Id part of a `PREFIX#id` sort key.
pub fn sk_id(item: &Item, prefix: &str) -> Option<String> {
    attr_s(item, "SK").and_then(|sk| sk.strip_prefix(prefix).map(|s| s.to_string()))
}

/// Every item of partition `pk` whose sort key starts with `sk_prefix`,
/// following pagination to the end.
pub async fn query_partition(
    client: &DynamoClient,
    table_name: &str,
    pk: &str,
    sk_prefix: &str,
) -> CoreResult<Vec<Item>> {
    let mut items = Vec::new();
    let mut start_key: Option<Item> = None;

    loop {
        let result = client
            .query()
            .table_name(table_name)
            .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
            .expression_attribute_values(":pk", AttributeValue::S(pk.to_string()))
            .expression_attribute_values(":sk_prefix", AttributeValue::S(sk_prefix.to_string()))
            .set_exclusive_start_key(start_key.take())
            .send()
            .await
            .map_err(|e| CoreError::RemoteService(format!("DynamoDB query error: {}", e)))?;

        items.extend(result.items().iter().cloned());

        match result.last_evaluated_key() {
            Some(key) if !key.is_empty() => start_key = Some(key.clone()),
            _ => break,
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(pairs: &[(&str, AttributeValue)]) -> Item {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn reads_typed_attributes() {
        let it = item(&[
            ("SK", AttributeValue::S("COMMENT#abc".into())),
            ("pct", AttributeValue::N("15.7".into())),
            ("at", AttributeValue::S("2023-10-15T12:00:00Z".into())),
        ]);

        assert_eq!(sk_id(&it, "COMMENT#").as_deref(), Some("abc"));
        assert_eq!(sk_id(&it, "IMAGE#"), None);
        assert_eq!(attr_f64(&it, "pct"), Some(15.7));
        assert_eq!(attr_time(&it, "at").to_rfc3339(), "2023-10-15T12:00:00+00:00");
    }

    #[test]
    fn missing_or_mistyped_attributes_fall_back() {
        let it = item(&[("pct", AttributeValue::S("x".into()))]);

        assert_eq!(attr_f64(&it, "pct"), None);
        assert_eq!(attr_s(&it, "nope"), None);
        assert_eq!(attr_time(&it, "nope"), DateTime::<Utc>::default());
    }
}
