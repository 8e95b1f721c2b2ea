//! Response normalization: JSON:API envelope in, [`ResultEnvelope`] out.
//!
//! Entities pass through untouched (`id`, `type`, `attributes` are never
//! rewritten). The only addition is a sibling `metadata` record derived from
//! `attributes`, and for collections a `{total, page, limit}` meta block.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::params::Page;

/// Uniform result shape returned by every tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope {
    pub data: Value,
    pub meta: Value,
}

impl ResultEnvelope {
    pub fn empty() -> Self {
        Self {
            data: Value::Null,
            meta: json!({}),
        }
    }
}

/// Normalize a list response. `page` is what the caller asked for, used when
/// the provider doesn't say.
pub fn collection(body: Value, page: Page) -> Result<ResultEnvelope, ApiError> {
    let (data, meta) = split(body)?;
    let items = match data {
        Value::Array(items) => items,
        Value::Null => return Err(ApiError::MissingData),
        one => vec![one],
    };

    let meta = pagination_meta(&meta, page, items.len());
    Ok(ResultEnvelope {
        data: Value::Array(items.into_iter().map(enrich).collect()),
        meta,
    })
}

/// Normalize a single-resource response.
pub fn single(body: Value) -> Result<ResultEnvelope, ApiError> {
    let (data, meta) = split(body)?;
    if data.is_null() {
        return Err(ApiError::MissingData);
    }
    let data = match data {
        Value::Array(items) => Value::Array(items.into_iter().map(enrich).collect()),
        entity => enrich(entity),
    };
    Ok(ResultEnvelope {
        data,
        meta: if meta.is_object() { meta } else { json!({}) },
    })
}

/// Normalize an action response, where an empty body or `data: null` is a
/// normal outcome (204 from lock, power actions, rescue mode, deletes).
pub fn optional(body: Value) -> Result<ResultEnvelope, ApiError> {
    match body {
        Value::Null => Ok(ResultEnvelope::empty()),
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_null) => {
            let meta = map.remove("meta").filter(Value::is_object);
            Ok(ResultEnvelope {
                data: Value::Null,
                meta: meta.unwrap_or_else(|| json!({})),
            })
        }
        Value::Object(mut map) if !map.contains_key("data") => {
            let meta = map.remove("meta").unwrap_or(Value::Object(map));
            Ok(ResultEnvelope {
                data: Value::Null,
                meta,
            })
        }
        other => single(other),
    }
}

fn split(body: Value) -> Result<(Value, Value), ApiError> {
    let Value::Object(mut map) = body else {
        return Err(ApiError::MissingData);
    };
    let data = map.remove("data").ok_or(ApiError::MissingData)?;
    let meta = map.remove("meta").unwrap_or(Value::Null);
    Ok((data, meta))
}

/// `{total, page, limit}` by precedence: nested `meta.pagination`, flat
/// `meta.total`, then the caller's window and the returned item count.
fn pagination_meta(meta: &Value, page: Page, returned: usize) -> Value {
    let nested = meta.get("pagination");
    let nested_u64 = |key: &str| nested.and_then(|p| p.get(key)).and_then(Value::as_u64);

    let total = nested_u64("total_count")
        .or_else(|| meta.get("total").and_then(Value::as_u64))
        .unwrap_or(returned as u64);
    let current = nested_u64("current_page").unwrap_or(page.number);
    let limit = nested_u64("per_page").unwrap_or(page.size);

    json!({ "total": total, "page": current, "limit": limit })
}

/// Attach `metadata` to an entity object; anything else is returned as is.
fn enrich(entity: Value) -> Value {
    let Value::Object(mut map) = entity else {
        return entity;
    };
    let metadata = entity_metadata(map.get("type"), map.get("attributes"));
    map.insert("metadata".to_string(), metadata);
    Value::Object(map)
}

/// `{tags, category, framework?}` derived purely from `attributes`.
pub fn entity_metadata(kind: Option<&Value>, attributes: Option<&Value>) -> Value {
    let empty = Map::new();
    let attrs = attributes.and_then(Value::as_object).unwrap_or(&empty);

    let environment = attrs
        .get("environment")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());

    let category = environment
        .map(str::to_lowercase)
        .or_else(|| kind.and_then(Value::as_str).map(str::to_lowercase))
        .unwrap_or_else(|| "uncategorized".to_string());

    let mut metadata = json!({
        "tags": tag_names(attrs.get("tags")),
        "category": category,
    });
    if let Some(framework) = os_name(attrs.get("operating_system")).or(environment) {
        metadata["framework"] = json!(framework);
    }
    metadata
}

fn tag_names(tags: Option<&Value>) -> Vec<String> {
    match tags {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|t| match t {
                Value::String(s) => Some(s.clone()),
                Value::Object(o) => o
                    .get("name")
                    .or_else(|| o.get("id"))
                    .and_then(Value::as_str)
                    .map(String::from),
                _ => None,
            })
            .collect(),
        Some(Value::String(csv)) => csv
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

fn os_name(os: Option<&Value>) -> Option<&str> {
    match os? {
        Value::String(s) if !s.is_empty() => Some(s.as_str()),
        Value::Object(o) => o
            .get("name")
            .or_else(|| o.get("slug"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}
