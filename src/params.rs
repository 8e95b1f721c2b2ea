//! Mapping from validated tool arguments to Latitude.sh wire parameters.
//!
//! The provider speaks JSON:API: query keys look like `page[size]`,
//! `filter[ram][gte]`, `extra_fields[servers]`, and write bodies are resource
//! documents `{"data": {"type", "id"?, "attributes"}}`.
//!
//! Rules enforced here:
//!
//! - a key reaches the wire only through one of the helpers below, never by
//!   copying caller input wholesale;
//! - optional values are forwarded on *presence* (`Some`), so an explicit
//!   `false` is sent and an absent flag is not;
//! - new-dialect pagination (`pageSize`/`pageNumber`) beats the legacy
//!   `limit`/`page` pair.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const DEFAULT_PAGE_NUMBER: u64 = 1;

/// Ordered wire parameters for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiParams(Vec<(String, String)>);

impl ApiParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Display) {
        self.0.push((key.into(), value.to_string()));
    }

    pub fn push_opt<T: Display>(&mut self, key: impl Into<String>, value: Option<T>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    /// `filter[name]=value` when the value is present.
    pub fn filter<T: Display>(&mut self, name: &str, value: Option<T>) {
        self.push_opt(format!("filter[{name}]"), value);
    }

    /// `filter[field][eql|gte|lte]`, each bound independent of the others.
    pub fn range_filter(&mut self, field: &str, range: &Range) {
        self.push_opt(format!("filter[{field}][eql]"), range.eql);
        self.push_opt(format!("filter[{field}][gte]"), range.gte);
        self.push_opt(format!("filter[{field}][lte]"), range.lte);
    }

    /// `filter[tags]`, normalized from either tag dialect.
    pub fn tags_filter(&mut self, tags: Option<&Tags>) {
        self.filter("tags", tags.map(Tags::to_wire));
    }

    /// `extra_fields[resource]=fields`, forwarded verbatim and only on request.
    pub fn extra_fields(&mut self, resource: &str, fields: Option<&str>) {
        self.push_opt(format!("extra_fields[{resource}]"), fields);
    }

    /// `page[size]` / `page[number]`; returns what was sent.
    pub fn paginate(&mut self, args: &PageArgs) -> Page {
        let page = args.resolve();
        self.push("page[size]", page.size);
        self.push("page[number]", page.number);
        page
    }
}

/// Both pagination dialects, as the caller sent them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageArgs {
    pub page_size: Option<u64>,
    pub page_number: Option<u64>,
    pub limit: Option<u64>,
    pub page: Option<u64>,
}

/// Resolved page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub size: u64,
    pub number: u64,
}

impl PageArgs {
    pub fn resolve(&self) -> Page {
        Page {
            size: self.page_size.or(self.limit).unwrap_or(DEFAULT_PAGE_SIZE),
            number: self.page_number.or(self.page).unwrap_or(DEFAULT_PAGE_NUMBER),
        }
    }
}

/// Optional exact/lower/upper bounds for a numeric filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Range {
    pub eql: Option<u64>,
    pub gte: Option<u64>,
    pub lte: Option<u64>,
}

/// RAM and disk range filters in their tool-argument spelling.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareRanges {
    pub filter_ram_eql: Option<u64>,
    pub filter_ram_gte: Option<u64>,
    pub filter_ram_lte: Option<u64>,
    pub filter_disk_eql: Option<u64>,
    pub filter_disk_gte: Option<u64>,
    pub filter_disk_lte: Option<u64>,
}

impl HardwareRanges {
    pub fn ram(&self) -> Range {
        Range {
            eql: self.filter_ram_eql,
            gte: self.filter_ram_gte,
            lte: self.filter_ram_lte,
        }
    }

    pub fn disk(&self) -> Range {
        Range {
            eql: self.filter_disk_eql,
            gte: self.filter_disk_gte,
            lte: self.filter_disk_lte,
        }
    }

    pub fn apply(&self, params: &mut ApiParams) {
        params.range_filter("ram", &self.ram());
        params.range_filter("disk", &self.disk());
    }
}

/// Tag set: comma-separated string, or an array from older call sites.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Tags {
    Csv(String),
    List(Vec<String>),
}

impl Tags {
    pub fn to_wire(&self) -> String {
        match self {
            Tags::Csv(s) => s.clone(),
            Tags::List(items) => items.join(","),
        }
    }
}

/// Attribute map for a write payload; only supplied fields are inserted.
#[derive(Debug, Clone, Default)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Serialize) -> Self {
        self.0.insert(key.to_string(), json!(value));
        self
    }

    pub fn set_opt<T: Serialize>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// JSON:API resource document for POST/PATCH bodies.
pub fn resource_document(kind: &str, id: Option<&str>, attributes: Attributes) -> Value {
    let mut data = json!({
        "type": kind,
        "attributes": Value::Object(attributes.into_map()),
    });
    if let Some(id) = id {
        data["id"] = json!(id);
    }
    json!({ "data": data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page_args(v: Value) -> PageArgs {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn new_pagination_dialect_wins() {
        let page = page_args(json!({ "pageSize": 50, "limit": 5, "pageNumber": 2, "page": 9 })).resolve();
        assert_eq!(page, Page { size: 50, number: 2 });
    }

    #[test]
    fn legacy_pagination_is_honoured_alone() {
        let page = page_args(json!({ "limit": 5, "page": 9 })).resolve();
        assert_eq!(page, Page { size: 5, number: 9 });
    }

    #[test]
    fn pagination_defaults() {
        let mut params = ApiParams::new();
        let page = params.paginate(&PageArgs::default());
        assert_eq!(page, Page { size: 20, number: 1 });
        assert_eq!(params.get("page[size]"), Some("20"));
        assert_eq!(params.get("page[number]"), Some("1"));
    }

    #[test]
    fn range_bounds_are_independent() {
        let mut params = ApiParams::new();
        params.range_filter("ram", &Range { eql: Some(32), gte: Some(16), lte: Some(64) });
        assert_eq!(
            params.pairs(),
            &[
                ("filter[ram][eql]".to_string(), "32".to_string()),
                ("filter[ram][gte]".to_string(), "16".to_string()),
                ("filter[ram][lte]".to_string(), "64".to_string()),
            ]
        );

        let mut params = ApiParams::new();
        params.range_filter("disk", &Range { gte: Some(500), ..Range::default() });
        assert_eq!(params.get("filter[disk][gte]"), Some("500"));
        assert!(!params.contains_key("filter[disk][eql]"));
        assert!(!params.contains_key("filter[disk][lte]"));
    }

    #[test]
    fn both_tag_dialects_reach_the_same_wire_value() {
        let csv: Tags = serde_json::from_value(json!("tag_a,tag_b")).unwrap();
        let list: Tags = serde_json::from_value(json!(["tag_a", "tag_b"])).unwrap();
        assert_eq!(csv.to_wire(), list.to_wire());
    }

    #[test]
    fn explicit_false_filter_is_forwarded() {
        let mut params = ApiParams::new();
        params.filter("gpu", Some(false));
        params.filter::<bool>("in_stock", None);
        assert_eq!(params.get("filter[gpu]"), Some("false"));
        assert!(!params.contains_key("filter[in_stock]"));
    }

    #[test]
    fn extra_fields_only_when_requested() {
        let mut params = ApiParams::new();
        params.extra_fields("projects", None);
        assert!(params.is_empty());
        params.extra_fields("projects", Some("last_renewal_date,next_renewal_date"));
        assert_eq!(
            params.get("extra_fields[projects]"),
            Some("last_renewal_date,next_renewal_date")
        );
    }

    #[test]
    fn resource_document_omits_unset_attributes() {
        let attrs = Attributes::new()
            .set("name", "demo")
            .set_opt::<&str>("description", None)
            .set_opt("tags", Some(vec!["tag_a"]));
        assert_eq!(
            resource_document("projects", Some("proj_1"), attrs),
            json!({
                "data": {
                    "type": "projects",
                    "id": "proj_1",
                    "attributes": { "name": "demo", "tags": ["tag_a"] }
                }
            })
        );
    }
}
