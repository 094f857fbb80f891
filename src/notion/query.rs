// src/notion/query.rs

//! Database query description and its JSON wire form.

use serde_json::{Value, json};

use crate::notion::Page;

/// A single filter clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    /// `property` checkbox equals `equals`
    Checkbox { property: String, equals: bool },
    /// `property` select option name equals `equals`
    Select { property: String, equals: String },
    /// Page `last_edited_time` on or after the ISO timestamp
    EditedSince(String),
}

impl QueryFilter {
    pub fn active() -> Self {
        QueryFilter::Checkbox {
            property: "active".into(),
            equals: true,
        }
    }

    pub fn published() -> Self {
        QueryFilter::Select {
            property: "status".into(),
            equals: "published".into(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            QueryFilter::Checkbox { property, equals } => json!({
                "property": property,
                "checkbox": { "equals": equals }
            }),
            QueryFilter::Select { property, equals } => json!({
                "property": property,
                "select": { "equals": equals }
            }),
            QueryFilter::EditedSince(ts) => json!({
                "timestamp": "last_edited_time",
                "last_edited_time": { "on_or_after": ts }
            }),
        }
    }

    /// Evaluate the clause locally against a fetched page.
    pub fn matches(&self, page: &Page) -> bool {
        match self {
            QueryFilter::Checkbox { property, equals } => page
                .properties
                .get(property)
                .and_then(|p| p.get("checkbox"))
                .and_then(Value::as_bool)
                .is_some_and(|v| v == *equals),
            QueryFilter::Select { property, equals } => page
                .properties
                .get(property)
                .and_then(|p| p.pointer("/select/name"))
                .and_then(Value::as_str)
                .is_some_and(|v| v == equals),
            QueryFilter::EditedSince(ts) => page.last_edited_time.as_str() >= ts.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySort {
    pub property: String,
    pub ascending: bool,
}

impl QuerySort {
    pub fn ascending(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            ascending: true,
        }
    }

    pub fn descending(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            ascending: false,
        }
    }
}

/// Query against one collection. All filters are combined with `and`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionQuery {
    pub database_id: String,
    pub filters: Vec<QueryFilter>,
    pub sorts: Vec<QuerySort>,
}

impl CollectionQuery {
    pub fn new(database_id: impl Into<String>) -> Self {
        Self {
            database_id: database_id.into(),
            filters: Vec::new(),
            sorts: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn sort(mut self, sort: QuerySort) -> Self {
        self.sorts.push(sort);
        self
    }

    /// The `filter` member of the request body, if any.
    pub fn filter_json(&self) -> Option<Value> {
        match self.filters.as_slice() {
            [] => None,
            [single] => Some(single.to_json()),
            many => Some(json!({
                "and": many.iter().map(QueryFilter::to_json).collect::<Vec<_>>()
            })),
        }
    }

    /// Full request body for one page of results.
    pub fn to_body(&self, page_size: u32, start_cursor: Option<&str>) -> Value {
        let mut body = serde_json::Map::new();
        body.insert("page_size".into(), json!(page_size));
        if let Some(filter) = self.filter_json() {
            body.insert("filter".into(), filter);
        }
        if !self.sorts.is_empty() {
            let sorts: Vec<Value> = self
                .sorts
                .iter()
                .map(|s| {
                    json!({
                        "property": s.property,
                        "direction": if s.ascending { "ascending" } else { "descending" }
                    })
                })
                .collect();
            body.insert("sorts".into(), Value::Array(sorts));
        }
        if let Some(cursor) = start_cursor {
            body.insert("start_cursor".into(), json!(cursor));
        }
        Value::Object(body)
    }

    /// Whether a page satisfies every filter clause.
    pub fn matches(&self, page: &Page) -> bool {
        self.filters.iter().all(|f| f.matches(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_filter_is_not_wrapped() {
        let q = CollectionQuery::new("db").filter(QueryFilter::active());
        assert_eq!(
            q.filter_json().unwrap(),
            json!({ "property": "active", "checkbox": { "equals": true } })
        );
    }

    #[test]
    fn compound_filter_uses_and() {
        let q = CollectionQuery::new("db")
            .filter(QueryFilter::active())
            .filter(QueryFilter::EditedSince("2024-05-01T00:00:00.000Z".into()))
            .sort(QuerySort::ascending("order"));
        let body = q.to_body(100, Some("cursor-1"));

        assert_eq!(body["page_size"], 100);
        assert_eq!(body["start_cursor"], "cursor-1");
        assert_eq!(body["filter"]["and"].as_array().unwrap().len(), 2);
        assert_eq!(
            body["filter"]["and"][1]["last_edited_time"]["on_or_after"],
            "2024-05-01T00:00:00.000Z"
        );
        assert_eq!(body["sorts"][0]["direction"], "ascending");
    }

    #[test]
    fn empty_query_has_only_page_size() {
        let body = CollectionQuery::new("db").to_body(50, None);
        assert_eq!(body, json!({ "page_size": 50 }));
    }

    #[test]
    fn local_matching() {
        let page: Page = serde_json::from_value(json!({
            "id": "p1",
            "last_edited_time": "2024-05-02T10:00:00.000Z",
            "properties": {
                "active": { "type": "checkbox", "checkbox": true },
                "status": { "type": "select", "select": { "name": "draft" } }
            }
        }))
        .unwrap();

        assert!(QueryFilter::active().matches(&page));
        assert!(!QueryFilter::published().matches(&page));
        assert!(QueryFilter::EditedSince("2024-05-01T00:00:00.000Z".into()).matches(&page));
        assert!(!QueryFilter::EditedSince("2024-06-01T00:00:00.000Z".into()).matches(&page));
    }
}
