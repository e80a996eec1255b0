use std::cmp::Ordering;

use serde_json::Value;

use passline_api::{ListQuery, RawDocument};

use crate::model::Collection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

/// Collection plus predicate for one live query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionQuery {
    pub collection: Collection,
    /// Equality filters, all of which must match.
    pub filters: Vec<(String, String)>,
    pub sort: Option<SortSpec>,
}

impl CollectionQuery {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            sort: None,
        }
    }

    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn to_list_query(&self) -> ListQuery {
        ListQuery {
            order_by: self.sort.as_ref().map(|s| s.field.clone()),
            descending: self
                .sort
                .as_ref()
                .is_some_and(|s| s.direction == SortDirection::Descending),
            filters: self.filters.clone(),
            limit: None,
        }
    }

    pub fn matches(&self, doc: &RawDocument) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| doc.get(field).is_some_and(|v| value_matches(v, expected)))
    }

    /// Sort documents by the declared order. Documents missing the sort
    /// field go last in either direction; ties keep their relative order.
    pub fn arrange(&self, docs: &mut [RawDocument]) {
        let Some(sort) = &self.sort else {
            return;
        };
        docs.sort_by(|a, b| match (a.get(&sort.field), b.get(&sort.field)) {
            (Some(x), Some(y)) => {
                let ord = compare_values(x, y);
                match sort.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }
}

fn value_matches(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        _ => false,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> RawDocument {
        serde_json::from_value(value).unwrap()
    }

    fn ids(docs: &[RawDocument]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn arranges_newest_first() {
        let query = Collection::Scans.default_query();
        let mut docs = vec![
            doc(json!({"id": "a", "created_at": "2026-03-01T10:00:00Z"})),
            doc(json!({"id": "b"})),
            doc(json!({"id": "c", "created_at": "2026-03-01T11:00:00Z"})),
        ];
        query.arrange(&mut docs);
        assert_eq!(ids(&docs), ["c", "a", "b"]);
    }

    #[test]
    fn numbers_sort_numerically() {
        let query = CollectionQuery::new(Collection::Tables).order_by("number", SortDirection::Ascending);
        let mut docs = vec![
            doc(json!({"id": "t10", "number": 10})),
            doc(json!({"id": "t2", "number": 2})),
        ];
        query.arrange(&mut docs);
        assert_eq!(ids(&docs), ["t2", "t10"]);
    }

    #[test]
    fn filters_match_scalar_fields() {
        let query = CollectionQuery::new(Collection::Orders).filter("table", "4").filter("paid", "false");
        assert!(query.matches(&doc(json!({"id": "o", "table": "4", "paid": false}))));
        assert!(!query.matches(&doc(json!({"id": "o", "table": "5", "paid": false}))));
        assert!(!query.matches(&doc(json!({"id": "o", "table": "4"}))));
    }

    #[test]
    fn list_query_carries_sort_and_filters() {
        let list = Collection::Scans
            .default_query()
            .filter("table", "7")
            .to_list_query();
        assert_eq!(list.order_by.as_deref(), Some("created_at"));
        assert!(list.descending);
        assert_eq!(list.filters, vec![("table".to_owned(), "7".to_owned())]);
    }
}
