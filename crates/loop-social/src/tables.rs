//! Generic table access.
//!
//! [`TableStore`] is the seam between the repository and a backend. Filters
//! are a conjunction of equality and membership conditions with optional
//! ordering, which is all the client needs and maps directly onto
//! PostgREST query parameters.

use crate::SocialResult;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// One table row as a JSON object.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    In(String, Vec<Value>),
}

impl Condition {
    fn matches(&self, row: &Row) -> bool {
        match self {
            Condition::Eq(column, value) => row.get(column).is_some_and(|v| values_equal(v, value)),
            Condition::In(column, values) => row
                .get(column)
                .is_some_and(|v| values.iter().any(|candidate| values_equal(v, candidate))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

/// Row filter and ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
    order: Option<Order>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Eq(column.to_string(), value.into()));
        self
    }

    pub fn is_in<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.conditions.push(Condition::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            descending: true,
        });
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            descending: false,
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    /// True when the filter would match every row.
    pub fn is_unfiltered(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }

    /// Sort rows in place according to the filter's ordering.
    pub fn sort(&self, rows: &mut [Row]) {
        let Some(order) = &self.order else {
            return;
        };
        rows.sort_by(|a, b| {
            let ordering = compare_values(a.get(&order.column), b.get(&order.column));
            if order.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }

    /// PostgREST query parameters, URL-encoded and joined with `&`.
    ///
    /// `eq` becomes `col=eq.v`, `is_in` becomes `col=in.(a,b)` and ordering
    /// becomes `order=col.desc`.
    pub fn to_query(&self) -> String {
        let mut parts: Vec<String> = self
            .conditions
            .iter()
            .map(|condition| match condition {
                Condition::Eq(column, value) => format!(
                    "{}=eq.{}",
                    urlencoding::encode(column),
                    urlencoding::encode(&render_value(value))
                ),
                Condition::In(column, values) => {
                    let list = values
                        .iter()
                        .map(render_list_item)
                        .collect::<Vec<_>>()
                        .join(",");
                    format!(
                        "{}=in.({})",
                        urlencoding::encode(column),
                        urlencoding::encode(&list)
                    )
                }
            })
            .collect();

        if let Some(order) = &self.order {
            parts.push(format!(
                "order={}.{}",
                urlencoding::encode(&order.column),
                if order.descending { "desc" } else { "asc" }
            ));
        }
        parts.join("&")
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Items inside `in.(...)` are quoted when they contain reserved characters.
fn render_list_item(value: &Value) -> String {
    let raw = render_value(value);
    if raw.contains([',', '(', ')', '"', ' ']) {
        format!("\"{}\"", raw.replace('"', "\\\""))
    } else {
        raw
    }
}

/// Equality that treats `1` and `1.0` (and `"1"` vs `1`) the same, since
/// ids arrive both as numbers and as strings.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            s.parse::<f64>().ok() == n.as_f64()
        }
        _ => a == b,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Backend for row storage.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Rows of `table` matching `filter`, in the filter's order.
    async fn select(&self, table: &str, filter: &Filter) -> SocialResult<Vec<Row>>;

    /// Insert rows and return them as stored (with generated columns).
    async fn insert(&self, table: &str, rows: Vec<Row>) -> SocialResult<Vec<Row>>;

    /// Delete rows matching `filter`. Deleting nothing is not an error.
    async fn delete(&self, table: &str, filter: &Filter) -> SocialResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_query_rendering() {
        let filter = Filter::new()
            .eq("user_id", "abc-123")
            .is_in("id", [1, 2, 3])
            .order_desc("created_at");

        assert_eq!(
            filter.to_query(),
            "user_id=eq.abc-123&id=in.%281%2C2%2C3%29&order=created_at.desc"
        );
    }

    #[test]
    fn test_query_encodes_reserved_characters() {
        let filter = Filter::new().eq("full_name", "Ada & Co").is_in("name", ["a,b"]);
        assert_eq!(
            filter.to_query(),
            "full_name=eq.Ada%20%26%20Co&name=in.%28%22a%2Cb%22%29"
        );
    }

    #[test]
    fn test_empty_filter() {
        let filter = Filter::new();
        assert!(filter.is_unfiltered());
        assert_eq!(filter.to_query(), "");
        assert!(filter.matches(&row(json!({"id": 1}))));
    }

    #[test]
    fn test_matches_mixed_id_types() {
        let filter = Filter::new().eq("group_id", 4).eq("user_id", "u1");
        assert!(filter.matches(&row(json!({"group_id": 4, "user_id": "u1"}))));
        assert!(filter.matches(&row(json!({"group_id": "4", "user_id": "u1"}))));
        assert!(!filter.matches(&row(json!({"group_id": 5, "user_id": "u1"}))));
        assert!(!filter.matches(&row(json!({"user_id": "u1"}))));

        let membership = Filter::new().is_in("id", [1, 3]);
        assert!(membership.matches(&row(json!({"id": 3}))));
        assert!(!membership.matches(&row(json!({"id": 2}))));
    }

    #[test]
    fn test_sort_desc_with_nulls_last() {
        let mut rows = vec![
            row(json!({"id": 1, "created_at": "2026-01-01T00:00:00Z"})),
            row(json!({"id": 2, "created_at": null})),
            row(json!({"id": 3, "created_at": "2026-03-01T00:00:00Z"})),
        ];
        Filter::new().order_desc("created_at").sort(&mut rows);

        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
