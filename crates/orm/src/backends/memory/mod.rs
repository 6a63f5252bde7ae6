//! In-memory data stores
//!
//! Process-local implementations of every collaborator trait, used by
//! [`Context::in_memory`](crate::Context::in_memory) and the test suite.

mod connection;
mod meta;
mod posts;
mod terms;

pub use connection::MemoryConnection;
pub use meta::MemoryMeta;
pub use posts::MemoryPosts;
pub use terms::MemoryTerms;

use std::cmp::Ordering;

use chrono::Local;
use serde_json::Value;

use crate::value::{is_equivalent, is_numeric, Row};

static NULL: Value = Value::Null;

/// Column of a row, null when missing
pub(crate) fn column<'a>(row: &'a Row, name: &str) -> &'a Value {
    row.get(name).unwrap_or(&NULL)
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if is_numeric(value) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Loose equality: equivalent values, or numbers that compare equal
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    if is_equivalent(a, b) || is_equivalent(b, a) {
        return true;
    }

    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) if !a.is_null() && !b.is_null() => x == y,
        _ => false,
    }
}

/// Ordering used by `order by` and comparison operators: nulls first, then
/// numerically when both sides are numeric, else by text
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }

    if is_numeric(a) && is_numeric(b) {
        if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
            return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
        }
    }

    as_text(a).cmp(&as_text(b))
}

/// Case-insensitive SQL `like` with `%` and `_` wildcards
pub(crate) fn like(value: &Value, pattern: &Value) -> bool {
    let value: Vec<char> = as_text(value).to_lowercase().chars().collect();
    let pattern: Vec<char> = as_text(pattern).to_lowercase().chars().collect();
    like_match(&value, &pattern)
}

fn like_match(value: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => value.is_empty(),
        Some(('%', rest)) => (0..=value.len()).any(|i| like_match(&value[i..], rest)),
        Some(('_', rest)) => !value.is_empty() && like_match(&value[1..], rest),
        Some((c, rest)) => value.first() == Some(c) && like_match(&value[1..], rest),
    }
}

/// A var that may hold one value or a list; strings split on commas
pub(crate) fn list_var(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(values) => values.clone(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Value::from)
            .collect(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

/// Non-negative integer var
pub(crate) fn int_var(value: Option<&Value>) -> Option<i64> {
    value.and_then(as_f64).map(|n| n as i64)
}

/// Local time in the `Y-m-d H:i:s` format used by date columns
pub(crate) fn now() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Lowercase, hyphenated slug of `name`
pub(crate) fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().to_lowercase().chars() {
        if c.is_alphanumeric() || c == '_' {
            slug.push(c);
        } else if (c.is_whitespace() || c == '-') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Sort `rows` by one column, keeping equal rows in `tiebreak` order
pub(crate) fn sort_rows(rows: &mut [Row], column_name: &str, descending: bool, tiebreak: &str) {
    rows.sort_by(|a, b| {
        let ordering = compare_values(column(a, column_name), column(b, column_name))
            .then_with(|| compare_values(column(a, tiebreak), column(b, tiebreak)));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// Apply `offset` then `limit`
pub(crate) fn paginate(rows: Vec<Row>, offset: usize, limit: Option<usize>) -> Vec<Row> {
    let rows = rows.into_iter().skip(offset);
    match limit {
        Some(limit) => rows.take(limit).collect(),
        None => rows.collect(),
    }
}
