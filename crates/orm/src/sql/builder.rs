//! SQL query builder
//!
//! A structured description of a single-table query. Nothing is executed
//! here: a [`Connection`](crate::backends::Connection) receives the builder
//! and either renders it with [`QueryBuilder::to_sql`] or evaluates the
//! clauses directly.

use serde_json::Value;

use super::types::*;
use crate::error::{ModelResult, QueryError};

/// Query builder for single-table statements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    pub(crate) prefix: String,
    pub(crate) table: Option<String>,
    pub(crate) columns: Vec<String>,
    pub(crate) wheres: Vec<WhereCondition>,
    pub(crate) orders: Vec<(String, OrderDirection)>,
    pub(crate) limit_count: Option<u64>,
    pub(crate) offset_value: Option<u64>,
}

impl QueryBuilder {
    /// Create a builder whose table names receive `prefix`
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            ..Self::default()
        }
    }

    /// Create a builder for `table`
    pub fn table(prefix: &str, table: &str) -> Self {
        Self::new(prefix).from(table)
    }

    /// Set the table, without prefix
    pub fn from(mut self, table: &str) -> Self {
        self.set_table(table);
        self
    }

    /// Select columns
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add WHERE condition with equality
    pub fn where_eq<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.where_op(column, QueryOperator::Equal, value)
    }

    /// Add WHERE condition with an explicit operator
    pub fn where_op<T: Into<Value>>(mut self, column: &str, operator: QueryOperator, value: T) -> Self {
        self.push_where(column, operator, value.into(), Boolean::And);
        self
    }

    /// Add OR WHERE condition
    pub fn or_where<T: Into<Value>>(mut self, column: &str, operator: QueryOperator, value: T) -> Self {
        self.push_where(column, operator, value.into(), Boolean::Or);
        self
    }

    /// Add WHERE IN condition
    pub fn where_in<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.push_where(column, QueryOperator::In, Value::Array(values), Boolean::And);
        self
    }

    /// Add WHERE NOT IN condition
    pub fn where_not_in<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.push_where(column, QueryOperator::NotIn, Value::Array(values), Boolean::And);
        self
    }

    /// Add WHERE column IS NULL
    pub fn where_null(mut self, column: &str) -> Self {
        self.push_where(column, QueryOperator::IsNull, Value::Null, Boolean::And);
        self
    }

    /// Add WHERE column IS NOT NULL
    pub fn where_not_null(mut self, column: &str) -> Self {
        self.push_where(column, QueryOperator::IsNotNull, Value::Null, Boolean::And);
        self
    }

    /// Add ORDER BY clause
    pub fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.orders.push((column.to_string(), direction));
        self
    }

    /// Add LIMIT clause
    pub fn limit(mut self, count: u64) -> Self {
        self.limit_count = Some(count);
        self
    }

    /// Add OFFSET clause
    pub fn offset(mut self, count: u64) -> Self {
        self.offset_value = Some(count);
        self
    }

    /// Table name with the prefix applied
    pub fn table_name(&self) -> Option<String> {
        self.table
            .as_ref()
            .map(|table| format!("{}{}", self.prefix, table))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn wheres(&self) -> &[WhereCondition] {
        &self.wheres
    }

    pub fn orders(&self) -> &[(String, OrderDirection)] {
        &self.orders
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit_count
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset_value
    }

    pub(crate) fn set_table(&mut self, table: &str) {
        self.table = Some(table.to_string());
    }

    pub(crate) fn push_where(&mut self, column: &str, operator: QueryOperator, value: Value, boolean: Boolean) {
        let (value, values) = match (operator, value) {
            (QueryOperator::In | QueryOperator::NotIn, Value::Array(values)) => (None, values),
            (QueryOperator::In | QueryOperator::NotIn, value) => (None, vec![value]),
            (QueryOperator::IsNull | QueryOperator::IsNotNull, _) => (None, Vec::new()),
            (_, value) => (Some(value), Vec::new()),
        };

        self.wheres.push(WhereCondition {
            column: column.to_string(),
            operator,
            value,
            values,
            boolean,
        });
    }

    /// Apply a builder operation by name.
    ///
    /// Returns `None` when the builder has no operation of that name.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Option<ModelResult<()>> {
        let result = match name {
            "from" => string_arg(name, args, 0).map(|table| self.set_table(&table)),
            "select" => select_args(name, args).map(|columns| self.columns = columns),
            "where" => self.call_where(name, args, Boolean::And),
            "orWhere" | "or_where" => self.call_where(name, args, Boolean::Or),
            "whereIn" | "where_in" => self.call_where_in(name, args, QueryOperator::In),
            "whereNotIn" | "where_not_in" => self.call_where_in(name, args, QueryOperator::NotIn),
            "whereNull" | "where_null" => string_arg(name, args, 0).map(|column| {
                self.push_where(&column, QueryOperator::IsNull, Value::Null, Boolean::And)
            }),
            "whereNotNull" | "where_not_null" => string_arg(name, args, 0).map(|column| {
                self.push_where(&column, QueryOperator::IsNotNull, Value::Null, Boolean::And)
            }),
            "orderBy" | "order_by" => self.call_order_by(name, args),
            "limit" | "take" => count_arg(name, args).map(|count| self.limit_count = Some(count)),
            "offset" | "skip" => count_arg(name, args).map(|count| self.offset_value = Some(count)),
            _ => return None,
        };

        Some(result.map_err(Into::into))
    }

    fn call_where(&mut self, name: &str, args: &[Value], boolean: Boolean) -> Result<(), QueryError> {
        let column = string_arg(name, args, 0)?;

        let (operator, value) = match args {
            [_, value] => (QueryOperator::Equal, value.clone()),
            [_, Value::String(operator), value] => {
                let operator = QueryOperator::parse(operator).ok_or_else(|| {
                    QueryError::invalid_arguments(name, format!("unknown operator '{}'", operator))
                })?;
                (operator, value.clone())
            }
            _ => {
                return Err(QueryError::invalid_arguments(
                    name,
                    "expected (column, value) or (column, operator, value)",
                ))
            }
        };

        self.push_where(&column, operator, value, boolean);
        Ok(())
    }

    fn call_where_in(&mut self, name: &str, args: &[Value], operator: QueryOperator) -> Result<(), QueryError> {
        let column = string_arg(name, args, 0)?;
        match args.get(1) {
            Some(Value::Array(values)) => {
                self.push_where(&column, operator, Value::Array(values.clone()), Boolean::And);
                Ok(())
            }
            _ => Err(QueryError::invalid_arguments(name, "expected (column, [values])")),
        }
    }

    fn call_order_by(&mut self, name: &str, args: &[Value]) -> Result<(), QueryError> {
        let column = string_arg(name, args, 0)?;
        let direction = match args.get(1) {
            None | Some(Value::Null) => OrderDirection::Asc,
            Some(Value::String(direction)) => OrderDirection::parse(direction).ok_or_else(|| {
                QueryError::invalid_arguments(name, format!("unknown direction '{}'", direction))
            })?,
            Some(_) => return Err(QueryError::invalid_arguments(name, "direction must be a string")),
        };

        self.orders.push((column, direction));
        Ok(())
    }
}

fn string_arg(name: &str, args: &[Value], index: usize) -> Result<String, QueryError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(QueryError::invalid_arguments(
            name,
            format!("argument {} must be a string", index + 1),
        )),
    }
}

fn count_arg(name: &str, args: &[Value]) -> Result<u64, QueryError> {
    match args.first() {
        Some(Value::Number(n)) => Ok(n
            .as_u64()
            .or_else(|| n.as_i64().map(|n| n.max(0) as u64))
            .unwrap_or_default()),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(|n| n.max(0) as u64)
            .map_err(|_| QueryError::invalid_arguments(name, "expected an integer")),
        _ => Err(QueryError::invalid_arguments(name, "expected an integer")),
    }
}

fn select_args(name: &str, args: &[Value]) -> Result<Vec<String>, QueryError> {
    let values: Vec<&Value> = match args {
        [Value::Array(columns)] => columns.iter().collect(),
        args => args.iter().collect(),
    };

    values
        .into_iter()
        .map(|value| match value {
            Value::String(column) => Ok(column.clone()),
            _ => Err(QueryError::invalid_arguments(name, "columns must be strings")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fluent_construction() {
        let query = QueryBuilder::table("wp_", "posts")
            .select(&["ID", "post_title"])
            .where_eq("post_type", "page")
            .order_by("ID", OrderDirection::Asc)
            .limit(10)
            .offset(5);

        assert_eq!(query.table_name().as_deref(), Some("wp_posts"));
        assert_eq!(query.columns(), ["ID", "post_title"]);
        assert_eq!(query.wheres().len(), 1);
        assert_eq!(query.wheres()[0].value, Some(json!("page")));
        assert_eq!(query.limit_value(), Some(10));
        assert_eq!(query.offset_value(), Some(5));
    }

    #[test]
    fn test_call_recognises_builder_operations() {
        let mut query = QueryBuilder::table("wp_", "users");

        assert!(query.call("where", &[json!("ID"), json!(">="), json!(100)]).unwrap().is_ok());
        assert!(query.call("orWhere", &[json!("ID"), json!("<="), json!(10)]).unwrap().is_ok());
        assert!(query.call("whereIn", &[json!("user_status"), json!([0, 1])]).unwrap().is_ok());
        assert!(query.call("orderBy", &[json!("ID"), json!("desc")]).unwrap().is_ok());
        assert!(query.call("take", &[json!(3)]).unwrap().is_ok());
        assert!(query.call("skip", &[json!(-4)]).unwrap().is_ok());

        assert_eq!(query.wheres().len(), 3);
        assert_eq!(query.wheres()[1].boolean, Boolean::Or);
        assert_eq!(query.wheres()[2].values, vec![json!(0), json!(1)]);
        assert_eq!(query.orders(), [("ID".to_string(), OrderDirection::Desc)]);
        assert_eq!(query.limit_value(), Some(3));
        assert_eq!(query.offset_value(), Some(0));
    }

    #[test]
    fn test_call_unknown_operation_is_none() {
        let mut query = QueryBuilder::table("wp_", "posts");
        assert!(query.call("post__in", &[json!([1, 2])]).is_none());
    }

    #[test]
    fn test_call_rejects_bad_arguments() {
        let mut query = QueryBuilder::table("wp_", "posts");

        let result = query.call("where", &[json!("ID"), json!("between"), json!(1)]).unwrap();
        assert!(result.is_err());

        let result = query.call("limit", &[json!("many")]).unwrap();
        assert!(result.is_err());

        let result = query.call("whereIn", &[json!("ID"), json!(1)]).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_select_accepts_list_or_variadic() {
        let mut query = QueryBuilder::table("wp_", "posts");
        query.call("select", &[json!(["ID", "post_name"])]).unwrap().unwrap();
        assert_eq!(query.columns(), ["ID", "post_name"]);

        query.call("select", &[json!("ID")]).unwrap().unwrap();
        assert_eq!(query.columns(), ["ID"]);
    }
}
