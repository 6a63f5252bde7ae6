//! Clause types for the SQL builder

use std::fmt;

use serde_json::Value;

/// Comparison operators accepted in where clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    NotLike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl QueryOperator {
    /// Parse an operator as written in a query call, case-insensitively
    pub fn parse(operator: &str) -> Option<Self> {
        let operator = match operator.trim().to_ascii_lowercase().as_str() {
            "=" => QueryOperator::Equal,
            "!=" | "<>" => QueryOperator::NotEqual,
            ">" => QueryOperator::GreaterThan,
            ">=" => QueryOperator::GreaterThanOrEqual,
            "<" => QueryOperator::LessThan,
            "<=" => QueryOperator::LessThanOrEqual,
            "like" => QueryOperator::Like,
            "not like" => QueryOperator::NotLike,
            "in" => QueryOperator::In,
            "not in" => QueryOperator::NotIn,
            "is null" => QueryOperator::IsNull,
            "is not null" => QueryOperator::IsNotNull,
            _ => return None,
        };
        Some(operator)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOperator::Equal => "=",
            QueryOperator::NotEqual => "!=",
            QueryOperator::GreaterThan => ">",
            QueryOperator::GreaterThanOrEqual => ">=",
            QueryOperator::LessThan => "<",
            QueryOperator::LessThanOrEqual => "<=",
            QueryOperator::Like => "like",
            QueryOperator::NotLike => "not like",
            QueryOperator::In => "in",
            QueryOperator::NotIn => "not in",
            QueryOperator::IsNull => "is null",
            QueryOperator::IsNotNull => "is not null",
        }
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a where clause joins the clauses before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    #[default]
    And,
    Or,
}

impl fmt::Display for Boolean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boolean::And => write!(f, "and"),
            Boolean::Or => write!(f, "or"),
        }
    }
}

/// Where clause condition
#[derive(Debug, Clone, PartialEq)]
pub struct WhereCondition {
    pub column: String,
    pub operator: QueryOperator,
    pub value: Option<Value>,
    /// Operands of `in` / `not in`
    pub values: Vec<Value>,
    pub boolean: Boolean,
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

impl OrderDirection {
    pub fn parse(direction: &str) -> Option<Self> {
        match direction.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(OrderDirection::Asc),
            "DESC" => Some(OrderDirection::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_parsing() {
        assert_eq!(QueryOperator::parse("="), Some(QueryOperator::Equal));
        assert_eq!(QueryOperator::parse("<>"), Some(QueryOperator::NotEqual));
        assert_eq!(QueryOperator::parse("NOT LIKE"), Some(QueryOperator::NotLike));
        assert_eq!(QueryOperator::parse(" In "), Some(QueryOperator::In));
        assert_eq!(QueryOperator::parse("between"), None);
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!(OrderDirection::parse("asc"), Some(OrderDirection::Asc));
        assert_eq!(OrderDirection::parse("DESC"), Some(OrderDirection::Desc));
        assert_eq!(OrderDirection::parse("up"), None);
        assert_eq!(OrderDirection::default(), OrderDirection::Desc);
    }
}
