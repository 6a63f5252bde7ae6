//! SQL generation in the `$wpdb->prepare` grammar
//!
//! Keywords are lowercase, identifiers are backtick-quoted and values are
//! replaced with `%d`, `%f` or `%s` placeholders; [`QueryBuilder::bindings`]
//! returns the values in placeholder order.

use serde_json::Value;

use super::builder::QueryBuilder;
use super::types::*;

impl QueryBuilder {
    /// Render the query as a select statement
    pub fn to_sql(&self) -> String {
        let mut sql = String::from("select ");

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            let columns: Vec<String> = self.columns.iter().map(|c| wrap(c)).collect();
            sql.push_str(&columns.join(", "));
        }

        if let Some(table) = self.table_name() {
            sql.push_str(" from ");
            sql.push_str(&wrap(&table));
        }

        self.build_where_clause(&mut sql);
        self.build_order_limit_clause(&mut sql);

        sql
    }

    /// Render the query as a delete statement
    pub fn to_delete_sql(&self) -> String {
        let mut sql = String::from("delete");

        if let Some(table) = self.table_name() {
            sql.push_str(" from ");
            sql.push_str(&wrap(&table));
        }

        self.build_where_clause(&mut sql);
        sql
    }

    /// Values bound to the placeholders, in order
    pub fn bindings(&self) -> Vec<Value> {
        self.wheres
            .iter()
            .flat_map(|condition| match condition.operator {
                QueryOperator::IsNull | QueryOperator::IsNotNull => Vec::new(),
                QueryOperator::In | QueryOperator::NotIn => condition.values.clone(),
                _ => condition.value.iter().cloned().collect(),
            })
            .collect()
    }

    fn build_where_clause(&self, sql: &mut String) {
        if self.wheres.is_empty() {
            return;
        }

        sql.push_str(" where ");
        for (i, condition) in self.wheres.iter().enumerate() {
            if i > 0 {
                sql.push_str(&format!(" {} ", condition.boolean));
            }
            sql.push_str(&compile_condition(condition));
        }
    }

    fn build_order_limit_clause(&self, sql: &mut String) {
        if !self.orders.is_empty() {
            let orders: Vec<String> = self
                .orders
                .iter()
                .map(|(column, direction)| {
                    format!("{} {}", wrap(column), direction.as_str().to_ascii_lowercase())
                })
                .collect();
            sql.push_str(" order by ");
            sql.push_str(&orders.join(", "));
        }

        if let Some(limit) = self.limit_count {
            sql.push_str(&format!(" limit {}", limit));
        }

        if let Some(offset) = self.offset_value {
            sql.push_str(&format!(" offset {}", offset));
        }
    }
}

fn compile_condition(condition: &WhereCondition) -> String {
    let column = wrap(&condition.column);

    match condition.operator {
        QueryOperator::IsNull | QueryOperator::IsNotNull => {
            format!("{} {}", column, condition.operator)
        }
        QueryOperator::In if condition.values.is_empty() => "0 = 1".to_string(),
        QueryOperator::NotIn if condition.values.is_empty() => "1 = 1".to_string(),
        QueryOperator::In | QueryOperator::NotIn => {
            let placeholders: Vec<&str> = condition.values.iter().map(placeholder).collect();
            format!("{} {} ({})", column, condition.operator, placeholders.join(", "))
        }
        _ => match &condition.value {
            Some(value) => format!("{} {} {}", column, condition.operator, placeholder(value)),
            None => format!("{} is null", column),
        },
    }
}

/// Placeholder for a bound value
pub fn placeholder(value: &Value) -> &'static str {
    match value {
        Value::Number(n) if n.is_f64() => "%f",
        Value::Number(_) | Value::Bool(_) => "%d",
        _ => "%s",
    }
}

/// Quote an identifier, keeping `*` and qualifying dots intact
pub fn wrap(identifier: &str) -> String {
    identifier
        .split('.')
        .map(|segment| {
            if segment == "*" {
                segment.to_string()
            } else {
                format!("`{}`", segment.replace('`', "``"))
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_with_order_limit_offset() {
        let query = QueryBuilder::table("wptests_", "posts")
            .select(&["ID"])
            .order_by("ID", OrderDirection::Asc)
            .limit(10)
            .offset(5);

        assert_eq!(
            query.to_sql(),
            "select `ID` from `wptests_posts` order by `ID` asc limit 10 offset 5"
        );
        assert!(query.bindings().is_empty());
    }

    #[test]
    fn test_where_and_or_where() {
        let query = QueryBuilder::table("wptests_", "users")
            .where_op("ID", QueryOperator::GreaterThanOrEqual, 100)
            .or_where("ID", QueryOperator::LessThanOrEqual, 10);

        assert_eq!(
            query.to_sql(),
            "select * from `wptests_users` where `ID` >= %d or `ID` <= %d"
        );
        assert_eq!(query.bindings(), vec![json!(100), json!(10)]);
    }

    #[test]
    fn test_placeholders_follow_value_type() {
        let query = QueryBuilder::table("wp_", "postmeta")
            .where_eq("meta_key", "price")
            .where_op("meta_value", QueryOperator::GreaterThan, 9.5)
            .where_in("post_id", vec![1, 2, 3])
            .where_null("deleted_at");

        assert_eq!(
            query.to_sql(),
            "select * from `wp_postmeta` where `meta_key` = %s and `meta_value` > %f \
             and `post_id` in (%d, %d, %d) and `deleted_at` is null"
        );
        assert_eq!(
            query.bindings(),
            vec![json!("price"), json!(9.5), json!(1), json!(2), json!(3)]
        );
    }

    #[test]
    fn test_empty_in_list() {
        let query = QueryBuilder::table("wp_", "posts").where_in::<i64>("ID", vec![]);
        assert_eq!(query.to_sql(), "select * from `wp_posts` where 0 = 1");
    }

    #[test]
    fn test_delete_sql() {
        let query = QueryBuilder::table("wp_", "options").where_eq("option_id", 3);
        assert_eq!(query.to_delete_sql(), "delete from `wp_options` where `option_id` = %d");
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("ID"), "`ID`");
        assert_eq!(wrap("p.ID"), "`p`.`ID`");
        assert_eq!(wrap("p.*"), "`p`.*");
    }
}
