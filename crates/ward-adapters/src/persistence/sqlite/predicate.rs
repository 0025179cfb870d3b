//! Parameterized WHERE-clause assembly.
//!
//! Repositories translate scope structs into `Predicate` lists; the SQL
//! text only ever contains column names and placeholders, and every value
//! travels as a bound parameter.

use sqlx::query::{Query, QueryAs};
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;

/// A value bound to one `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Real(f64),
    Bool(bool),
    Null,
}

impl SqlValue {
    pub fn push_bind<'q>(
        &self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            Self::Text(v) => query.bind(v.clone()),
            Self::Int(v) => query.bind(*v),
            Self::Real(v) => query.bind(*v),
            Self::Bool(v) => query.bind(*v),
            Self::Null => query.bind(Option::<String>::None),
        }
    }

    pub fn push_bind_as<'q, O>(
        &self,
        query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
        match self {
            Self::Text(v) => query.bind(v.clone()),
            Self::Int(v) => query.bind(*v),
            Self::Real(v) => query.bind(*v),
            Self::Bool(v) => query.bind(*v),
            Self::Null => query.bind(Option::<String>::None),
        }
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SqlOp {
    Eq,
    Ge,
    Lt,
    Like,
    IsNull,
    IsNotNull,
}

/// One column condition. Unary operators carry no value.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    column: &'static str,
    op: SqlOp,
    value: Option<SqlValue>,
}

impl Predicate {
    pub fn eq(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self {
            column,
            op: SqlOp::Eq,
            value: Some(value.into()),
        }
    }

    pub fn ge(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self {
            column,
            op: SqlOp::Ge,
            value: Some(value.into()),
        }
    }

    pub fn lt(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self {
            column,
            op: SqlOp::Lt,
            value: Some(value.into()),
        }
    }

    pub fn like(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self {
            column,
            op: SqlOp::Like,
            value: Some(value.into()),
        }
    }

    pub fn is_null(column: &'static str) -> Self {
        Self {
            column,
            op: SqlOp::IsNull,
            value: None,
        }
    }

    pub fn is_not_null(column: &'static str) -> Self {
        Self {
            column,
            op: SqlOp::IsNotNull,
            value: None,
        }
    }

    fn render(&self) -> String {
        match self.op {
            SqlOp::Eq => format!("{} = ?", self.column),
            SqlOp::Ge => format!("{} >= ?", self.column),
            SqlOp::Lt => format!("{} < ?", self.column),
            SqlOp::Like => format!("{} LIKE ?", self.column),
            SqlOp::IsNull => format!("{} IS NULL", self.column),
            SqlOp::IsNotNull => format!("{} IS NOT NULL", self.column),
        }
    }
}

/// Render predicates into a ` WHERE ...` suffix and the bound values in
/// placeholder order. Empty input renders as an empty string.
pub fn where_clause(predicates: &[Predicate]) -> (String, Vec<SqlValue>) {
    if predicates.is_empty() {
        return (String::new(), Vec::new());
    }
    let clause = predicates
        .iter()
        .map(Predicate::render)
        .collect::<Vec<_>>()
        .join(" AND ");
    let values = predicates
        .iter()
        .filter_map(|p| p.value.clone())
        .collect();
    (format!(" WHERE {clause}"), values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_predicates_render_nothing() {
        let (sql, values) = where_clause(&[]);
        assert_eq!(sql, "");
        assert!(values.is_empty());
    }

    #[test]
    fn predicates_join_with_and() {
        let (sql, values) = where_clause(&[
            Predicate::eq("mo_gid", "120"),
            Predicate::ge("start_time", "2025-03-10T00:00:00Z"),
        ]);
        assert_eq!(sql, " WHERE mo_gid = ? AND start_time >= ?");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn unary_predicates_bind_no_value() {
        let (sql, values) =
            where_clause(&[Predicate::is_null("stop_time"), Predicate::eq("auto", true)]);
        assert_eq!(sql, " WHERE stop_time IS NULL AND auto = ?");
        assert_eq!(values, vec![SqlValue::Bool(true)]);
    }

    #[test]
    fn values_keep_placeholder_order() {
        let (_, values) = where_clause(&[
            Predicate::eq("a", 1i64),
            Predicate::is_not_null("b"),
            Predicate::lt("c", 2i64),
        ]);
        assert_eq!(values, vec![SqlValue::Int(1), SqlValue::Int(2)]);
    }
}
