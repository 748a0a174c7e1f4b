//! Query expressions over JSON document fields.
//!
//! # Responsibility
//! - Model filters as a small tagged expression (AND/OR/EQ/NE/IN/LT/GT/NULL
//!   checks).
//! - Model sort/pagination options passed through to `read_many`.
//! - Compile both into parameterized SQL over `json_extract(body, ...)`.
//!
//! # Invariants
//! - Field paths are validated when constructed; compiled SQL only ever embeds
//!   validated paths, values are always bound parameters.
//! - `EQ`/`NE` use `IS`/`IS NOT` so absent fields compare as null.
//! - The `uid` path reads the primary-key column, never the body.

use super::{StoreError, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static FIELD_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z_][a-z0-9_]*(\.[a-z_][a-z0-9_]*)*$").expect("valid field path regex")
});

/// Dotted path into a document body, e.g. `author.uid`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Cow<'static, str>);

impl FieldPath {
    /// Parses a caller-supplied path.
    ///
    /// # Errors
    /// - `StoreError::InvalidFilter` when the path is not dotted snake_case.
    pub fn parse(value: &str) -> StoreResult<Self> {
        let trimmed = value.trim();
        if !FIELD_PATH_RE.is_match(trimmed) {
            return Err(StoreError::InvalidFilter(format!(
                "invalid field path `{trimmed}`"
            )));
        }
        Ok(Self(Cow::Owned(trimmed.to_string())))
    }

    /// Path literal owned by the crate's own document definitions.
    pub(crate) const fn trusted(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// SQL expression reading this path from the `body` column.
    pub(crate) fn json_expr(&self) -> String {
        if self.is_identity() {
            return "uid".to_string();
        }
        format!("json_extract(body, '$.{}')", self.0)
    }

    /// `uid` is stored twice; the column copy is indexed.
    fn is_identity(&self) -> bool {
        self.0 == "uid"
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scalar compared against a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FilterValue {
    fn to_sql_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            // json_extract reports JSON booleans as 0/1.
            Self::Bool(value) => Value::Integer(i64::from(*value)),
            Self::Integer(value) => Value::Integer(*value),
            Self::Real(value) => Value::Real(*value),
            Self::Text(value) => Value::Text(value.clone()),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Tagged filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Eq(FieldPath, FilterValue),
    Ne(FieldPath, FilterValue),
    In(FieldPath, Vec<FilterValue>),
    Lt(FieldPath, FilterValue),
    Gt(FieldPath, FilterValue),
    IsNull(FieldPath),
    NotNull(FieldPath),
}

impl Filter {
    pub fn all() -> Self {
        Self::All
    }

    pub fn eq(path: FieldPath, value: impl Into<FilterValue>) -> Self {
        Self::Eq(path, value.into())
    }

    pub fn ne(path: FieldPath, value: impl Into<FilterValue>) -> Self {
        Self::Ne(path, value.into())
    }

    pub fn is_in<V: Into<FilterValue>>(
        path: FieldPath,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::In(path, values.into_iter().map(Into::into).collect())
    }

    pub fn lt(path: FieldPath, value: impl Into<FilterValue>) -> Self {
        Self::Lt(path, value.into())
    }

    pub fn gt(path: FieldPath, value: impl Into<FilterValue>) -> Self {
        Self::Gt(path, value.into())
    }

    pub fn is_null(path: FieldPath) -> Self {
        Self::IsNull(path)
    }

    pub fn not_null(path: FieldPath) -> Self {
        Self::NotNull(path)
    }

    /// Matches one document by identity.
    pub fn uid(uid: Uuid) -> Self {
        Self::eq(FieldPath::trusted("uid"), uid)
    }

    /// Conjunction of `self` and `other`, flattening nested ANDs.
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Self::All, other) => other,
            (this, Self::All) => this,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (this, other) => Self::And(vec![this, other]),
        }
    }

    /// Disjunction of `self` and `other`.
    pub fn or(self, other: Filter) -> Self {
        match (self, other) {
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (this, other) => Self::Or(vec![this, other]),
        }
    }

    pub(crate) fn write_sql(&self, sql: &mut String, binds: &mut Vec<Value>) {
        match self {
            Self::All => sql.push_str("1 = 1"),
            Self::And(parts) => write_group(sql, binds, parts, " AND ", "1 = 1"),
            Self::Or(parts) => write_group(sql, binds, parts, " OR ", "0 = 1"),
            Self::Eq(path, value) if path.is_identity() && *value != FilterValue::Null => {
                sql.push_str("uid = ?");
                binds.push(value.to_sql_value());
            }
            Self::Eq(path, value) => {
                sql.push_str(&path.json_expr());
                sql.push_str(" IS ?");
                binds.push(value.to_sql_value());
            }
            Self::Ne(path, value) => {
                sql.push_str(&path.json_expr());
                sql.push_str(" IS NOT ?");
                binds.push(value.to_sql_value());
            }
            Self::In(path, values) => {
                if values.is_empty() {
                    sql.push_str("0 = 1");
                    return;
                }
                sql.push_str(&path.json_expr());
                sql.push_str(" IN (");
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        sql.push_str(", ");
                    }
                    sql.push('?');
                    binds.push(value.to_sql_value());
                }
                sql.push(')');
            }
            Self::Lt(path, value) => {
                sql.push_str(&path.json_expr());
                sql.push_str(" < ?");
                binds.push(value.to_sql_value());
            }
            Self::Gt(path, value) => {
                sql.push_str(&path.json_expr());
                sql.push_str(" > ?");
                binds.push(value.to_sql_value());
            }
            Self::IsNull(path) => {
                sql.push_str(&path.json_expr());
                sql.push_str(" IS NULL");
            }
            Self::NotNull(path) => {
                sql.push_str(&path.json_expr());
                sql.push_str(" IS NOT NULL");
            }
        }
    }
}

fn write_group(
    sql: &mut String,
    binds: &mut Vec<Value>,
    parts: &[Filter],
    joiner: &str,
    empty: &str,
) {
    if parts.is_empty() {
        sql.push_str(empty);
        return;
    }
    sql.push('(');
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            sql.push_str(joiner);
        }
        part.write_sql(sql, binds);
    }
    sql.push(')');
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Sort and pagination options for `read_many`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Vec<(FieldPath, SortDirection)>,
    pub limit: Option<u32>,
    pub skip: u32,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_by(mut self, path: FieldPath, direction: SortDirection) -> Self {
        self.sort.push((path, direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }

    /// Appends ORDER BY / LIMIT / OFFSET; `uid` breaks ties deterministically.
    pub(crate) fn write_sql(&self, sql: &mut String, binds: &mut Vec<Value>) {
        sql.push_str(" ORDER BY ");
        for (path, direction) in &self.sort {
            sql.push_str(&path.json_expr());
            sql.push_str(match direction {
                SortDirection::Ascending => " ASC, ",
                SortDirection::Descending => " DESC, ",
            });
        }
        sql.push_str("uid ASC");

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            binds.push(Value::Integer(i64::from(limit)));
            if self.skip > 0 {
                sql.push_str(" OFFSET ?");
                binds.push(Value::Integer(i64::from(self.skip)));
            }
        } else if self.skip > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            binds.push(Value::Integer(i64::from(self.skip)));
        }
    }
}
