// SQL fragment builders for partial updates and dynamic filters

use crate::errors::AppError;
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryAs;

/// A `query_as` bound against Postgres positional arguments
pub type PgQueryAs<'q, O> = QueryAs<'q, Postgres, O, PgArguments>;

/// A typed bind parameter
///
/// Each variant carries its own SQL type so that an explicit NULL still binds with the
/// column's type rather than as untyped text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Integer(Option<i32>),
    Numeric(Option<Decimal>),
    Bool(Option<bool>),
}

impl SqlValue {
    /// Bind this value as the next positional parameter of `query`
    pub fn bind_to<'q, O>(self, query: PgQueryAs<'q, O>) -> PgQueryAs<'q, O> {
        match self {
            SqlValue::Text(v) => query.bind(v),
            SqlValue::Integer(v) => query.bind(v),
            SqlValue::Numeric(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
        }
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(Some(v))
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(Some(v.to_string()))
    }
}

impl From<Option<String>> for SqlValue {
    fn from(v: Option<String>) -> Self {
        SqlValue::Text(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Integer(Some(v))
    }
}

impl From<Option<i32>> for SqlValue {
    fn from(v: Option<i32>) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Numeric(Some(v))
    }
}

impl From<Option<Decimal>> for SqlValue {
    fn from(v: Option<Decimal>) -> Self {
        SqlValue::Numeric(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(Some(v))
    }
}

/// Bind every value in order, after whatever the query already has bound
pub fn bind_all<'q, O>(query: PgQueryAs<'q, O>, values: Vec<SqlValue>) -> PgQueryAs<'q, O> {
    values
        .into_iter()
        .fold(query, |query, value| value.bind_to(query))
}

/// Ordered set of `field -> new value` pairs for a partial update
///
/// Insertion order is preserved because it decides the positional parameter numbers.
/// Pushing a field that is already present replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: Vec<(String, SqlValue)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, value: impl Into<SqlValue>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(field, value);
        self
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl IntoIterator for FieldSet {
    type Item = (String, SqlValue);
    type IntoIter = std::vec::IntoIter<(String, SqlValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Translation table from logical field names to SQL column names
///
/// Fields without an entry map to themselves.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    entries: &'static [(&'static str, &'static str)],
}

impl ColumnMap {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    pub fn column<'a>(&self, field: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| *column)
            .unwrap_or(field)
    }
}

/// Output of [`sql_for_partial_update`]
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    /// e.g. `"first_name"=$1, "age"=$2`
    pub clause: String,
    pub values: Vec<SqlValue>,
}

impl SetClause {
    /// Positional index for the first parameter the caller appends (usually the row key)
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }
}

/// Quote an identifier, doubling embedded quotes
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Build the assignment list of an `UPDATE ... SET` statement from a sparse field set
///
/// Produces one `"<column>"=$<n>` fragment per field, numbered from 1 in field order,
/// and the values in that same order. Fails with BadRequest when there is nothing to set.
///
/// ```
/// use common::sql::{sql_for_partial_update, ColumnMap, FieldSet, SqlValue};
///
/// const COLUMNS: ColumnMap = ColumnMap::new(&[("firstName", "first_name")]);
/// let fields = FieldSet::new().with("firstName", "Aliya").with("age", 32);
/// let set = sql_for_partial_update(fields, &COLUMNS).unwrap();
/// assert_eq!(set.clause, r#""first_name"=$1, "age"=$2"#);
/// assert_eq!(set.values, vec![SqlValue::from("Aliya"), SqlValue::from(32)]);
/// ```
pub fn sql_for_partial_update(
    fields: FieldSet,
    column_map: &ColumnMap,
) -> Result<SetClause, AppError> {
    if fields.is_empty() {
        return Err(AppError::bad_request("No data"));
    }

    let mut fragments = Vec::with_capacity(fields.len());
    let mut values = Vec::with_capacity(fields.len());

    for (idx, (field, value)) in fields.into_iter().enumerate() {
        fragments.push(format!(
            "{}=${}",
            quote_ident(column_map.column(&field)),
            idx + 1
        ));
        values.push(value);
    }

    Ok(SetClause {
        clause: fragments.join(", "),
        values,
    })
}

/// WHERE clause with its positional values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    /// Empty, or ` WHERE <cond> AND <cond> ...`
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Accumulates AND-ed predicates, numbering parameters as they are added
#[derive(Debug, Default)]
pub struct WhereBuilder {
    conditions: Vec<String>,
    values: Vec<SqlValue>,
}

impl WhereBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameterized predicate; the first `$` in `template` becomes `$<n>`
    pub fn push_param(&mut self, template: &str, value: impl Into<SqlValue>) -> &mut Self {
        self.values.push(value.into());
        let placeholder = format!("${}", self.values.len());
        self.conditions.push(template.replacen('$', &placeholder, 1));
        self
    }

    /// Add a predicate without parameters
    pub fn push_raw(&mut self, condition: impl Into<String>) -> &mut Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn build(self) -> WhereClause {
        if self.conditions.is_empty() {
            return WhereClause::default();
        }
        WhereClause {
            sql: format!(" WHERE {}", self.conditions.join(" AND ")),
            values: self.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_COLUMNS: ColumnMap = ColumnMap::new(&[("firstName", "first_name")]);

    #[test]
    fn test_partial_update_one_item() {
        let fields = FieldSet::new().with("firstName", "Aliya");
        let set = sql_for_partial_update(fields, &USER_COLUMNS).unwrap();
        assert_eq!(set.clause, r#""first_name"=$1"#);
        assert_eq!(set.values, vec![SqlValue::from("Aliya")]);
        assert_eq!(set.next_placeholder(), 2);
    }

    #[test]
    fn test_partial_update_falls_back_to_raw_key() {
        let fields = FieldSet::new().with("firstName", "Aliya").with("age", 32);
        let set = sql_for_partial_update(fields, &USER_COLUMNS).unwrap();
        assert_eq!(set.clause, r#""first_name"=$1, "age"=$2"#);
        assert_eq!(set.values, vec![SqlValue::from("Aliya"), SqlValue::from(32)]);
    }

    #[test]
    fn test_partial_update_rejects_empty_fields() {
        let err = sql_for_partial_update(FieldSet::new(), &USER_COLUMNS).unwrap_err();
        assert_eq!(err, AppError::BadRequest("No data".to_string()));
    }

    #[test]
    fn test_partial_update_keeps_explicit_null() {
        let fields = FieldSet::new().with("salary", None::<i32>);
        let set = sql_for_partial_update(fields, &ColumnMap::new(&[])).unwrap();
        assert_eq!(set.clause, r#""salary"=$1"#);
        assert_eq!(set.values, vec![SqlValue::Integer(None)]);
    }

    #[test]
    fn test_field_set_push_replaces_existing_in_place() {
        let mut fields = FieldSet::new().with("a", 1).with("b", 2);
        fields.push("a", 3);
        let pairs: Vec<_> = fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), SqlValue::from(3)),
                ("b".to_string(), SqlValue::from(2))
            ]
        );
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("order"), r#""order""#);
        assert_eq!(quote_ident(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn test_where_builder_empty() {
        let clause = WhereBuilder::new().build();
        assert_eq!(clause.sql, "");
        assert!(clause.values.is_empty());
    }

    #[test]
    fn test_where_builder_numbers_params_and_skips_raw() {
        let mut builder = WhereBuilder::new();
        builder
            .push_param("title ILIKE $", "%eng%")
            .push_raw("equity > 0")
            .push_param("salary >= $", 100);
        let clause = builder.build();
        assert_eq!(
            clause.sql,
            " WHERE title ILIKE $1 AND equity > 0 AND salary >= $2"
        );
        assert_eq!(
            clause.values,
            vec![SqlValue::from("%eng%"), SqlValue::from(100)]
        );
    }
}
