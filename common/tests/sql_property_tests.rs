// Property-based tests for the partial-update clause builder and the filters

use common::errors::AppError;
use common::models::JobFilter;
use common::sql::{quote_ident, sql_for_partial_update, ColumnMap, FieldSet, SqlValue};
use proptest::prelude::*;

const MAPPED: ColumnMap = ColumnMap::new(&[
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("numEmployees", "num_employees"),
]);

fn field_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("firstName".to_string()),
        Just("lastName".to_string()),
        Just("numEmployees".to_string()),
        "[a-z][a-zA-Z]{0,10}",
    ]
}

/// Distinct field names with integer values, in generation order
fn field_entries() -> impl Strategy<Value = Vec<(String, i32)>> {
    prop::collection::vec((field_name(), any::<i32>()), 1..8).prop_map(|entries| {
        let mut seen = std::collections::HashSet::new();
        entries
            .into_iter()
            .filter(|(name, _)| seen.insert(name.clone()))
            .collect()
    })
}

// Values keep field order and length; each column is the mapped name or the raw key
#[test]
fn property_set_clause_preserves_order_and_mapping() {
    proptest!(|(entries in field_entries())| {
        let mut fields = FieldSet::new();
        for (name, value) in &entries {
            fields.push(name.clone(), *value);
        }

        let set = sql_for_partial_update(fields, &MAPPED).unwrap();

        let expected_values: Vec<SqlValue> =
            entries.iter().map(|(_, v)| SqlValue::from(*v)).collect();
        prop_assert_eq!(&set.values, &expected_values);

        let fragments: Vec<&str> = set.clause.split(", ").collect();
        prop_assert_eq!(fragments.len(), entries.len());
        for (idx, ((name, _), fragment)) in entries.iter().zip(fragments).enumerate() {
            let expected = format!("{}=${}", quote_ident(MAPPED.column(name)), idx + 1);
            prop_assert_eq!(fragment, expected.as_str());
        }
        prop_assert_eq!(set.next_placeholder(), entries.len() + 1);
    });
}

// An empty field set is always rejected, whatever the column map
#[test]
fn test_empty_field_set_is_bad_request() {
    for map in [ColumnMap::new(&[]), MAPPED, ColumnMap::new(&[("a", "a_col")])] {
        let result = sql_for_partial_update(FieldSet::new(), &map);
        assert_eq!(result.unwrap_err(), AppError::BadRequest("No data".to_string()));
    }
}

// hasEquity=false never narrows the result compared to leaving it out
#[test]
fn property_has_equity_false_equals_absent() {
    proptest!(|(
        title in prop::option::of("[a-zA-Z ]{0,12}"),
        min_salary in prop::option::of(0..200_000i32),
    )| {
        let absent = JobFilter { title: title.clone(), min_salary, has_equity: None };
        let explicit_false = JobFilter { title, min_salary, has_equity: Some(false) };
        prop_assert_eq!(absent.where_clause(), explicit_false.where_clause());
    });
}

// Every placeholder in the WHERE clause has exactly one value
#[test]
fn property_job_filter_placeholders_match_values() {
    proptest!(|(
        title in prop::option::of("[a-z]{1,12}"),
        min_salary in prop::option::of(0..200_000i32),
        has_equity in prop::option::of(any::<bool>()),
    )| {
        let clause = JobFilter { title, min_salary, has_equity }.where_clause();
        let placeholders = clause.sql.matches('$').count();
        prop_assert_eq!(placeholders, clause.values.len());
        prop_assert_eq!(clause.sql.contains("equity > 0"), has_equity == Some(true));
    });
}

#[test]
fn test_two_fields_with_fallback() {
    let fields = FieldSet::new().with("a", 1).with("b", 2);
    let set = sql_for_partial_update(fields, &ColumnMap::new(&[("a", "a_col")])).unwrap();
    assert_eq!(set.clause, r#""a_col"=$1, "b"=$2"#);
    assert_eq!(set.values, vec![SqlValue::from(1), SqlValue::from(2)]);
}
