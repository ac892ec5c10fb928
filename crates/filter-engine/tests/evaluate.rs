//! End-to-end evaluation of `filterSos` payloads through both backends.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use filter_engine::{
    FilterError, FilterSettings, RecordFilterBackend, SqlFilterBackend, TableSchema, evaluate,
    evaluate_payload,
};
use filter_syntax::{encoder::to_json_string, parser::parse};
use model::{core::value::Value, records::row::Record};
use planner::query::{
    dialect::{MySql, Postgres},
    renderer::{Statement, render},
};
use serde_json::json;

/// Friday 2024-03-15, mid-day.
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 0).unwrap()
}

fn midnight(y: i32, m: u32, d: u32) -> Value {
    Value::TimestampNaive(day(y, m, d))
}

fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn schema() -> TableSchema {
    TableSchema::with_columns("orders", &["id", "name", "status", "amount", "created_at"])
        .field("a", "col_a")
        .field("b", "col_b")
        .field("c", "col_c")
}

fn compile(payload: &str) -> Result<Option<Statement>, FilterError> {
    let schema = schema();
    let backend = SqlFilterBackend::new(&schema);
    let expr = evaluate_payload(payload, &backend, now(), FilterSettings::default())?;
    Ok(expr.map(|e| render(&e, &Postgres)))
}

fn records() -> Vec<Record> {
    [
        json!({"id": 1, "name": "alice", "status": 1, "amount": 10.5, "created_at": "2024-03-15 09:00:00"}),
        json!({"id": 2, "name": "bob", "status": 2, "amount": 99, "created_at": "2024-03-09 23:59:59"}),
        json!({"id": 3, "name": "carol", "status": 3, "amount": null, "created_at": "2024-03-10 00:00:00"}),
        json!({"id": 4, "name": "100%_real", "status": 4, "amount": 0, "created_at": "2024-02-29 12:00:00"}),
        json!({"id": 5, "name": null, "status": null, "amount": 42, "created_at": null}),
    ]
    .iter()
    .map(|j| Record::from_json("orders", j).unwrap())
    .collect()
}

fn matching_ids(payload: &str) -> Vec<i64> {
    let rows = records();
    let backend = RecordFilterBackend::from_records(&rows);
    let predicate = evaluate_payload(payload, &backend, now(), FilterSettings::default()).unwrap();
    match predicate {
        Some(p) => p.filter(&rows),
        None => rows.iter().collect(),
    }
    .into_iter()
    .filter_map(|r| match r.get_value("id") {
        Value::Int(id) => Some(id),
        _ => None,
    })
    .collect()
}

#[test]
fn test_empty_tree_is_none() {
    assert_eq!(compile("[]").unwrap(), None);
}

#[test]
fn test_all_no_op_tree_is_none() {
    let payload = r#"[
        {"mode": "date", "field": "created_at", "type": "all"},
        {"prefix": "and", "mode": "group", "children": [
            {"mode": "date", "field": "created_at", "type": "all"}
        ]}
    ]"#;
    assert_eq!(compile(payload).unwrap(), None);
}

#[test]
fn test_single_eq() {
    let stmt = compile(r#"[{"mode": "condition", "field": "a", "type": "eq", "value": 1}]"#)
        .unwrap()
        .unwrap();
    assert_eq!(stmt.sql, r#""col_a" = $1"#);
    assert_eq!(stmt.params, vec![Value::Int(1)]);
}

#[test]
fn test_left_to_right_fold_without_precedence() {
    // a=1 AND b=2 OR c=3 folds to (a=1 AND b=2) OR c=3.
    let payload = r#"[
        {"mode": "condition", "field": "a", "type": "eq", "value": 1},
        {"prefix": "and", "mode": "condition", "field": "b", "type": "eq", "value": 2},
        {"prefix": "or", "mode": "condition", "field": "c", "type": "eq", "value": 3}
    ]"#;
    let stmt = compile(payload).unwrap().unwrap();
    assert_eq!(stmt.sql, r#"(("col_a" = $1 AND "col_b" = $2) OR "col_c" = $3)"#);
    assert_eq!(stmt.params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_group_parenthesizes() {
    let payload = r#"[
        {"mode": "condition", "field": "a", "type": "eq", "value": 1},
        {"prefix": "and", "mode": "group", "children": [
            {"mode": "condition", "field": "b", "type": "eq", "value": 2},
            {"prefix": "or", "mode": "condition", "field": "c", "type": "eq", "value": 3}
        ]}
    ]"#;
    let stmt = compile(payload).unwrap().unwrap();
    assert_eq!(stmt.sql, r#"("col_a" = $1 AND ("col_b" = $2 OR "col_c" = $3))"#);
}

#[test]
fn test_in_membership() {
    let stmt = compile(r#"[{"mode": "in", "field": "status", "values": [1, 2, 3]}]"#)
        .unwrap()
        .unwrap();
    assert_eq!(stmt.sql, r#""status" IN ($1, $2, $3)"#);
    assert_eq!(stmt.params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);

    assert_eq!(
        matching_ids(r#"[{"mode": "in", "field": "status", "values": [1, 2, 3]}]"#),
        vec![1, 2, 3]
    );
}

#[test]
fn test_empty_in_matches_nothing() {
    let payload = r#"[{"mode": "in", "field": "status", "values": []}]"#;
    assert_eq!(compile(payload).unwrap().unwrap().sql, "FALSE");
    assert!(matching_ids(payload).is_empty());
}

#[test]
fn test_specific_date_bounds() {
    let payload =
        r#"[{"mode": "date", "field": "created_at", "type": "specific", "value": "2024-03-15"}]"#;
    let stmt = compile(payload).unwrap().unwrap();
    assert_eq!(stmt.sql, r#"("created_at" >= $1 AND "created_at" < $2)"#);
    assert_eq!(stmt.params, vec![midnight(2024, 3, 15), midnight(2024, 3, 16)]);
    assert_eq!(matching_ids(payload), vec![1]);
}

#[test]
fn test_this_week_bounds() {
    let stmt = compile(r#"[{"mode": "date", "field": "created_at", "type": "thisWeek"}]"#)
        .unwrap()
        .unwrap();
    assert_eq!(stmt.params, vec![midnight(2024, 3, 10), midnight(2024, 3, 17)]);

    // The 9th ends the previous week; the 10th opens this one.
    assert_eq!(
        matching_ids(r#"[{"mode": "date", "field": "created_at", "type": "thisWeek"}]"#),
        vec![1, 3]
    );
    assert_eq!(
        matching_ids(r#"[{"mode": "date", "field": "created_at", "type": "lastWeek"}]"#),
        vec![2]
    );
}

#[test]
fn test_this_month_and_year() {
    assert_eq!(
        matching_ids(r#"[{"mode": "date", "field": "created_at", "type": "thisMonth"}]"#),
        vec![1, 2, 3]
    );
    assert_eq!(
        matching_ids(r#"[{"mode": "date", "field": "created_at", "type": "thisYear"}]"#),
        vec![1, 2, 3, 4]
    );
}

#[test]
fn test_text_operators() {
    let payload = r#"[{"mode": "condition", "field": "name", "type": "contain", "value": "%_"}]"#;
    let stmt = compile(payload).unwrap().unwrap();
    assert_eq!(stmt.sql, r#""name" LIKE $1"#);
    assert_eq!(stmt.params, vec![Value::from(r"%\%\_%")]);
    assert_eq!(matching_ids(payload), vec![4]);

    let payload = r#"[{"mode": "condition", "field": "name", "type": "notContain", "value": "o"}]"#;
    assert_eq!(compile(payload).unwrap().unwrap().sql, r#""name" NOT LIKE $1"#);
    // The null name is unknown, not a match.
    assert_eq!(matching_ids(payload), vec![1, 4]);

    assert_eq!(
        matching_ids(r#"[{"mode": "condition", "field": "name", "type": "start", "value": "ca"}]"#),
        vec![3]
    );
    assert_eq!(
        matching_ids(r#"[{"mode": "condition", "field": "name", "type": "end", "value": "ob"}]"#),
        vec![2]
    );
}

#[test]
fn test_null_checks() {
    let payload = r#"[{"mode": "condition", "field": "amount", "type": "null"}]"#;
    assert_eq!(compile(payload).unwrap().unwrap().sql, r#""amount" IS NULL"#);
    assert_eq!(matching_ids(payload), vec![3]);

    let payload = r#"[{"mode": "condition", "field": "amount", "type": "notNull"}]"#;
    assert_eq!(compile(payload).unwrap().unwrap().sql, r#""amount" IS NOT NULL"#);
    assert_eq!(matching_ids(payload), vec![1, 2, 4, 5]);
}

#[test]
fn test_comparisons_coerce_numbers() {
    assert_eq!(
        matching_ids(r#"[{"mode": "condition", "field": "amount", "type": "ge", "value": "10.5"}]"#),
        vec![1, 2, 5]
    );
    assert_eq!(
        matching_ids(r#"[{"mode": "condition", "field": "amount", "type": "ne", "value": 0}]"#),
        vec![1, 2, 5]
    );
}

#[test]
fn test_mysql_rendering() {
    let schema = schema();
    let backend = SqlFilterBackend::new(&schema);
    let payload = r#"[
        {"mode": "condition", "field": "name", "type": "eq", "value": "bob"},
        {"prefix": "or", "mode": "in", "field": "id", "values": [1, 2]}
    ]"#;
    let expr = evaluate_payload(payload, &backend, now(), FilterSettings::default())
        .unwrap()
        .unwrap();
    let stmt = render(&expr, &MySql);
    assert_eq!(stmt.sql, "(`name` = ? OR `id` IN (?, ?))");
    assert_eq!(stmt.params.len(), 3);
}

#[test]
fn test_errors_abort_the_whole_tree() {
    assert_eq!(
        compile(r#"[{"mode": "bogus", "field": "a"}]"#).unwrap_err(),
        FilterError::UnsupportedMode("bogus".into())
    );
    assert_eq!(
        compile(
            r#"[
                {"mode": "condition", "field": "a", "type": "eq", "value": 1},
                {"prefix": "and", "mode": "condition", "field": "zzz", "type": "eq", "value": 1}
            ]"#
        )
        .unwrap_err(),
        FilterError::UnknownField("zzz".into())
    );
}

#[test]
fn test_filter_applies_to_select() {
    let schema = TableSchema::with_columns("orders", &["id", "status"]);
    let backend = SqlFilterBackend::new(&schema);
    let nodes = parse(r#"[{"mode": "condition", "field": "status", "type": "gt", "value": 1}]"#)
        .unwrap();
    let condition = evaluate(&nodes, &backend, now(), FilterSettings::default()).unwrap();

    let select = schema.select().filter(condition).build();
    let stmt = render(&select, &Postgres);
    assert_eq!(stmt.sql, r#"SELECT "id", "status" FROM "orders" WHERE "status" > $1"#);

    let count = render(&select.to_count(), &Postgres);
    assert_eq!(count.sql, r#"SELECT COUNT(*) FROM "orders" WHERE "status" > $1"#);
}

#[test]
fn test_round_trip_selects_same_records() {
    let payload = r#"[
        {"mode": "condition", "field": "name", "type": "contain", "value": "o"},
        {"prefix": "or", "mode": "group", "children": [
            {"mode": "in", "field": "status", "values": [1, 4]},
            {"prefix": "and", "mode": "date", "field": "created_at", "type": "thisYear"}
        ]},
        {"prefix": "and", "mode": "condition", "field": "amount", "type": "notNull"}
    ]"#;
    let encoded = to_json_string(&parse(payload).unwrap()).unwrap();
    assert_eq!(matching_ids(payload), matching_ids(&encoded));
    assert_eq!(matching_ids(payload), vec![1, 2, 4]);
}

#[test]
fn test_offset_timestamps_follow_settings_timezone() {
    let rows: Vec<Record> = [
        json!({"id": 1, "at": "2024-03-14T23:30:00Z"}),
        json!({"id": 2, "at": "2024-03-15T23:30:00Z"}),
    ]
    .iter()
    .map(|j| Record::from_json("events", j).unwrap())
    .collect();
    let settings = FilterSettings::default().with_timezone(chrono_tz::Europe::Berlin);
    let backend = RecordFilterBackend::from_records(&rows).with_timezone(settings.timezone);

    let predicate = evaluate_payload(
        r#"[{"mode": "date", "field": "at", "type": "specific", "value": "2024-03-15"}]"#,
        &backend,
        now(),
        settings,
    )
    .unwrap()
    .unwrap();

    let ids: Vec<Value> = predicate.filter(&rows).iter().map(|r| r.get_value("id")).collect();
    assert_eq!(ids, vec![Value::Int(1)]);
}
