//! Evaluates filter trees against in-memory [`Record`]s.
//!
//! Predicates follow SQL's three-valued logic so that a tree selects the same
//! records here as it would rows through the SQL backend: any comparison
//! against a missing or null field is unknown, and unknown never matches.

use crate::{
    backend::{FilterBackend, LikePattern},
    date_range::DateRange,
};
use chrono_tz::Tz;
use filter_syntax::{Comparison, FilterError, Result};
use model::{core::value::Value, records::row::Record};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum RecordPredicate {
    Constant(bool),
    Compare {
        field: String,
        op: Comparison,
        value: Value,
    },
    Like {
        field: String,
        pattern: LikePattern,
    },
    IsNull {
        field: String,
        negated: bool,
    },
    In {
        field: String,
        values: Vec<Value>,
    },
    /// `field` read as wall-clock time in `timezone` falls inside `range`.
    Within {
        field: String,
        range: DateRange,
        timezone: Tz,
    },
    Not(Box<RecordPredicate>),
    And(Vec<RecordPredicate>),
    Or(Vec<RecordPredicate>),
}

impl RecordPredicate {
    /// `Some(true)` / `Some(false)`, or `None` when the outcome is unknown.
    pub fn eval(&self, record: &Record) -> Option<bool> {
        match self {
            RecordPredicate::Constant(b) => Some(*b),
            RecordPredicate::Compare { field, op, value } => {
                let actual = record.get_value(field);
                if actual.is_null() || value.is_null() {
                    return None;
                }
                Some(actual.compare(value).is_some_and(|o| op.holds(o)))
            }
            RecordPredicate::Like { field, pattern } => {
                let actual = record.get_value(field).as_string()?;
                Some(pattern.matches(&actual))
            }
            RecordPredicate::IsNull { field, negated } => {
                Some(record.get_value(field).is_null() != *negated)
            }
            RecordPredicate::In { field, values } => {
                let actual = record.get_value(field);
                if actual.is_null() {
                    return None;
                }
                let mut unknown = false;
                for candidate in values {
                    if candidate.is_null() {
                        unknown = true;
                    } else if actual.compare(candidate) == Some(Ordering::Equal) {
                        return Some(true);
                    }
                }
                if unknown { None } else { Some(false) }
            }
            RecordPredicate::Within {
                field,
                range,
                timezone,
            } => {
                let local = record.get_value(field).as_local_datetime(timezone)?;
                Some(range.contains(local))
            }
            RecordPredicate::Not(inner) => inner.eval(record).map(|b| !b),
            RecordPredicate::And(children) => {
                let mut outcome = Some(true);
                for child in children {
                    match child.eval(record) {
                        Some(false) => return Some(false),
                        None => outcome = None,
                        Some(true) => {}
                    }
                }
                outcome
            }
            RecordPredicate::Or(children) => {
                let mut outcome = Some(false);
                for child in children {
                    match child.eval(record) {
                        Some(true) => return Some(true),
                        None => outcome = None,
                        Some(false) => {}
                    }
                }
                outcome
            }
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.eval(record) == Some(true)
    }

    /// Keeps the records the predicate selects, in their original order.
    pub fn filter<'r>(&self, records: &'r [Record]) -> Vec<&'r Record> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Resolves fields against a fixed set of names. Offset-aware timestamps
/// are read in `timezone` before date windows are applied.
#[derive(Debug, Clone)]
pub struct RecordFilterBackend {
    fields: Vec<String>,
    timezone: Tz,
}

impl RecordFilterBackend {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            timezone: Tz::UTC,
        }
    }

    /// Usually the evaluator's `FilterSettings::timezone`.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Every field name that appears in at least one record.
    pub fn from_records(records: &[Record]) -> Self {
        let mut fields: Vec<String> = Vec::new();
        for name in records.iter().flat_map(|r| r.field_names()) {
            if !fields.iter().any(|f| f == name) {
                fields.push(name.to_string());
            }
        }
        Self::new(fields)
    }
}

impl FilterBackend for RecordFilterBackend {
    type Field = String;
    type Condition = RecordPredicate;

    fn resolve_field(&self, name: &str) -> Result<String> {
        self.fields
            .iter()
            .find(|f| f.as_str() == name)
            .cloned()
            .ok_or_else(|| FilterError::UnknownField(name.to_string()))
    }

    fn compare(&self, field: &String, op: Comparison, value: &Value) -> RecordPredicate {
        RecordPredicate::Compare {
            field: field.clone(),
            op,
            value: value.clone(),
        }
    }

    fn like(&self, field: &String, pattern: &LikePattern) -> RecordPredicate {
        RecordPredicate::Like {
            field: field.clone(),
            pattern: pattern.clone(),
        }
    }

    fn is_null(&self, field: &String, negated: bool) -> RecordPredicate {
        RecordPredicate::IsNull {
            field: field.clone(),
            negated,
        }
    }

    fn in_values(&self, field: &String, values: &[Value]) -> RecordPredicate {
        RecordPredicate::In {
            field: field.clone(),
            values: values.to_vec(),
        }
    }

    fn constant(&self, value: bool) -> RecordPredicate {
        RecordPredicate::Constant(value)
    }

    fn range(&self, field: &String, range: &DateRange) -> RecordPredicate {
        RecordPredicate::Within {
            field: field.clone(),
            range: *range,
            timezone: self.timezone,
        }
    }

    fn not(&self, condition: RecordPredicate) -> RecordPredicate {
        match condition {
            RecordPredicate::Not(inner) => *inner,
            other => RecordPredicate::Not(Box::new(other)),
        }
    }

    fn and(&self, left: RecordPredicate, right: RecordPredicate) -> RecordPredicate {
        match left {
            RecordPredicate::And(mut children) => {
                children.push(right);
                RecordPredicate::And(children)
            }
            left => RecordPredicate::And(vec![left, right]),
        }
    }

    fn or(&self, left: RecordPredicate, right: RecordPredicate) -> RecordPredicate {
        match left {
            RecordPredicate::Or(mut children) => {
                children.push(right);
                RecordPredicate::Or(children)
            }
            left => RecordPredicate::Or(vec![left, right]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(json: serde_json::Value) -> Record {
        Record::from_json("users", &json).unwrap()
    }

    #[test]
    fn test_compare_coerces_loosely() {
        let pred = RecordPredicate::Compare {
            field: "age".into(),
            op: Comparison::Ge,
            value: Value::from("18"),
        };
        assert!(pred.matches(&record(json!({"age": 21}))));
        assert!(!pred.matches(&record(json!({"age": 17}))));
    }

    #[test]
    fn test_null_comparisons_are_unknown() {
        let ne = RecordPredicate::Compare {
            field: "age".into(),
            op: Comparison::Ne,
            value: Value::Int(18),
        };
        let row = record(json!({"age": null}));
        assert_eq!(ne.eval(&row), None);
        assert_eq!(RecordPredicate::Not(Box::new(ne)).eval(&row), None);
    }

    #[test]
    fn test_three_valued_connectives() {
        let unknown = RecordPredicate::Compare {
            field: "missing".into(),
            op: Comparison::Eq,
            value: Value::Int(1),
        };
        let row = record(json!({"a": 1}));

        let and = RecordPredicate::And(vec![unknown.clone(), RecordPredicate::Constant(false)]);
        assert_eq!(and.eval(&row), Some(false));

        let or = RecordPredicate::Or(vec![unknown.clone(), RecordPredicate::Constant(true)]);
        assert_eq!(or.eval(&row), Some(true));

        let or = RecordPredicate::Or(vec![unknown, RecordPredicate::Constant(false)]);
        assert_eq!(or.eval(&row), None);
    }

    #[test]
    fn test_in_membership() {
        let pred = RecordPredicate::In {
            field: "status".into(),
            values: vec![Value::Int(1), Value::Int(2)],
        };
        assert!(pred.matches(&record(json!({"status": "2"}))));
        assert!(!pred.matches(&record(json!({"status": 3}))));

        let empty = RecordPredicate::In {
            field: "status".into(),
            values: vec![],
        };
        assert_eq!(empty.eval(&record(json!({"status": 1}))), Some(false));
    }

    #[test]
    fn test_date_window_reads_offsets_in_timezone() {
        let day = chrono::NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();
        let range = DateRange::days(day, day.succ_opt().unwrap());
        let backend = RecordFilterBackend::new(["at"]).with_timezone(chrono_tz::Europe::Berlin);
        let pred = backend.range(&"at".to_string(), &range);

        // 23:30 UTC on the 15th is already the 16th in Berlin.
        assert!(pred.matches(&record(json!({"at": "2024-03-15T23:30:00Z"}))));
        assert!(!pred.matches(&record(json!({"at": "2024-03-16T23:30:00Z"}))));
        assert!(pred.matches(&record(json!({"at": "2024-03-16 23:30:00"}))));
        assert_eq!(pred.eval(&record(json!({"at": null}))), None);

        let utc = RecordFilterBackend::new(["at"]).range(&"at".to_string(), &range);
        assert!(!utc.matches(&record(json!({"at": "2024-03-15T23:30:00Z"}))));
    }

    #[test]
    fn test_backend_flattens_connectives() {
        let backend = RecordFilterBackend::new(["a"]);
        let t = backend.constant(true);
        let combined = backend.and(backend.and(t.clone(), t.clone()), t.clone());
        assert_eq!(combined, RecordPredicate::And(vec![t.clone(), t.clone(), t]));
    }

    #[test]
    fn test_from_records_collects_fields() {
        let backend = RecordFilterBackend::from_records(&[
            record(json!({"a": 1, "b": 2})),
            record(json!({"b": 3, "c": 4})),
        ]);
        assert!(backend.resolve_field("c").is_ok());
        assert_eq!(
            backend.resolve_field("d").unwrap_err(),
            FilterError::UnknownField("d".into())
        );
    }
}
