use crate::core::utils::{parse_naive_datetime, parse_offset_datetime};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

/// A scalar carried by a filter payload, a record field or a query parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    TimestampNaive(NaiveDateTime),
    Null,
}

impl Value {
    /// Converts a JSON scalar into a `Value`. Arrays and objects are not
    /// scalars and yield `None`.
    pub fn from_json(json: &serde_json::Value) -> Option<Value> {
        match json {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Boolean(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Int(i)),
                None => n.as_f64().map(Value::Float),
            },
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(v) => serde_json::Value::String(v.clone()),
            Value::Boolean(v) => serde_json::Value::Bool(*v),
            Value::Date(v) => serde_json::Value::String(v.format("%Y-%m-%d").to_string()),
            Value::Timestamp(v) => serde_json::Value::String(v.to_rfc3339()),
            Value::TimestampNaive(v) => {
                serde_json::Value::String(v.format("%Y-%m-%d %H:%M:%S").to_string())
            }
            Value::Null => serde_json::Value::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn is_temporal(&self) -> bool {
        matches!(
            self,
            Value::Date(_) | Value::Timestamp(_) | Value::TimestampNaive(_)
        )
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(v) => v.trim().parse::<f64>().ok(),
            Value::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Date(_) | Value::Timestamp(_) | Value::TimestampNaive(_) | Value::Null => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Boolean(v) => Some(v.to_string()),
            Value::Date(v) => Some(v.format("%Y-%m-%d").to_string()),
            Value::Timestamp(v) => Some(v.to_rfc3339()),
            Value::TimestampNaive(v) => Some(v.format("%Y-%m-%d %H:%M:%S").to_string()),
            Value::Null => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Int(v) => Some(*v != 0),
            Value::Float(v) => Some(*v != 0.0),
            Value::String(v) => match v.to_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            Value::Boolean(v) => Some(*v),
            Value::Date(_) | Value::Timestamp(_) | Value::TimestampNaive(_) | Value::Null => None,
        }
    }

    pub fn as_naive_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(d.and_time(NaiveTime::MIN)),
            Value::Timestamp(ts) => Some(ts.naive_utc()),
            Value::TimestampNaive(ts) => Some(*ts),
            Value::String(s) => parse_naive_datetime(s),
            _ => None,
        }
    }

    /// Wall-clock time in `tz`. Offset-aware values are converted, naive
    /// ones are taken to be local already.
    pub fn as_local_datetime<Z: TimeZone>(&self, tz: &Z) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(ts.with_timezone(tz).naive_local()),
            Value::String(s) => match parse_offset_datetime(s) {
                Some(ts) => Some(ts.with_timezone(tz).naive_local()),
                None => parse_naive_datetime(s),
            },
            other => other.as_naive_datetime(),
        }
    }

    /// Orders two values, coercing across representations the way clients
    /// send them: numeric strings against numbers, date strings against
    /// temporal values. `Null` is never comparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Null, _) | (_, Null) => None,
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (String(a), String(b)) => Some(a.cmp(b)),
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (Timestamp(a), Timestamp(b)) => Some(a.cmp(b)),
            _ if self.is_temporal() || other.is_temporal() => self
                .as_naive_datetime()?
                .partial_cmp(&other.as_naive_datetime()?),
            _ if self.is_numeric() || other.is_numeric() => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (Boolean(_), _) | (_, Boolean(_)) => Some(self.as_bool()?.cmp(&other.as_bool()?)),
            _ => None,
        }
    }

    pub fn equal(&self, other: &Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "'{s}'"),
            Value::Null => write!(f, "NULL"),
            other => match other.as_string() {
                Some(s) => write!(f, "{s}"),
                None => write!(f, "NULL"),
            },
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::TimestampNaive(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(Value::from_json(&json!(3)), Some(Value::Int(3)));
        assert_eq!(Value::from_json(&json!(1.5)), Some(Value::Float(1.5)));
        assert_eq!(Value::from_json(&json!("a")), Some(Value::from("a")));
        assert_eq!(Value::from_json(&json!(null)), Some(Value::Null));
        assert_eq!(Value::from_json(&json!([1, 2])), None);
        assert_eq!(Value::from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn test_compare_numeric_string() {
        let n = Value::Int(10);
        assert_eq!(n.compare(&Value::from("10")), Some(Ordering::Equal));
        assert_eq!(n.compare(&Value::from("9.5")), Some(Ordering::Greater));
        assert_eq!(n.compare(&Value::from("abc")), None);
    }

    #[test]
    fn test_as_local_datetime_converts_offsets() {
        let berlin_winter = chrono::FixedOffset::east_opt(3600).unwrap();
        let local = |h, m| {
            NaiveDate::from_ymd_opt(2024, 3, 16)
                .unwrap()
                .and_hms_opt(h, m, 0)
        };

        let utc = Value::from("2024-03-15T23:30:00Z");
        assert_eq!(utc.as_local_datetime(&berlin_winter), local(0, 30));

        let ts = Utc.with_ymd_and_hms(2024, 3, 15, 23, 30, 0).unwrap();
        assert_eq!(Value::Timestamp(ts).as_local_datetime(&berlin_winter), local(0, 30));

        // Naive values are already wall-clock time.
        let naive = Value::from("2024-03-16 00:30:00");
        assert_eq!(naive.as_local_datetime(&berlin_winter), local(0, 30));
        assert_eq!(Value::Null.as_local_datetime(&berlin_winter), None);
    }

    #[test]
    fn test_compare_temporal_string() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let v = Value::TimestampNaive(ts);
        assert_eq!(
            Value::from("2024-03-15 12:00:00").compare(&v),
            Some(Ordering::Equal)
        );
        assert_eq!(Value::from("2024-03-15").compare(&v), Some(Ordering::Less));
    }

    #[test]
    fn test_null_never_equal() {
        assert!(!Value::Null.equal(&Value::Null));
        assert!(!Value::Null.equal(&Value::Int(0)));
    }
}
