//! The contract between the evaluator and whatever executes the predicate.

use crate::date_range::DateRange;
use filter_syntax::{Comparison, Result};
use model::core::value::Value;

pub mod memory;
pub mod sql;

/// Field resolution plus the predicate constructors the evaluator needs.
///
/// The evaluator never inspects a `Condition`; it only composes them.
pub trait FilterBackend {
    /// A resolved, backend-native handle for a filterable field.
    type Field;

    type Condition;

    /// Fails with `FilterError::UnknownField` for names the backend does not
    /// expose.
    fn resolve_field(&self, name: &str) -> Result<Self::Field>;

    fn compare(&self, field: &Self::Field, op: Comparison, value: &Value) -> Self::Condition;

    fn like(&self, field: &Self::Field, pattern: &LikePattern) -> Self::Condition;

    /// `IS NULL`, or `IS NOT NULL` when `negated`.
    fn is_null(&self, field: &Self::Field, negated: bool) -> Self::Condition;

    fn in_values(&self, field: &Self::Field, values: &[Value]) -> Self::Condition;

    /// A predicate that matches every row, or none.
    fn constant(&self, value: bool) -> Self::Condition;

    fn not(&self, condition: Self::Condition) -> Self::Condition;

    fn and(&self, left: Self::Condition, right: Self::Condition) -> Self::Condition;

    fn or(&self, left: Self::Condition, right: Self::Condition) -> Self::Condition;

    /// `field >= start AND field < end`.
    fn range(&self, field: &Self::Field, range: &DateRange) -> Self::Condition {
        let lower = self.compare(field, Comparison::Ge, &Value::TimestampNaive(range.start));
        let upper = self.compare(field, Comparison::Lt, &Value::TimestampNaive(range.end));
        self.and(lower, upper)
    }
}

/// A wildcard match anchored the way the widget's text operators ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikePattern {
    Contains(String),
    StartsWith(String),
    EndsWith(String),
}

impl LikePattern {
    pub fn needle(&self) -> &str {
        match self {
            LikePattern::Contains(s) | LikePattern::StartsWith(s) | LikePattern::EndsWith(s) => s,
        }
    }

    /// The SQL `LIKE` pattern. Wildcards typed by the user are escaped with a
    /// backslash so they match literally.
    pub fn to_sql(&self) -> String {
        let escaped = escape_like(self.needle());
        match self {
            LikePattern::Contains(_) => format!("%{escaped}%"),
            LikePattern::StartsWith(_) => format!("{escaped}%"),
            LikePattern::EndsWith(_) => format!("%{escaped}"),
        }
    }

    /// Case-sensitive match against a plain string.
    pub fn matches(&self, haystack: &str) -> bool {
        match self {
            LikePattern::Contains(s) => haystack.contains(s.as_str()),
            LikePattern::StartsWith(s) => haystack.starts_with(s.as_str()),
            LikePattern::EndsWith(s) => haystack.ends_with(s.as_str()),
        }
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
