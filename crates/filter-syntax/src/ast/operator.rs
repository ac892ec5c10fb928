use crate::error::FilterError;
use chrono::NaiveDate;
use model::core::{utils::parse_date, value::Value};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, str::FromStr};

/// How a node folds into the result accumulated from its earlier siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Combinator {
    And,
    Or,
}

impl FromStr for Combinator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(Combinator::And),
            "or" => Ok(Combinator::Or),
            _ => Err(FilterError::InvalidCombinator(s.to_string())),
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::And => write!(f, "and"),
            Combinator::Or => write!(f, "or"),
        }
    }
}

/// The `prefix` key of a node as sent. Text that is not a combinator is
/// kept, and only rejected if the node is actually folded into a result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Prefix {
    Known(Combinator),
    Unknown(String),
}

impl Prefix {
    pub fn from_wire(raw: &str) -> Self {
        raw.parse()
            .map(Prefix::Known)
            .unwrap_or_else(|_| Prefix::Unknown(raw.to_string()))
    }

    pub fn combinator(&self) -> Result<Combinator, FilterError> {
        match self {
            Prefix::Known(combinator) => Ok(*combinator),
            Prefix::Unknown(raw) => Err(FilterError::InvalidCombinator(raw.clone())),
        }
    }
}

impl From<Combinator> for Prefix {
    fn from(combinator: Combinator) -> Self {
        Prefix::Known(combinator)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Known(combinator) => combinator.fmt(f),
            Prefix::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// Node kind, the `mode` key on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Condition,
    Group,
    In,
    Date,
}

impl FromStr for Mode {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "condition" => Ok(Mode::Condition),
            "group" => Ok(Mode::Group),
            "in" => Ok(Mode::In),
            "date" => Ok(Mode::Date),
            _ => Err(FilterError::UnsupportedMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Condition => write!(f, "condition"),
            Mode::Group => write!(f, "group"),
            Mode::In => write!(f, "in"),
            Mode::Date => write!(f, "date"),
        }
    }
}

/// Plain ordering comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparison {
    /// Whether `left <op> right` holds given how `left` orders against `right`.
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::Ne => ordering != Ordering::Equal,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Ge => ordering != Ordering::Less,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Le => ordering != Ordering::Greater,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Eq => write!(f, "="),
            Comparison::Ne => write!(f, "!="),
            Comparison::Gt => write!(f, ">"),
            Comparison::Ge => write!(f, ">="),
            Comparison::Lt => write!(f, "<"),
            Comparison::Le => write!(f, "<="),
        }
    }
}

/// Operator of a `condition` node, the `type` key on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    IsNull,
    IsNotNull,
}

impl Operator {
    pub fn comparison(&self) -> Option<Comparison> {
        match self {
            Operator::Eq => Some(Comparison::Eq),
            Operator::Ne => Some(Comparison::Ne),
            Operator::Gt => Some(Comparison::Gt),
            Operator::Ge => Some(Comparison::Ge),
            Operator::Lt => Some(Comparison::Lt),
            Operator::Le => Some(Comparison::Le),
            _ => None,
        }
    }

    /// Null checks ignore the node's `value`.
    pub fn takes_value(&self) -> bool {
        !matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

impl FromStr for Operator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eq" => Ok(Operator::Eq),
            "ne" => Ok(Operator::Ne),
            "gt" => Ok(Operator::Gt),
            "ge" => Ok(Operator::Ge),
            "lt" => Ok(Operator::Lt),
            "le" => Ok(Operator::Le),
            "contain" | "contains" => Ok(Operator::Contains),
            "notcontain" | "not_contains" | "notcontains" => Ok(Operator::NotContains),
            "start" | "starts_with" | "startswith" => Ok(Operator::StartsWith),
            "end" | "ends_with" | "endswith" => Ok(Operator::EndsWith),
            "null" | "is_null" | "isnull" => Ok(Operator::IsNull),
            "notnull" | "is_not_null" | "not_null" | "isnotnull" => Ok(Operator::IsNotNull),
            _ => Err(FilterError::UnsupportedOperator(s.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Contains => "contain",
            Operator::NotContains => "notContain",
            Operator::StartsWith => "start",
            Operator::EndsWith => "end",
            Operator::IsNull => "null",
            Operator::IsNotNull => "notNull",
        };
        write!(f, "{token}")
    }
}

/// Relative or absolute day window of a `date` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateMode {
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    ThisYear,
    Specific(NaiveDate),
    All,
}

impl DateMode {
    /// Reads the wire `type` token, taking the day from `value` for
    /// `specific`.
    pub fn from_wire(kind: &str, value: Option<&Value>) -> Result<Self, FilterError> {
        match kind.to_ascii_lowercase().as_str() {
            "yesterday" => Ok(DateMode::Yesterday),
            "thisweek" | "this_week" => Ok(DateMode::ThisWeek),
            "lastweek" | "last_week" => Ok(DateMode::LastWeek),
            "thismonth" | "this_month" => Ok(DateMode::ThisMonth),
            "thisyear" | "this_year" => Ok(DateMode::ThisYear),
            "all" => Ok(DateMode::All),
            "specific" => {
                let raw = value.and_then(Value::as_string).ok_or_else(|| {
                    FilterError::MalformedPayload("specific date filter is missing 'value'".into())
                })?;
                parse_date(&raw).map(DateMode::Specific).ok_or_else(|| {
                    FilterError::MalformedPayload(format!("invalid date '{raw}'"))
                })
            }
            _ => Err(FilterError::UnsupportedDateMode(kind.to_string())),
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            DateMode::Yesterday => "yesterday",
            DateMode::ThisWeek => "thisWeek",
            DateMode::LastWeek => "lastWeek",
            DateMode::ThisMonth => "thisMonth",
            DateMode::ThisYear => "thisYear",
            DateMode::Specific(_) => "specific",
            DateMode::All => "all",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_tokens() {
        for token in [
            "eq", "ne", "gt", "ge", "lt", "le", "contain", "notContain", "start", "end", "null",
            "notNull",
        ] {
            let op: Operator = token.parse().unwrap();
            assert_eq!(op.to_string(), token);
        }
    }

    #[test]
    fn test_operator_aliases() {
        assert_eq!("contains".parse::<Operator>(), Ok(Operator::Contains));
        assert_eq!("not_contains".parse::<Operator>(), Ok(Operator::NotContains));
        assert_eq!("starts_with".parse::<Operator>(), Ok(Operator::StartsWith));
        assert_eq!("ends_with".parse::<Operator>(), Ok(Operator::EndsWith));
        assert_eq!("is_null".parse::<Operator>(), Ok(Operator::IsNull));
        assert_eq!("is_not_null".parse::<Operator>(), Ok(Operator::IsNotNull));
        assert_eq!(
            "like".parse::<Operator>(),
            Err(FilterError::UnsupportedOperator("like".into()))
        );
    }

    #[test]
    fn test_combinator_parse() {
        assert_eq!("AND".parse::<Combinator>(), Ok(Combinator::And));
        assert_eq!("or".parse::<Combinator>(), Ok(Combinator::Or));
        assert_eq!(
            "xor".parse::<Combinator>(),
            Err(FilterError::InvalidCombinator("xor".into()))
        );
    }

    #[test]
    fn test_comparison_holds() {
        assert!(Comparison::Ge.holds(Ordering::Equal));
        assert!(Comparison::Ge.holds(Ordering::Greater));
        assert!(!Comparison::Lt.holds(Ordering::Equal));
        assert!(Comparison::Ne.holds(Ordering::Less));
    }

    #[test]
    fn test_date_mode_specific() {
        let mode = DateMode::from_wire("specific", Some(&Value::from("2024-03-15"))).unwrap();
        assert_eq!(
            mode,
            DateMode::Specific(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
        );
        assert!(matches!(
            DateMode::from_wire("specific", None),
            Err(FilterError::MalformedPayload(_))
        ));
        assert!(matches!(
            DateMode::from_wire("specific", Some(&Value::from("soon"))),
            Err(FilterError::MalformedPayload(_))
        ));
        assert_eq!(
            DateMode::from_wire("decade", None),
            Err(FilterError::UnsupportedDateMode("decade".into()))
        );
    }
}
