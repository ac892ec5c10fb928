use crate::ast::operator::{Combinator, DateMode, Mode, Operator, Prefix};
use model::core::value::Value;

/// One node of a filter tree together with the prefix that joins it to its
/// earlier siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterNode {
    /// Only read when the node is folded into an existing result.
    pub prefix: Option<Prefix>,
    pub expr: FilterExpr,
    /// Keys the client sent that the filter itself does not read.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    Condition {
        field: String,
        operator: Operator,
        value: Value,
    },
    Group {
        children: Vec<FilterNode>,
    },
    In {
        field: String,
        values: Vec<Value>,
    },
    Date {
        field: String,
        mode: DateMode,
    },
}

impl FilterExpr {
    pub fn mode(&self) -> Mode {
        match self {
            FilterExpr::Condition { .. } => Mode::Condition,
            FilterExpr::Group { .. } => Mode::Group,
            FilterExpr::In { .. } => Mode::In,
            FilterExpr::Date { .. } => Mode::Date,
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            FilterExpr::Condition { field, .. }
            | FilterExpr::In { field, .. }
            | FilterExpr::Date { field, .. } => Some(field),
            FilterExpr::Group { .. } => None,
        }
    }
}

impl FilterNode {
    pub fn new(expr: FilterExpr) -> Self {
        Self {
            prefix: None,
            expr,
            extra: serde_json::Map::new(),
        }
    }

    pub fn condition(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self::new(FilterExpr::Condition {
            field: field.into(),
            operator,
            value: value.into(),
        })
    }

    pub fn group(children: Vec<FilterNode>) -> Self {
        Self::new(FilterExpr::Group { children })
    }

    pub fn in_values(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(FilterExpr::In {
            field: field.into(),
            values,
        })
    }

    pub fn date(field: impl Into<String>, mode: DateMode) -> Self {
        Self::new(FilterExpr::Date {
            field: field.into(),
            mode,
        })
    }

    pub fn joined_by(mut self, combinator: Combinator) -> Self {
        self.prefix = Some(Prefix::Known(combinator));
        self
    }

    /// The recognised combinator, if the node carries one.
    pub fn combinator(&self) -> Option<Combinator> {
        match &self.prefix {
            Some(Prefix::Known(combinator)) => Some(*combinator),
            _ => None,
        }
    }

    /// Shorthand for `joined_by(Combinator::And)`.
    pub fn and(self) -> Self {
        self.joined_by(Combinator::And)
    }

    /// Shorthand for `joined_by(Combinator::Or)`.
    pub fn or(self) -> Self {
        self.joined_by(Combinator::Or)
    }

    pub fn mode(&self) -> Mode {
        self.expr.mode()
    }

    /// Every field name referenced by this node and its descendants.
    pub fn fields(&self) -> Vec<&str> {
        match &self.expr {
            FilterExpr::Group { children } => children.iter().flat_map(|c| c.fields()).collect(),
            expr => expr.field().into_iter().collect(),
        }
    }
}
