//! Expression nodes shared by every statement's AST.

use model::core::value::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column, optionally qualified by its table or alias.
    Identifier(Ident),

    /// A bound parameter.
    Value(Value),

    /// `TRUE` / `FALSE`, rendered inline.
    Boolean(bool),

    BinaryOp(Box<BinaryOp>),

    /// `expr [NOT] LIKE pattern`. The pattern is expected to escape its own
    /// wildcards with a backslash.
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },

    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },

    /// `expr [NOT] IN (...)`. An empty list is rendered as a constant.
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },

    Not(Box<Expr>),

    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },

    /// `*`
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub qualifier: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Expr,
    pub op: BinaryOperator,
    pub right: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "<>",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        };
        write!(f, "{op}")
    }
}

impl Expr {
    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp(Box::new(BinaryOp { left, op, right }))
    }

    pub fn and(self, other: Expr) -> Self {
        Expr::binary(self, BinaryOperator::And, other)
    }

    pub fn or(self, other: Expr) -> Self {
        Expr::binary(self, BinaryOperator::Or, other)
    }

    /// Negates the expression, folding the negation into nodes that carry
    /// their own `NOT` form.
    pub fn negate(self) -> Self {
        match self {
            Expr::Boolean(b) => Expr::Boolean(!b),
            Expr::Not(inner) => *inner,
            Expr::Like {
                expr,
                pattern,
                negated,
            } => Expr::Like {
                expr,
                pattern,
                negated: !negated,
            },
            Expr::IsNull { expr, negated } => Expr::IsNull {
                expr,
                negated: !negated,
            },
            Expr::InList {
                expr,
                list,
                negated,
            } => Expr::InList {
                expr,
                list,
                negated: !negated,
            },
            other => Expr::Not(Box::new(other)),
        }
    }

    pub fn count_all() -> Self {
        Expr::FunctionCall {
            name: "COUNT".to_string(),
            args: vec![Expr::Wildcard],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ident, value};

    #[test]
    fn test_negate_folds_into_node() {
        let like = Expr::Like {
            expr: Box::new(ident("name")),
            pattern: Box::new(value(Value::from("%a%"))),
            negated: false,
        };
        let Expr::Like { negated, .. } = like.negate() else {
            panic!("negated LIKE should stay a LIKE");
        };
        assert!(negated);

        assert_eq!(Expr::Boolean(true).negate(), Expr::Boolean(false));
    }

    #[test]
    fn test_double_negation_unwraps() {
        let cmp = Expr::binary(ident("a"), BinaryOperator::Gt, value(Value::Int(1)));
        assert_eq!(cmp.clone().negate().negate(), cmp);
    }
}
