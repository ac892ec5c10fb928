//! Defines the core rendering trait and context for converting AST to SQL.

use crate::query::{ast::common::TableRef, dialect::Dialect};
use model::core::value::Value;
use serde::{Serialize, Serializer};

pub mod expr;
pub mod select;

/// A trait for any AST node that can be rendered into a SQL string.
pub trait Render {
    fn render(&self, renderer: &mut Renderer);
}

/// A context that holds the state during the rendering process.
///
/// It accumulates the SQL string and the parameters, and provides
/// access to the dialect for syntax-specific details.
pub struct Renderer<'a> {
    pub sql: String,
    pub params: Vec<Value>,
    pub dialect: &'a dyn Dialect,
}

/// A rendered statement together with the values bound to its placeholders,
/// in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub sql: String,
    /// Serialised as plain JSON scalars.
    #[serde(serialize_with = "params_as_json")]
    pub params: Vec<Value>,
}

fn params_as_json<S: Serializer>(params: &[Value], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(params.iter().map(Value::to_json))
}

impl<'a> Renderer<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            dialect,
        }
    }

    /// Consumes the renderer and returns the final SQL string and parameters.
    pub fn finish(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    pub fn add_param(&mut self, value: Value) {
        self.params.push(value);
        let placeholder = self.dialect.get_placeholder(self.params.len() - 1);
        self.sql.push_str(&placeholder);
    }

    pub fn render_table_ref(&mut self, table: &TableRef) {
        if let Some(schema) = &table.schema {
            self.sql.push_str(&self.dialect.quote_identifier(schema));
            self.sql.push('.');
        }
        self.sql.push_str(&self.dialect.quote_identifier(&table.name));
    }
}

/// Renders a single node with a fresh renderer.
pub fn render<R: Render + ?Sized>(node: &R, dialect: &dyn Dialect) -> Statement {
    let mut renderer = Renderer::new(dialect);
    node.render(&mut renderer);
    let (sql, params) = renderer.finish();
    Statement { sql, params }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{
        ast::expr::{BinaryOperator, Expr},
        dialect::Postgres,
        ident, value,
    };

    #[test]
    fn test_statement_serializes_plain_params() {
        let expr = Expr::binary(ident("name"), BinaryOperator::Eq, value(Value::from("ann")))
            .and(Expr::binary(ident("age"), BinaryOperator::Gt, value(Value::Int(30))));
        let statement = render(&expr, &Postgres);

        assert_eq!(
            serde_json::to_value(&statement).unwrap(),
            serde_json::json!({
                "sql": r#"("name" = $1 AND "age" > $2)"#,
                "params": ["ann", 30]
            })
        );
    }
}
