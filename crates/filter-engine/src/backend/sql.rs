//! Compiles filter trees into planner SQL expressions over one table.

use crate::backend::{FilterBackend, LikePattern};
use filter_syntax::{Comparison, FilterError, Result};
use model::core::value::Value;
use planner::query::{
    ast::{
        common::TableRef,
        expr::{BinaryOperator, Expr, Ident},
    },
    builder::select::{FromState, SelectBuilder},
    value,
};
use planner::table_ref;

/// The filterable fields of a table and the columns they map to.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    table: TableRef,
    alias: Option<String>,
    /// `(field, column)` in declaration order.
    columns: Vec<(String, String)>,
}

impl TableSchema {
    pub fn new(table: &str) -> Self {
        Self {
            table: table_ref!(table),
            alias: None,
            columns: Vec::new(),
        }
    }

    pub fn with_columns(table: &str, columns: &[&str]) -> Self {
        columns
            .iter()
            .fold(Self::new(table), |schema, column| schema.column(column))
    }

    pub fn in_schema(mut self, schema: &str) -> Self {
        self.table.schema = Some(schema.to_string());
        self
    }

    /// Qualifies every column with `alias` and renders `FROM table AS alias`.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Exposes a column under its own name.
    pub fn column(self, name: &str) -> Self {
        self.field(name, name)
    }

    /// Exposes `column` under the filter field name `field`.
    pub fn field(mut self, field: &str, column: &str) -> Self {
        self.columns.retain(|(f, _)| f != field);
        self.columns.push((field.to_string(), column.to_string()));
        self
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn column_for(&self, field: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, c)| c.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(f, _)| f.as_str())
    }

    pub fn column_expr(&self, column: &str) -> Expr {
        Expr::Identifier(Ident {
            qualifier: self.alias.clone(),
            name: column.to_string(),
        })
    }

    /// `SELECT <every column> FROM <table>`, ready for filtering and paging.
    pub fn select(&self) -> SelectBuilder<FromState> {
        let columns = self
            .columns
            .iter()
            .map(|(_, column)| self.column_expr(column))
            .collect();
        SelectBuilder::new()
            .select(columns)
            .from(self.table.clone(), self.alias.as_deref())
    }
}

/// Produces [`Expr`] predicates; the caller renders them with a dialect.
#[derive(Debug, Clone, Copy)]
pub struct SqlFilterBackend<'a> {
    schema: &'a TableSchema,
}

impl<'a> SqlFilterBackend<'a> {
    pub fn new(schema: &'a TableSchema) -> Self {
        Self { schema }
    }
}

impl FilterBackend for SqlFilterBackend<'_> {
    type Field = Expr;
    type Condition = Expr;

    fn resolve_field(&self, name: &str) -> Result<Expr> {
        self.schema
            .column_for(name)
            .map(|column| self.schema.column_expr(column))
            .ok_or_else(|| FilterError::UnknownField(name.to_string()))
    }

    fn compare(&self, field: &Expr, op: Comparison, val: &Value) -> Expr {
        let op = match op {
            Comparison::Eq => BinaryOperator::Eq,
            Comparison::Ne => BinaryOperator::NotEq,
            Comparison::Gt => BinaryOperator::Gt,
            Comparison::Ge => BinaryOperator::GtEq,
            Comparison::Lt => BinaryOperator::Lt,
            Comparison::Le => BinaryOperator::LtEq,
        };
        Expr::binary(field.clone(), op, value(val.clone()))
    }

    fn like(&self, field: &Expr, pattern: &LikePattern) -> Expr {
        Expr::Like {
            expr: Box::new(field.clone()),
            pattern: Box::new(value(Value::String(pattern.to_sql()))),
            negated: false,
        }
    }

    fn is_null(&self, field: &Expr, negated: bool) -> Expr {
        Expr::IsNull {
            expr: Box::new(field.clone()),
            negated,
        }
    }

    fn in_values(&self, field: &Expr, values: &[Value]) -> Expr {
        Expr::InList {
            expr: Box::new(field.clone()),
            list: values.iter().cloned().map(value).collect(),
            negated: false,
        }
    }

    fn constant(&self, value: bool) -> Expr {
        Expr::Boolean(value)
    }

    fn not(&self, condition: Expr) -> Expr {
        condition.negate()
    }

    fn and(&self, left: Expr, right: Expr) -> Expr {
        left.and(right)
    }

    fn or(&self, left: Expr, right: Expr) -> Expr {
        left.or(right)
    }
}
