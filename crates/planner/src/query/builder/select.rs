//! A typestate builder for SELECT statements: columns first, then the source
//! table, then any filtering, ordering and paging.

use crate::query::ast::{
    common::{OrderDir, TableRef},
    expr::Expr,
    select::{FromClause, OrderByExpr, Select},
};
use std::marker::PhantomData;

#[derive(Debug, Clone)]
pub struct InitialState;
#[derive(Debug, Clone)]
pub struct SelectState;
#[derive(Debug, Clone)]
pub struct FromState;

#[derive(Debug, Clone)]
pub struct SelectBuilder<State> {
    pub ast: Select,
    _state: PhantomData<State>,
}

impl SelectBuilder<InitialState> {
    pub fn new() -> Self {
        Self {
            ast: Select::default(),
            _state: PhantomData,
        }
    }

    pub fn select(mut self, columns: Vec<Expr>) -> SelectBuilder<SelectState> {
        self.ast.columns = columns;
        SelectBuilder {
            ast: self.ast,
            _state: PhantomData,
        }
    }
}

impl Default for SelectBuilder<InitialState> {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectBuilder<SelectState> {
    pub fn from(mut self, table: TableRef, alias: Option<&str>) -> SelectBuilder<FromState> {
        self.ast.from = Some(FromClause {
            table,
            alias: alias.map(str::to_string),
        });
        SelectBuilder {
            ast: self.ast,
            _state: PhantomData,
        }
    }
}

impl SelectBuilder<FromState> {
    /// Adds a condition to the WHERE clause, AND-ing it with any condition
    /// that is already present.
    pub fn where_clause(mut self, condition: Expr) -> Self {
        self.ast.where_clause = Some(match self.ast.where_clause.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Like [`Self::where_clause`], for filters that may have compiled to
    /// nothing.
    pub fn filter(self, condition: Option<Expr>) -> Self {
        match condition {
            Some(condition) => self.where_clause(condition),
            None => self,
        }
    }

    pub fn order_by(mut self, expr: Expr, direction: Option<OrderDir>) -> Self {
        self.ast.order_by.push(OrderByExpr { expr, direction });
        self
    }

    pub fn limit(mut self, limit: Expr) -> Self {
        self.ast.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: Expr) -> Self {
        self.ast.offset = Some(offset);
        self
    }

    pub fn build(self) -> Select {
        self.ast
    }
}
