//! Wire format and typed tree for the list filter payload (`filterSos`).
//!
//! A payload is a JSON array of sibling nodes. [`parser::parse`] turns it into
//! a `Vec<FilterNode>`, [`encoder::encode`] turns a tree back into wire nodes.

pub mod ast;
pub mod encoder;
pub mod error;
pub mod parser;
pub mod wire;

pub use ast::node::{FilterExpr, FilterNode};
pub use ast::operator::{Combinator, Comparison, DateMode, Mode, Operator, Prefix};
pub use error::{FilterError, Result};
