//! Compiles decoded `filterSos` trees into backend predicates.
//!
//! The evaluator is generic over a [`backend::FilterBackend`]; the SQL
//! backend yields planner expressions and the memory backend yields
//! [`backend::memory::RecordPredicate`]s.

pub mod backend;
pub mod date_range;
pub mod evaluator;
pub mod settings;

pub use backend::{
    FilterBackend, LikePattern,
    memory::{RecordFilterBackend, RecordPredicate},
    sql::{SqlFilterBackend, TableSchema},
};
pub use date_range::DateRange;
pub use evaluator::{Evaluator, evaluate, evaluate_payload};
pub use filter_syntax::{FilterError, Result};
pub use settings::{FilterSettings, NullCheck, error::SettingsError};
