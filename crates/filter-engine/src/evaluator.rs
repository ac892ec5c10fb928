//! Folds a filter tree into one backend predicate.

use crate::{
    backend::{FilterBackend, LikePattern},
    date_range::DateRange,
    settings::{FilterSettings, NullCheck},
};
use chrono::{DateTime, Utc};
use filter_syntax::{
    Combinator, Comparison, FilterError, FilterExpr, FilterNode, Operator, Result, parser::parse,
};
use model::core::value::Value;
use tracing::{debug, warn};

/// One evaluation pass: a backend, a fixed "now" and the settings to apply.
pub struct Evaluator<'a, B: FilterBackend> {
    backend: &'a B,
    now: DateTime<Utc>,
    settings: FilterSettings,
}

impl<'a, B: FilterBackend> Evaluator<'a, B> {
    pub fn new(backend: &'a B, now: DateTime<Utc>, settings: FilterSettings) -> Self {
        Self {
            backend,
            now,
            settings,
        }
    }

    /// Folds siblings left to right. Nodes that constrain nothing are
    /// skipped without consuming a combinator, and a prefix is only checked
    /// when its node joins an existing result. `None` means the whole list
    /// constrains nothing.
    pub fn evaluate(&self, nodes: &[FilterNode]) -> Result<Option<B::Condition>> {
        let mut result: Option<B::Condition> = None;

        for node in nodes {
            let Some(condition) = self.evaluate_node(node)? else {
                debug!("Skipping no-op {} node", node.mode());
                continue;
            };

            result = Some(match result {
                None => condition,
                Some(acc) => {
                    let prefix = node.prefix.as_ref().ok_or_else(|| {
                        FilterError::InvalidCombinator(format!("{} node has no prefix", node.mode()))
                    })?;
                    match prefix.combinator()? {
                        Combinator::And => self.backend.and(acc, condition),
                        Combinator::Or => self.backend.or(acc, condition),
                    }
                }
            });
        }

        Ok(result)
    }

    fn evaluate_node(&self, node: &FilterNode) -> Result<Option<B::Condition>> {
        match &node.expr {
            FilterExpr::Condition {
                field,
                operator,
                value,
            } => self.evaluate_condition(field, *operator, value).map(Some),
            FilterExpr::Group { children } => self.evaluate(children),
            FilterExpr::In { field, values } => {
                let field = self.backend.resolve_field(field)?;
                Ok(Some(self.backend.in_values(&field, values)))
            }
            FilterExpr::Date { field, mode } => {
                let handle = self.backend.resolve_field(field)?;
                let today = self.settings.today(self.now);
                let Some(range) = DateRange::for_mode(mode, today, self.settings.week_start)? else {
                    return Ok(None);
                };
                debug!(
                    "Date filter {} on '{}' resolved to [{}, {})",
                    mode.token(),
                    field,
                    range.start,
                    range.end
                );
                Ok(Some(self.backend.range(&handle, &range)))
            }
        }
    }

    fn evaluate_condition(
        &self,
        name: &str,
        operator: Operator,
        value: &Value,
    ) -> Result<B::Condition> {
        let field = self.backend.resolve_field(name)?;
        let backend = self.backend;

        let condition = match operator {
            Operator::Eq | Operator::Ne | Operator::Gt | Operator::Ge | Operator::Lt | Operator::Le => {
                self.comparison(&field, name, operator, value)?
            }
            Operator::Contains => {
                let pattern = LikePattern::Contains(text(operator, name, value)?);
                backend.like(&field, &pattern)
            }
            Operator::NotContains => {
                let pattern = LikePattern::Contains(text(operator, name, value)?);
                backend.not(backend.like(&field, &pattern))
            }
            Operator::StartsWith => {
                let pattern = LikePattern::StartsWith(text(operator, name, value)?);
                backend.like(&field, &pattern)
            }
            Operator::EndsWith => {
                let pattern = LikePattern::EndsWith(text(operator, name, value)?);
                backend.like(&field, &pattern)
            }
            Operator::IsNull | Operator::IsNotNull => {
                let negated = operator == Operator::IsNotNull;
                match self.settings.null_check {
                    NullCheck::Predicate => backend.is_null(&field, negated),
                    NullCheck::Legacy => {
                        warn!(
                            "Legacy null check on '{}': '{}' compiles to a constant {}",
                            name, operator, negated
                        );
                        backend.constant(negated)
                    }
                }
            }
        };

        Ok(condition)
    }

    fn comparison(
        &self,
        field: &B::Field,
        name: &str,
        operator: Operator,
        value: &Value,
    ) -> Result<B::Condition> {
        let op = operator
            .comparison()
            .ok_or_else(|| FilterError::UnsupportedOperator(operator.to_string()))?;

        // Comparing with null means testing for it.
        match (op, value.is_null()) {
            (_, false) => Ok(self.backend.compare(field, op, value)),
            (Comparison::Eq, true) => Ok(self.backend.is_null(field, false)),
            (Comparison::Ne, true) => Ok(self.backend.is_null(field, true)),
            (_, true) => Err(requires_value(operator, name)),
        }
    }
}

fn text(operator: Operator, field: &str, value: &Value) -> Result<String> {
    value
        .as_string()
        .ok_or_else(|| requires_value(operator, field))
}

fn requires_value(operator: Operator, field: &str) -> FilterError {
    FilterError::MalformedPayload(format!(
        "operator '{operator}' on field '{field}' requires a value"
    ))
}

/// Evaluates a decoded tree in one call.
pub fn evaluate<B: FilterBackend>(
    nodes: &[FilterNode],
    backend: &B,
    now: DateTime<Utc>,
    settings: FilterSettings,
) -> Result<Option<B::Condition>> {
    Evaluator::new(backend, now, settings).evaluate(nodes)
}

/// Decodes a raw `filterSos` payload and evaluates it.
pub fn evaluate_payload<B: FilterBackend>(
    payload: &str,
    backend: &B,
    now: DateTime<Utc>,
    settings: FilterSettings,
) -> Result<Option<B::Condition>> {
    let nodes = parse(payload)?;
    evaluate(&nodes, backend, now, settings)
}
