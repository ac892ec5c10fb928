use crate::{
    ast::{
        node::{FilterExpr, FilterNode},
        operator::{DateMode, Mode, Operator, Prefix},
    },
    error::{FilterError, Result},
    wire::WireNode,
};
use model::core::value::Value;
use tracing::debug;

/// Parses a `filterSos` payload: a JSON array of sibling nodes.
pub fn parse(payload: &str) -> Result<Vec<FilterNode>> {
    let wire: Vec<WireNode> = serde_json::from_str(payload)?;
    let nodes = decode(&wire)?;
    debug!("Parsed filter payload with {} top-level node(s)", nodes.len());
    Ok(nodes)
}

/// Parses a payload that has already been read as JSON.
pub fn parse_value(payload: serde_json::Value) -> Result<Vec<FilterNode>> {
    let wire: Vec<WireNode> = serde_json::from_value(payload)?;
    decode(&wire)
}

/// Validates a sibling list of wire nodes into typed nodes.
pub fn decode(siblings: &[WireNode]) -> Result<Vec<FilterNode>> {
    siblings
        .iter()
        .map(decode_node)
        .collect()
}

fn decode_node(node: &WireNode) -> Result<FilterNode> {
    // Prefixes are checked by the evaluator, which knows which nodes fold.
    let prefix = node.prefix.as_deref().map(Prefix::from_wire);

    let expr = match node.mode.parse::<Mode>()? {
        Mode::Condition => decode_condition(node)?,
        Mode::Group => {
            let children = node.children.as_deref().ok_or_else(|| missing("group", "children"))?;
            FilterExpr::Group {
                children: decode(children)?,
            }
        }
        Mode::In => {
            let field = required_field(node, "in")?;
            let raw = node.values.as_deref().ok_or_else(|| missing("in", "values"))?;
            let values = raw.iter().map(scalar).collect::<Result<Vec<_>>>()?;
            FilterExpr::In { field, values }
        }
        Mode::Date => {
            let field = required_field(node, "date")?;
            let kind = node.kind.as_deref().ok_or_else(|| missing("date", "type"))?;
            let value = node.value.as_ref().map(scalar).transpose()?;
            FilterExpr::Date {
                field,
                mode: DateMode::from_wire(kind, value.as_ref())?,
            }
        }
    };

    Ok(FilterNode {
        prefix,
        expr,
        extra: node.extra.clone(),
    })
}

fn decode_condition(node: &WireNode) -> Result<FilterExpr> {
    let field = required_field(node, "condition")?;
    let operator = node
        .kind
        .as_deref()
        .ok_or_else(|| missing("condition", "type"))?
        .parse::<Operator>()?;

    // An absent value reads as null, which only null-aware operators accept.
    let value = match &node.value {
        Some(raw) => scalar(raw)?,
        None => Value::Null,
    };

    let null_allowed = matches!(
        operator,
        Operator::Eq | Operator::Ne | Operator::IsNull | Operator::IsNotNull
    );
    if value.is_null() && !null_allowed {
        return Err(FilterError::MalformedPayload(format!(
            "operator '{operator}' on field '{field}' requires a value"
        )));
    }

    Ok(FilterExpr::Condition {
        field,
        operator,
        value,
    })
}

fn required_field(node: &WireNode, mode: &str) -> Result<String> {
    match node.field.as_deref() {
        Some(field) if !field.trim().is_empty() => Ok(field.to_string()),
        _ => Err(missing(mode, "field")),
    }
}

fn scalar(raw: &serde_json::Value) -> Result<Value> {
    Value::from_json(raw)
        .ok_or_else(|| FilterError::MalformedPayload(format!("expected a scalar value, got {raw}")))
}

fn missing(mode: &str, key: &str) -> FilterError {
    FilterError::MalformedPayload(format!("{mode} node is missing '{key}'"))
}
