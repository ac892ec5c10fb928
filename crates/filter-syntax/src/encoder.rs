use crate::{
    ast::{
        node::{FilterExpr, FilterNode},
        operator::DateMode,
    },
    error::Result,
    wire::WireNode,
};
use model::core::value::Value;

/// Turns a typed sibling list back into wire nodes, using the widget's own
/// tokens (`notContain`, `thisWeek`, ...).
pub fn encode(nodes: &[FilterNode]) -> Vec<WireNode> {
    nodes.iter().map(encode_node).collect()
}

pub fn to_json_string(nodes: &[FilterNode]) -> Result<String> {
    Ok(serde_json::to_string(&encode(nodes))?)
}

fn encode_node(node: &FilterNode) -> WireNode {
    let mut wire = WireNode {
        prefix: node.prefix.as_ref().map(|p| p.to_string()),
        mode: node.mode().to_string(),
        extra: node.extra.clone(),
        ..WireNode::default()
    };

    match &node.expr {
        FilterExpr::Condition {
            field,
            operator,
            value,
        } => {
            wire.field = Some(field.clone());
            wire.kind = Some(operator.to_string());
            if operator.takes_value() || !value.is_null() {
                wire.value = Some(value.to_json());
            }
        }
        FilterExpr::Group { children } => {
            wire.children = Some(encode(children));
        }
        FilterExpr::In { field, values } => {
            wire.field = Some(field.clone());
            wire.values = Some(values.iter().map(Value::to_json).collect());
        }
        FilterExpr::Date { field, mode } => {
            wire.field = Some(field.clone());
            wire.kind = Some(mode.token().to_string());
            if let DateMode::Specific(day) = mode {
                wire.value = Some(serde_json::Value::String(day.format("%Y-%m-%d").to_string()));
            }
        }
    }

    wire
}
