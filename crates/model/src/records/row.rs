use crate::core::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

/// A single row of an admin list, held in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub entity: String,
    pub field_values: Vec<FieldValue>,
}

impl Record {
    pub fn new(entity: &str, field_values: Vec<FieldValue>) -> Self {
        Record {
            entity: entity.to_string(),
            field_values,
        }
    }

    /// Builds a record from a JSON object. Nested arrays and objects are kept
    /// as their JSON text.
    pub fn from_json(entity: &str, json: &serde_json::Value) -> Option<Self> {
        let object = json.as_object()?;
        let field_values = object
            .iter()
            .map(|(name, raw)| FieldValue {
                name: name.clone(),
                value: Value::from_json(raw).unwrap_or_else(|| Value::String(raw.to_string())),
            })
            .collect();
        Some(Record::new(entity, field_values))
    }

    pub fn to_json(&self) -> serde_json::Value {
        let object = self
            .field_values
            .iter()
            .map(|f| (f.name.clone(), f.value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(object)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .map(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.field_values.iter().map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_object() {
        let record = Record::from_json(
            "users",
            &json!({"id": 1, "name": "ann", "tags": ["a"], "deleted_at": null}),
        )
        .unwrap();

        assert_eq!(record.entity, "users");
        assert_eq!(record.get_value("ID"), Value::Int(1));
        assert_eq!(record.get_value("name"), Value::from("ann"));
        assert_eq!(record.get_value("tags"), Value::from(r#"["a"]"#));
        assert_eq!(record.get_value("deleted_at"), Value::Null);
        assert_eq!(record.get_value("missing"), Value::Null);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(Record::from_json("users", &json!([1, 2])).is_none());
    }
}
