//! Tool parameter descriptors and argument validation

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::error::{ActionResult, ToolError};
use crate::types::Tool;

/// Scalar type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Number,
    String,
    Integer,
    Boolean,
}

impl ParamKind {
    /// Map a JSON schema type name; unknown or absent types are strings
    pub fn from_type_name(name: Option<&str>) -> Self {
        match name {
            Some("number") => ParamKind::Number,
            Some("integer") => ParamKind::Integer,
            Some("boolean") => ParamKind::Boolean,
            _ => ParamKind::String,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ParamKind::Number => "number",
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
        }
    }

    /// Check `value` against this kind, normalizing integral floats for `Integer`
    fn accept(&self, value: &Value) -> Option<Value> {
        match self {
            ParamKind::Number if value.is_number() => Some(value.clone()),
            ParamKind::String if value.is_string() => Some(value.clone()),
            ParamKind::Boolean if value.is_boolean() => Some(value.clone()),
            ParamKind::Integer if value.is_i64() || value.is_u64() => Some(value.clone()),
            ParamKind::Integer => value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| Value::from(f as i64)),
            _ => None,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub description: String,
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Type of a property schema, looking through `anyOf`/`oneOf` unions with null
fn property_type(property: &Value) -> Option<&str> {
    if let Some(name) = property.get("type").and_then(Value::as_str) {
        return Some(name);
    }
    if let Some(names) = property.get("type").and_then(Value::as_array) {
        return names.iter().filter_map(Value::as_str).find(|n| *n != "null");
    }
    ["anyOf", "oneOf"]
        .iter()
        .filter_map(|key| property.get(*key).and_then(Value::as_array))
        .flatten()
        .filter_map(|variant| variant.get("type").and_then(Value::as_str))
        .find(|name| *name != "null")
}

/// Ordered parameter list of one tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub parameters: Vec<ParamSpec>,
}

impl ToolSchema {
    pub fn new(parameters: Vec<ParamSpec>) -> Self {
        Self { parameters }
    }

    /// Read an object JSON schema; parameters keep their declared order
    pub fn from_json(schema: &Value) -> Self {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let parameters = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| {
                properties
                    .iter()
                    .map(|(name, property)| ParamSpec {
                        name: name.clone(),
                        kind: ParamKind::from_type_name(property_type(property)),
                        description: property
                            .get("description")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        required: required.contains(&name.as_str()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { parameters }
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// JSON schema handed to the model
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                let mut property = json!({ "type": p.kind.type_name() });
                if !p.description.is_empty() {
                    property["description"] = Value::String(p.description.clone());
                }
                (p.name.clone(), property)
            })
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Validate a keyword-argument object for `tool`
    ///
    /// Unknown keys, missing required keys and type mismatches are rejected.
    /// The returned object lists every declared parameter in order, with
    /// absent optional ones set to `null`.
    pub fn validate(&self, tool: &str, arguments: &Value) -> ActionResult<Map<String, Value>> {
        let empty = Map::new();
        let given = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(ToolError::invalid_arguments(
                    tool,
                    format!("expected an object of named arguments, got {}", other),
                ))
            }
        };

        if let Some(unknown) = given.keys().find(|key| self.get(key).is_none()) {
            return Err(ToolError::invalid_arguments(
                tool,
                format!("unknown argument '{}'", unknown),
            ));
        }

        let mut validated = Map::new();
        for param in &self.parameters {
            let value = match given.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(ToolError::invalid_arguments(
                        tool,
                        format!("missing required argument '{}'", param.name),
                    ))
                }
                None | Some(Value::Null) => Value::Null,
                Some(value) => param.kind.accept(value).ok_or_else(|| {
                    ToolError::invalid_arguments(
                        tool,
                        format!("argument '{}' expects type {}, got {}", param.name, param.kind, value),
                    )
                })?,
            };
            validated.insert(param.name.clone(), value);
        }
        Ok(validated)
    }
}

/// Name, description and parameters of one tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub schema: ToolSchema,
}

impl ToolMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: ToolSchema) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
        }
    }

    /// Build from a name, description and JSON schema as an endpoint reports them
    pub fn from_schema(name: impl Into<String>, description: impl Into<String>, schema: &Value) -> Self {
        Self::new(name, description, ToolSchema::from_json(schema))
    }

    pub fn from_tool(tool: &Tool) -> Self {
        let schema = tool
            .input_schema
            .as_ref()
            .map(ToolSchema::from_json)
            .unwrap_or_default();
        Self::new(tool.name.clone(), tool.description.clone(), schema)
    }

    pub fn parameters(&self) -> &[ParamSpec] {
        &self.schema.parameters
    }

    /// Declaration handed to the model
    pub fn to_tool(&self) -> Tool {
        Tool::new(self.name.clone(), self.description.clone())
            .with_schema(self.schema.to_json_schema())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "number", "description": "First operand" },
                "b": { "anyOf": [{ "type": "number" }, { "type": "null" }], "default": null },
                "label": {},
                "count": { "type": "integer" },
                "exact": { "type": ["boolean", "null"] }
            },
            "required": ["a"]
        })
    }

    #[test]
    fn test_from_json_keeps_order_and_kinds() {
        let meta = ToolMetadata::from_schema("add", "Add numbers", &add_schema());
        let names: Vec<&str> = meta.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "label", "count", "exact"]);

        let kinds: Vec<ParamKind> = meta.parameters().iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParamKind::Number,
                ParamKind::Number,
                ParamKind::String,
                ParamKind::Integer,
                ParamKind::Boolean
            ]
        );
        assert!(meta.parameters()[0].required);
        assert!(!meta.parameters()[1].required);
        assert_eq!(meta.parameters()[0].description, "First operand");
    }

    #[test]
    fn test_tool_without_schema_has_no_parameters() {
        let meta = ToolMetadata::from_tool(&Tool::new("ping", "Ping"));
        assert!(meta.parameters().is_empty());
        assert_eq!(meta.schema.validate("ping", &Value::Null).unwrap(), Map::new());
    }

    #[test]
    fn test_validate_fills_absent_optionals_with_null() {
        let schema = ToolSchema::from_json(&add_schema());
        let validated = schema.validate("add", &json!({"a": 2})).unwrap();

        assert_eq!(
            Value::Object(validated),
            json!({"a": 2, "b": null, "label": null, "count": null, "exact": null})
        );
    }

    #[test]
    fn test_validate_output_follows_declared_order() {
        let schema = ToolSchema::from_json(&add_schema());
        let validated = schema
            .validate("add", &json!({"exact": true, "a": 1.5, "count": 3}))
            .unwrap();
        let keys: Vec<&str> = validated.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "label", "count", "exact"]);
    }

    #[test]
    fn test_validate_rejects_bad_arguments() {
        let schema = ToolSchema::from_json(&add_schema());
        let cases = [
            (json!({"b": 1}), "missing required argument 'a'"),
            (json!({"a": null}), "missing required argument 'a'"),
            (json!({"a": 1, "c": 2}), "unknown argument 'c'"),
            (json!({"a": "two"}), "argument 'a' expects type number"),
            (json!({"a": 1, "count": 1.5}), "argument 'count' expects type integer"),
            (json!({"a": 1, "label": 3}), "argument 'label' expects type string"),
            (json!([1, 2]), "expected an object"),
        ];

        for (arguments, expected) in cases {
            match schema.validate("add", &arguments) {
                Err(ToolError::InvalidArguments { tool, reason }) => {
                    assert_eq!(tool, "add");
                    assert!(reason.contains(expected), "{reason} should contain {expected}");
                }
                other => panic!("{arguments} should be rejected, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_integral_float_is_accepted_as_integer() {
        let schema = ToolSchema::new(vec![ParamSpec::required("n", ParamKind::Integer)]);
        let validated = schema.validate("count", &json!({"n": 4.0})).unwrap();
        assert_eq!(validated["n"], json!(4));
    }

    #[test]
    fn test_to_json_schema() {
        let schema = ToolSchema::new(vec![
            ParamSpec::required("a", ParamKind::Number).with_description("First operand"),
            ParamSpec::optional("b", ParamKind::Number),
        ]);

        assert_eq!(
            schema.to_json_schema(),
            json!({
                "type": "object",
                "properties": {
                    "a": { "type": "number", "description": "First operand" },
                    "b": { "type": "number" }
                },
                "required": ["a"]
            })
        );
    }
}
