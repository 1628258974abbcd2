//! Parameter schemas and argument validation

use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::base::ToolArgs;

/// Type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    StringArray,
}

impl ParamKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::StringArray => value
                .as_array()
                .map(|items| items.iter().all(Value::is_string))
                .unwrap_or(false),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ParamKind::String => "a string",
            ParamKind::Integer => "an integer",
            ParamKind::Number => "a number",
            ParamKind::Boolean => "a boolean",
            ParamKind::StringArray => "an array of strings",
        }
    }

    fn json_schema(&self) -> Value {
        match self {
            ParamKind::String => json!({ "type": "string" }),
            ParamKind::Integer => json!({ "type": "integer" }),
            ParamKind::Number => json!({ "type": "number" }),
            ParamKind::Boolean => json!({ "type": "boolean" }),
            ParamKind::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
        }
    }
}

/// Declaration of a single tool parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub description: String,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<Value>,
    /// Closed set of accepted string values
    pub allowed_values: Option<Vec<String>>,
}

impl ParameterSpec {
    /// A required parameter
    pub fn required<N: Into<String>, D: Into<String>>(name: N, kind: ParamKind, description: D) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: true,
            default: None,
            allowed_values: None,
        }
    }

    /// An optional parameter without a default
    pub fn optional<N: Into<String>, D: Into<String>>(name: N, kind: ParamKind, description: D) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Make the parameter optional with the given default
    pub fn with_default(mut self, default: Value) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }

    /// Restrict a string parameter to a closed set of values
    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.allowed_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }
}

/// Render parameter declarations as a JSON-schema object for providers
pub fn to_json_schema(params: &[ParameterSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in params {
        let mut schema = param.kind.json_schema();
        if let Some(obj) = schema.as_object_mut() {
            obj.insert("description".to_string(), json!(param.description));
            if let Some(default) = &param.default {
                obj.insert("default".to_string(), default.clone());
            }
            if let Some(allowed) = &param.allowed_values {
                obj.insert("enum".to_string(), json!(allowed));
            }
        }
        properties.insert(param.name.clone(), schema);
        if param.required {
            required.push(param.name.clone());
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Check raw model arguments against the declared parameters.
///
/// `null` counts as "no arguments". Optional parameters that are absent or
/// explicitly `null` get their default; parameters that are not declared
/// are dropped.
pub fn validate_arguments(
    tool: &str,
    params: &[ParameterSpec],
    arguments: &Value,
) -> std::result::Result<ToolArgs, ToolError> {
    let invalid = |parameter: &str, message: String| ToolError::Validation {
        tool: tool.to_string(),
        parameter: parameter.to_string(),
        message,
    };

    let empty = Map::new();
    let supplied = match arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            return Err(invalid(
                "arguments",
                format!("expected a JSON object, got {}", other),
            ))
        }
    };

    let mut values = Map::new();
    for param in params {
        let value = match supplied.get(&param.name) {
            Some(Value::Null) | None => {
                if param.required {
                    return Err(invalid(&param.name, "missing required parameter".to_string()));
                }
                match &param.default {
                    Some(default) => default.clone(),
                    None => continue,
                }
            }
            Some(value) => value.clone(),
        };

        if !param.kind.matches(&value) {
            return Err(invalid(
                &param.name,
                format!("expected {}, got {}", param.kind.describe(), value),
            ));
        }

        if let (Some(allowed), Some(s)) = (&param.allowed_values, value.as_str()) {
            if !allowed.iter().any(|a| a == s) {
                return Err(invalid(
                    &param.name,
                    format!("'{}' is not one of: {}", s, allowed.join(", ")),
                ));
            }
        }

        values.insert(param.name.clone(), value);
    }

    for key in supplied.keys() {
        if !params.iter().any(|p| &p.name == key) {
            tracing::debug!(tool, parameter = %key, "dropping undeclared argument");
        }
    }

    Ok(ToolArgs::new(tool, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ad_copy_params() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required("industry", ParamKind::String, "Industry"),
            ParameterSpec::required("objective", ParamKind::String, "Objective")
                .one_of(&["traffic", "leads", "sales"]),
            ParameterSpec::optional("tone", ParamKind::String, "Tone")
                .with_default(json!("professional"))
                .one_of(&["professional", "friendly", "luxury", "direct"]),
            ParameterSpec::optional("campaign_ids", ParamKind::StringArray, "Ids"),
        ]
    }

    fn parameter_of(err: ToolError) -> String {
        match err {
            ToolError::Validation { parameter, .. } => parameter,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults_filled_and_extras_dropped() {
        let args = validate_arguments(
            "generate_ad_copy",
            &ad_copy_params(),
            &json!({"industry": "plumbing", "objective": "leads", "colour": "blue", "campaign_ids": null}),
        )
        .unwrap();

        assert_eq!(args.as_map().get("tone"), Some(&json!("professional")));
        assert!(args.as_map().get("colour").is_none());
        assert!(args.as_map().get("campaign_ids").is_none());
    }

    #[test]
    fn test_missing_required_parameter() {
        let err = validate_arguments("generate_ad_copy", &ad_copy_params(), &json!({"industry": "x"}))
            .unwrap_err();
        assert_eq!(parameter_of(err), "objective");

        let err = validate_arguments("generate_ad_copy", &ad_copy_params(), &Value::Null).unwrap_err();
        assert_eq!(parameter_of(err), "industry");
    }

    #[test]
    fn test_wrong_type() {
        let err = validate_arguments(
            "generate_ad_copy",
            &ad_copy_params(),
            &json!({"industry": 42, "objective": "leads"}),
        )
        .unwrap_err();
        assert_eq!(parameter_of(err), "industry");

        let err = validate_arguments(
            "generate_ad_copy",
            &ad_copy_params(),
            &json!({"industry": "x", "objective": "leads", "campaign_ids": ["1", 2]}),
        )
        .unwrap_err();
        assert_eq!(parameter_of(err), "campaign_ids");
    }

    #[test]
    fn test_value_outside_enumeration() {
        let err = validate_arguments(
            "generate_ad_copy",
            &ad_copy_params(),
            &json!({"industry": "x", "objective": "awareness"}),
        )
        .unwrap_err();
        assert_eq!(parameter_of(err), "objective");
    }

    #[test]
    fn test_non_object_arguments() {
        let err = validate_arguments("generate_ad_copy", &ad_copy_params(), &json!("industry=x"))
            .unwrap_err();
        assert_eq!(parameter_of(err), "arguments");
    }

    #[test]
    fn test_json_schema_rendering() {
        let schema = to_json_schema(&ad_copy_params());
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["industry", "objective"]));
        assert_eq!(schema["properties"]["tone"]["default"], "professional");
        assert_eq!(schema["properties"]["objective"]["enum"], json!(["traffic", "leads", "sales"]));
        assert_eq!(schema["properties"]["campaign_ids"]["items"]["type"], "string");
    }
}
