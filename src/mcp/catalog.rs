use crate::errors::{ErrorCode, McpError};
use crate::utils::suggest::suggest;
use jsonschema::error::ValidationErrorKind;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tool_catalog.json"));
    serde_json::from_str(raw).expect("tool_catalog.json must be valid JSON")
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tool in TOOL_CATALOG.iter() {
        if let Ok(schema) = JSONSchema::compile(&tool.input_schema) {
            map.insert(tool.name.clone(), schema);
        }
    }
    map
});

/// Request fields handled by the server itself and never passed to a tool.
pub const TOOL_SEMANTIC_FIELDS: &[&str] = &["trace_id"];

pub fn tool_catalog() -> &'static [ToolDef] {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_CATALOG.iter().find(|tool| tool.name == name)
}

pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), McpError> {
    let Some(tool) = tool_by_name(tool_name) else {
        return Ok(());
    };
    let Some(schema) = TOOL_VALIDATORS.get(tool_name) else {
        return Ok(());
    };
    let empty = Value::Object(Default::default());
    let args = if args.is_null() { &empty } else { args };
    let result = schema.validate(args);
    if let Err(errors) = result {
        let lines: Vec<String> = errors
            .take(10)
            .map(|err| {
                let path = err.instance_path.to_string();
                let path = if path.is_empty() { "(root)".to_string() } else { path };
                describe_error(&path, &err.kind, &tool.input_schema)
            })
            .collect();
        let mut message = vec![format!("Invalid arguments for {}", tool_name)];
        message.extend(lines.iter().map(|line| format!("- {}", line)));
        return Err(McpError::new(ErrorCode::InvalidParams, message.join("\n"))
            .with_data(serde_json::json!({ "tool": tool_name, "errors": lines })));
    }
    Ok(())
}

fn describe_error(path: &str, kind: &ValidationErrorKind, schema: &Value) -> String {
    match kind {
        ValidationErrorKind::Required { property } => {
            let prop = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            format!("{}: missing required field '{}'", path, prop)
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            let known: Vec<String> = schema
                .get("properties")
                .and_then(|v| v.as_object())
                .map(|props| props.keys().cloned().collect())
                .unwrap_or_default();
            let rendered: Vec<String> = unexpected
                .iter()
                .map(|field| {
                    let close = suggest(field, &known, 1);
                    match close.first() {
                        Some(hint) => format!("'{}' (did you mean '{}'?)", field, hint),
                        None => format!("'{}'", field),
                    }
                })
                .collect();
            format!("{}: unknown field {}", path, rendered.join(", "))
        }
        other => format!("{}: {}", path, describe_other(other)),
    }
}

fn describe_other(kind: &ValidationErrorKind) -> String {
    match kind {
        ValidationErrorKind::Enum { options } => format!("expected one of {}", options),
        ValidationErrorKind::Minimum { limit } => format!("must be >= {}", limit),
        ValidationErrorKind::Maximum { limit } => format!("must be <= {}", limit),
        ValidationErrorKind::MinLength { limit } => format!("must have length >= {}", limit),
        ValidationErrorKind::Type { .. } => "has the wrong type".to_string(),
        _ => "is invalid".to_string(),
    }
}

pub fn list_tools() -> Vec<ToolDef> {
    TOOL_CATALOG.iter().cloned().collect()
}
