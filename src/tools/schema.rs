//! Tool definition building.
//!
//! Built-in tools declare their parameters once at registration; the
//! declarations plus an `Args:`-style doc block produce the OpenAI
//! function-calling definition. Building is deterministic: the same inputs
//! always produce the same definition.

use std::collections::HashMap;

use chat_protocol::ToolDefinition;
use serde_json::{json, Map, Value};

/// JSON-schema kind of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    Integer,
    Number,
    String,
    Boolean,
    /// Array with the given element kind.
    Array(Box<ParamKind>),
    /// Object with the given value kind for `additionalProperties`.
    Object(Box<ParamKind>),
    /// Anything we cannot express maps to a plain string.
    Unknown,
}

impl ParamKind {
    pub fn to_schema(&self) -> Value {
        match self {
            Self::Integer => json!({"type": "integer"}),
            Self::Number => json!({"type": "number"}),
            Self::String | Self::Unknown => json!({"type": "string"}),
            Self::Boolean => json!({"type": "boolean"}),
            Self::Array(items) => json!({"type": "array", "items": items.to_schema()}),
            Self::Object(values) => {
                json!({"type": "object", "additionalProperties": values.to_schema()})
            }
        }
    }
}

/// One declared parameter of a built-in tool.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    /// Optional parameters are left out of the schema's `required` list.
    pub required: bool,
}

impl ParamSpec {
    pub fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub fn optional(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Parse an `Args:`-style doc string into the summary and per-parameter
/// descriptions. The leading paragraph(s) become the description; entries
/// under `Args:` map parameter names to their docs, with continuation lines
/// folded in. `Returns:`/`Raises:` sections are ignored.
pub fn parse_docstring(doc: &str) -> (String, HashMap<String, String>) {
    let mut description_lines: Vec<&str> = Vec::new();
    let mut params: HashMap<String, String> = HashMap::new();
    let mut in_args = false;
    let mut current: Option<(String, Vec<String>)> = None;

    let mut flush = |current: &mut Option<(String, Vec<String>)>,
                     params: &mut HashMap<String, String>| {
        if let Some((name, lines)) = current.take() {
            params.insert(name, lines.join(" ").trim().to_string());
        }
    };

    for line in doc.lines() {
        let stripped = line.trim();
        if stripped.starts_with("Args:") {
            in_args = true;
            continue;
        }
        if stripped.starts_with("Returns:") || stripped.starts_with("Raises:") {
            flush(&mut current, &mut params);
            in_args = false;
            // Everything after these sections is not part of the summary.
            break;
        }
        if in_args {
            if let Some((name, rest)) = split_param_line(stripped) {
                flush(&mut current, &mut params);
                current = Some((name.to_string(), vec![rest.to_string()]));
            } else if let Some((_, lines)) = current.as_mut() {
                if !stripped.is_empty() {
                    lines.push(stripped.to_string());
                }
            }
            continue;
        }
        if !stripped.is_empty() {
            description_lines.push(stripped);
        }
    }
    flush(&mut current, &mut params);

    (description_lines.join(" "), params)
}

/// Match a `name: description` entry where `name` is an identifier.
fn split_param_line(line: &str) -> Option<(&str, &str)> {
    let (name, rest) = line.split_once(':')?;
    let name = name.trim();
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, rest.trim()))
}

/// Build the OpenAI-format definition from a tool's declaration.
pub fn build_definition(name: &str, doc: &str, params: &[ParamSpec]) -> ToolDefinition {
    let (description, param_docs) = parse_docstring(doc);

    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in params {
        let mut schema = param.kind.to_schema();
        if let Some(doc) = param_docs.get(param.name) {
            if !doc.is_empty() {
                schema["description"] = Value::String(doc.clone());
            }
        }
        properties.insert(param.name.to_string(), schema);
        if param.required {
            required.push(Value::String(param.name.to_string()));
        }
    }

    ToolDefinition::function(
        name,
        description,
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    )
}
