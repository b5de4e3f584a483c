//! Output rendering for the CLI and the HTTP envelope

use std::str::FromStr;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::CultureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl FromStr for OutputFormat {
    type Err = CultureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" | "txt" => Ok(OutputFormat::Text),
            other => Err(CultureError::invalid(format!("unknown output format '{}'", other))),
        }
    }
}

/// `{status, message, data}` response document
pub fn envelope<T: Serialize>(status: &str, message: impl Into<String>, data: T) -> Value {
    json!({
        "status": status,
        "message": message.into(),
        "data": data,
    })
}

pub fn format_output(value: &Value, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
        OutputFormat::Text => format_text(value),
    }
}

/// Scalars without JSON quoting
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "none".to_string(),
        other => other.to_string(),
    }
}

fn join_list(items: &[Value]) -> String {
    items.iter().map(scalar).collect::<Vec<_>>().join(", ")
}

/// One `key: value` line; objects expand one level, lists are joined
fn push_entry(lines: &mut Vec<String>, indent: &str, key: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            lines.push(format!("{}{}:", indent, key));
            for (sub_key, sub_value) in map {
                lines.push(format!("{}  {}: {}", indent, sub_key, scalar(sub_value)));
            }
        }
        Value::Array(items) => lines.push(format!("{}{}: {}", indent, key, join_list(items))),
        other => lines.push(format!("{}{}: {}", indent, key, scalar(other))),
    }
}

fn format_text(value: &Value) -> String {
    let Some(doc) = value.as_object() else {
        return scalar(value);
    };

    let mut lines = Vec::new();

    if let Some(status) = doc.get("status") {
        lines.push(format!("Status: {}", scalar(status)));
    }
    if let Some(message) = doc.get("message") {
        lines.push(format!("Message: {}", scalar(message)));
    }

    match doc.get("data") {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            lines.push("Data:".to_string());
            for (i, item) in items.iter().enumerate() {
                lines.push(format!("  Item #{}:", i));
                match item.as_object() {
                    Some(map) => {
                        for (k, v) in map {
                            push_entry(&mut lines, "    ", k, v);
                        }
                    }
                    None => lines.push(format!("    {}", scalar(item))),
                }
            }
        }
        Some(Value::Object(map)) => {
            lines.push("Data:".to_string());
            for (k, v) in map {
                push_entry(&mut lines, "  ", k, v);
            }
        }
        Some(other) => {
            lines.push("Data:".to_string());
            lines.push(format!("  {}", scalar(other)));
        }
    }

    for (k, v) in doc {
        if !matches!(k.as_str(), "status" | "message" | "data") {
            push_entry(&mut lines, "", k, v);
        }
    }

    lines.join("\n")
}
