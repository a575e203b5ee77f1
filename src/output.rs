//! Command output rendering

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How command results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Json,
    Yaml,
    Text,
}

/// Render a command result. `Null` renders as nothing.
pub fn render(value: &Value, mode: OutputMode) -> Result<String> {
    if value.is_null() {
        return Ok(String::new());
    }

    Ok(match mode {
        OutputMode::Json => serde_json::to_string_pretty(value)?,
        OutputMode::Yaml => serde_yaml::to_string(value)?.trim_end().to_string(),
        OutputMode::Text => render_text(value),
    })
}

fn render_text(value: &Value) -> String {
    match value {
        Value::Array(items) => render_table(items),
        Value::Object(map) => {
            let width = map.keys().map(|k| k.len()).max().unwrap_or(0);
            map.iter()
                .map(|(key, value)| format!("{:width$}: {}", key, display_value(value), width = width))
                .collect::<Vec<_>>()
                .join("\n")
        }
        other => display_value(other),
    }
}

/// Tab-separated table; columns come from the first item
fn render_table(items: &[Value]) -> String {
    let Some(first) = items.first() else {
        return String::new();
    };

    let Some(columns) = first.as_object().map(|o| o.keys().cloned().collect::<Vec<_>>()) else {
        return items.iter().map(display_value).collect::<Vec<_>>().join("\n");
    };

    let mut lines = vec![columns.join("\t")];
    for item in items {
        let row: Vec<String> = columns
            .iter()
            .map(|column| display_value(item.get(column).unwrap_or(&Value::Null)))
            .collect();
        lines.push(row.join("\t"));
    }
    lines.join("\n")
}

/// Display form of a single value
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => "[object]".to_string(),
    }
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> Value {
    let mut current = item;

    for part in path.split('.') {
        let next = match part.parse::<usize>() {
            Ok(idx) => current.get(idx),
            Err(_) => current.get(part),
        };
        current = match next {
            Some(v) => v,
            None => return Value::Null,
        };
    }

    current.clone()
}
