// JSON log parser (Splunk-style exports: an array of event objects)

use super::{LogParser, ParseOutcome};
use crate::format::Format;
use serde_json::{Map, Value};

pub const ORIGINAL_JSON_MARKER: &str = "--- ORIGINAL JSON DATA ---";

pub struct JsonParser;

impl JsonParser {
    // first alias that is present and not null
    fn field(entry: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
        aliases
            .iter()
            .filter_map(|key| entry.get(*key))
            .find(|v| !v.is_null())
            .map(render)
    }

    /// `[timestamp] level [host] source: message`
    pub fn flatten_entry(entry: &Value) -> String {
        let Some(obj) = entry.as_object() else {
            // scalars and nested arrays keep their line with default fields
            return format!("[Unknown] INFO [Unknown] Unknown: {}", render(entry));
        };

        let timestamp = Self::field(obj, &["_time", "timestamp"]).unwrap_or_else(|| "Unknown".to_string());
        let level = Self::field(obj, &["level", "severity"]).unwrap_or_else(|| "INFO".to_string());
        let message = Self::field(obj, &["message", "_raw"]).unwrap_or_else(|| entry.to_string());
        let host = Self::field(obj, &["host"]).unwrap_or_else(|| "Unknown".to_string());
        let source = Self::field(obj, &["source", "sourcetype"]).unwrap_or_else(|| "Unknown".to_string());

        format!("[{}] {} [{}] {}: {}", timestamp, level, host, source, message)
    }
}

// strings without quotes, everything else as compact JSON
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl LogParser for JsonParser {
    fn format(&self) -> Format {
        Format::Json
    }

    fn parse(&self, content: &str) -> ParseOutcome {
        let data: Value = match serde_json::from_str(content) {
            Ok(data) => data,
            Err(e) => {
                return ParseOutcome::Degraded {
                    text: format!("Invalid JSON format. Treating as text:\n\n{}", content),
                    diagnostic: format!("invalid JSON: {}", e),
                };
            }
        };

        match &data {
            Value::Array(entries) => {
                let lines: Vec<String> = entries.iter().map(Self::flatten_entry).collect();
                ParseOutcome::Clean(format!(
                    "{}\n\n{}\n{}",
                    lines.join("\n"),
                    ORIGINAL_JSON_MARKER,
                    content
                ))
            }
            single => {
                // serializing a parsed Value back out cannot fail
                let pretty = serde_json::to_string_pretty(single).unwrap_or_else(|_| single.to_string());
                ParseOutcome::Clean(format!(
                    "JSON Log Entry:\n{}\n\n--- RAW DATA ---\n{}",
                    pretty, content
                ))
            }
        }
    }
}
