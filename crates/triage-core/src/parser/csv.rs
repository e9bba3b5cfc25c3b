// CSV log parser - header driven, with best-effort column aliasing

use super::{LogParser, ParseOutcome};
use crate::format::Format;
use serde_json::{Map, Value};

pub const ORIGINAL_CSV_MARKER: &str = "--- ORIGINAL CSV DATA ---";

const TIMESTAMP_COLUMNS: &[&str] = &["timestamp", "time", "date"];
const LEVEL_COLUMNS: &[&str] = &["level", "severity", "priority"];
const MESSAGE_COLUMNS: &[&str] = &["message", "description", "event"];

pub struct CsvParser;

/// One data row keyed by header name
struct Row<'a> {
    headers: &'a [String],
    values: Vec<String>,
}

impl Row<'_> {
    // header match ignores case and surrounding spaces
    fn get(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|alias| {
            self.headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(alias))
                .and_then(|i| self.values.get(i))
                .map(String::as_str)
        })
    }

    fn stringify(&self) -> String {
        let map: Map<String, Value> = self
            .headers
            .iter()
            .zip(self.values.iter())
            .map(|(h, v)| (h.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map).to_string()
    }
}

impl CsvParser {
    fn flatten(content: &str) -> Result<Vec<String>, ::csv::Error> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut lines = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row = Row {
                headers: &headers,
                values: record.iter().map(str::to_string).collect(),
            };

            let timestamp = row.get(TIMESTAMP_COLUMNS).unwrap_or("Unknown");
            let level = row.get(LEVEL_COLUMNS).unwrap_or("INFO");
            let message = match row.get(MESSAGE_COLUMNS) {
                Some(m) => m.to_string(),
                None => row.stringify(),
            };

            lines.push(format!("[{}] {}: {}", timestamp, level, message));
        }
        Ok(lines)
    }
}

impl LogParser for CsvParser {
    fn format(&self) -> Format {
        Format::Csv
    }

    fn parse(&self, content: &str) -> ParseOutcome {
        match Self::flatten(content) {
            Ok(lines) => ParseOutcome::Clean(format!(
                "{}\n\n{}\n{}",
                lines.join("\n"),
                ORIGINAL_CSV_MARKER,
                content
            )),
            Err(e) => ParseOutcome::Degraded {
                text: format!("Error parsing CSV: {}\n\nRaw content:\n{}", e, content),
                diagnostic: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_and_defaults() {
        let content = "Date,Priority,Event\n2024-03-01,HIGH,db down\n";
        let outcome = CsvParser.parse(content);
        assert!(!outcome.is_degraded());
        assert!(outcome.text().starts_with("[2024-03-01] HIGH: db down\n\n"));
    }

    #[test]
    fn test_missing_message_column_uses_row() {
        let content = "time,host\n10:00,web-1\n";
        let outcome = CsvParser.parse(content);
        assert!(outcome
            .text()
            .starts_with(r#"[10:00] INFO: {"time":"10:00","host":"web-1"}"#));
    }

    #[test]
    fn test_short_row_falls_back() {
        let content = "timestamp,level,message\nt1\n";
        let outcome = CsvParser.parse(content);
        assert!(outcome.text().starts_with(r#"[t1] INFO: {"timestamp":"t1"}"#));
    }

    #[test]
    fn test_original_data_trailer() {
        let content = "timestamp,level,message\nt1,ERROR,\"disk, full\"";
        let text = CsvParser.parse(content).into_text();
        assert_eq!(
            text,
            format!("[t1] ERROR: disk, full\n\n{}\n{}", ORIGINAL_CSV_MARKER, content)
        );
    }
}
