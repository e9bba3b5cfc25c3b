// Format detection - classify a log source as JSON, CSV or plain text

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Log formats understood by the parser registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Csv,
    Text,
}

impl Format {
    /// Parse a format hint (case-insensitive)
    pub fn from_hint(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "text" | "txt" | "log" | "plain" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
            Format::Text => "text",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a source by its name and, for `.txt`/`.log`, its first non-empty line.
///
/// Never fails: anything unrecognised is `Format::Text`. This is a guess, the
/// parsers still cope with content that does not match the detected format.
pub fn detect(source_name: &str, first_line: Option<&str>) -> Format {
    let ext = Path::new(source_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("json") => Format::Json,
        Some("csv") => Format::Csv,
        Some("txt") | Some("log") => sniff(first_line.unwrap_or("")),
        _ => Format::Text,
    }
}

// content sniffing for ambiguous extensions
fn sniff(first_line: &str) -> Format {
    let line = first_line.trim();
    if line.starts_with('[') || line.starts_with('{') {
        Format::Json
    } else if line.contains(',') && line.contains('"') {
        Format::Csv
    } else {
        Format::Text
    }
}

/// First line of `content` that is not blank
pub fn first_non_empty_line(content: &str) -> Option<&str> {
    content.lines().find(|l| !l.trim().is_empty())
}

/// A log as received from the upload layer: name, decoded content and detected format
#[derive(Debug, Clone)]
pub struct LogSource {
    pub name: String,
    pub content: String,
    pub format: Format,
}

impl LogSource {
    /// Build from raw bytes. Invalid UTF-8 is replaced rather than rejected.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        let name = name.into();
        let content = String::from_utf8_lossy(bytes).into_owned();
        let format = detect(&name, first_non_empty_line(&content));
        debug!(source = %name, %format, bytes = bytes.len(), "Detected log format");
        Self { name, content, format }
    }

    /// Build with an explicit format hint, skipping detection
    pub fn with_format(name: impl Into<String>, content: impl Into<String>, format: Format) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            format,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        Ok(Self::from_bytes(path.to_string_lossy(), &bytes))
    }
}
