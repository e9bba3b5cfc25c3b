//! log parser registry - flatten raw logs into canonical prompt text

pub mod csv;
pub mod json;
pub mod text;

pub use self::csv::CsvParser;
pub use self::json::JsonParser;
pub use self::text::{SeverityTier, TextParser};

use crate::config::TriageConfig;
use crate::format::{Format, LogSource};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Result of flattening one log. Degraded output is still usable prompt text,
/// the diagnostic only says why the structured path was abandoned.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Clean(String),
    Degraded { text: String, diagnostic: String },
}

impl ParseOutcome {
    pub fn text(&self) -> &str {
        match self {
            ParseOutcome::Clean(text) => text,
            ParseOutcome::Degraded { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ParseOutcome::Clean(text) => text,
            ParseOutcome::Degraded { text, .. } => text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ParseOutcome::Degraded { .. })
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ParseOutcome::Clean(_) => None,
            ParseOutcome::Degraded { diagnostic, .. } => Some(diagnostic),
        }
    }
}

// Parser trait - every format parser implements this.
// Parsers never fail: bad input degrades instead.
pub trait LogParser: Send + Sync {
    fn format(&self) -> Format;
    fn parse(&self, content: &str) -> ParseOutcome;
}

// Registry to hold one parser per format

pub struct ParserRegistry {
    parsers: HashMap<Format, Box<dyn LogParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Registry with the JSON, CSV and default-tier text parsers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(JsonParser));
        registry.register(Box::new(CsvParser));
        registry.register(Box::new(TextParser::default()));
        registry
    }

    /// Defaults, with the text parser using the configured severity tiers
    pub fn from_config(config: &TriageConfig) -> Self {
        let mut registry = Self::with_defaults();
        registry.register(Box::new(TextParser::new(
            config.text.severity_tiers.clone(),
            config.text.fallback_glyph.clone(),
        )));
        registry
    }

    // register a parser, replacing any previous one for the same format
    pub fn register(&mut self, parser: Box<dyn LogParser>) {
        self.parsers.insert(parser.format(), parser);
    }

    pub fn get(&self, format: Format) -> Option<&dyn LogParser> {
        self.parsers.get(&format).map(|p| p.as_ref())
    }

    pub fn parse(&self, content: &str, format: Format) -> ParseOutcome {
        let outcome = match self.get(format) {
            Some(parser) => parser.parse(content),
            None => ParseOutcome::Degraded {
                text: format!("No parser registered for {} logs:\n\n{}", format, content),
                diagnostic: format!("unknown format: {}", format),
            },
        };

        if let Some(diagnostic) = outcome.diagnostic() {
            warn!(%format, %diagnostic, "Log parsing degraded");
        }
        outcome
    }

    pub fn parse_source(&self, source: &LogSource) -> ParseOutcome {
        self.parse(&source.content, source.format)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Flatten `content` with the default parsers
pub fn parse_log(content: &str, format: Format) -> String {
    ParserRegistry::with_defaults().parse(content, format).into_text()
}

/// Read, detect and flatten a file. Read errors end up in the returned text.
pub fn parse_file<P: AsRef<Path>>(path: P) -> String {
    match LogSource::from_path(path.as_ref()) {
        Ok(source) => ParserRegistry::with_defaults().parse_source(&source).into_text(),
        Err(e) => {
            warn!(path = %path.as_ref().display(), error = %e, "Failed to read log file");
            format!("Error reading file: {}\n\nRaw content:\nUnable to read file", e)
        }
    }
}
