// Plain text parser - one severity glyph per non-blank line

use super::{LogParser, ParseOutcome};
use crate::format::Format;
use serde::{Deserialize, Serialize};

/// A glyph and the keywords that select it. Tiers are checked in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityTier {
    pub glyph: String,
    pub keywords: Vec<String>,
}

impl SeverityTier {
    pub fn new(glyph: &str, keywords: &[&str]) -> Self {
        Self {
            glyph: glyph.to_string(),
            keywords: keywords.iter().map(|k| k.to_uppercase()).collect(),
        }
    }

    fn matches(&self, upper_line: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| upper_line.contains(k.to_uppercase().as_str()))
    }
}

pub const DEFAULT_FALLBACK_GLYPH: &str = "⚪";

pub fn default_tiers() -> Vec<SeverityTier> {
    vec![
        SeverityTier::new("🔴", &["ERROR", "CRITICAL", "FATAL"]),
        SeverityTier::new("🟡", &["WARN", "WARNING"]),
        SeverityTier::new("🔵", &["INFO", "DEBUG", "TRACE"]),
    ]
}

pub struct TextParser {
    tiers: Vec<SeverityTier>,
    fallback: String,
}

impl TextParser {
    pub fn new(tiers: Vec<SeverityTier>, fallback: impl Into<String>) -> Self {
        Self {
            tiers,
            fallback: fallback.into(),
        }
    }

    /// Glyph for a single line: first matching tier, else the fallback
    pub fn glyph_for(&self, line: &str) -> &str {
        let upper = line.to_uppercase();
        self.tiers
            .iter()
            .find(|tier| tier.matches(&upper))
            .map(|tier| tier.glyph.as_str())
            .unwrap_or(self.fallback.as_str())
    }
}

impl Default for TextParser {
    fn default() -> Self {
        Self::new(default_tiers(), DEFAULT_FALLBACK_GLYPH)
    }
}

impl LogParser for TextParser {
    fn format(&self) -> Format {
        Format::Text
    }

    fn parse(&self, content: &str) -> ParseOutcome {
        let lines: Vec<String> = content
            .split('\n')
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(|line| format!("{} {}", self.glyph_for(line), line))
            .collect();

        ParseOutcome::Clean(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_precedence() {
        let parser = TextParser::default();
        assert_eq!(parser.glyph_for("WARN: retry after error"), "🔴");
        assert_eq!(parser.glyph_for("info: warning threshold"), "🟡");
        assert_eq!(parser.glyph_for("trace id=42"), "🔵");
        assert_eq!(parser.glyph_for("all good"), "⚪");
    }

    #[test]
    fn test_substring_match_is_case_insensitive() {
        let parser = TextParser::default();
        // "terror" contains "error"
        assert_eq!(parser.glyph_for("terror"), "🔴");
        assert_eq!(parser.glyph_for("Fatal signal"), "🔴");
    }

    #[test]
    fn test_blank_lines_dropped() {
        let out = TextParser::default().parse("a\n\n   \r\nb INFO\r\n").into_text();
        assert_eq!(out, "⚪ a\n🔵 b INFO");
    }

    #[test]
    fn test_custom_tiers() {
        let parser = TextParser::new(vec![SeverityTier::new("!!", &["panic"])], "..");
        assert_eq!(parser.parse("thread panicked\nok").into_text(), "!! thread panicked\n.. ok");
    }
}
