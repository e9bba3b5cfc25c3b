//! Prompt-boundary sanitization.
//!
//! Untrusted log text is flattened to a single line before it is embedded in a
//! prompt; model output keeps its markdown layout. Both modes drop control
//! characters, neutralise known prompt-injection phrasing and cap the size.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigError;

pub const TRUNCATION_MARKER: &str = "[TRUNCATED - Content too large for security]";
pub const DEFAULT_MAX_LENGTH: usize = 50_000;
pub const DEFAULT_FILTER_TOKEN: &str = "[FILTERED]";

/// Injection idioms, applied in this order
pub const DEFAULT_DANGEROUS_PATTERNS: &[&str] = &[
    r"ignore\s+previous\s+instructions",
    r"forget\s+everything",
    r"new\s+instructions",
    r"system\s*:\s*you\s+are",
    r"assistant\s*:\s*",
    r"human\s*:\s*",
    r"<\s*script\s*>",
    r"javascript\s*:",
    r"eval\s*\(",
    r"exec\s*\(",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizationPolicy {
    /// Character budget, the truncation marker comes on top
    pub max_length: usize,
    pub dangerous_patterns: Vec<String>,
    pub filter_token: String,
}

impl Default for SanitizationPolicy {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            dangerous_patterns: DEFAULT_DANGEROUS_PATTERNS.iter().map(|p| p.to_string()).collect(),
            filter_token: DEFAULT_FILTER_TOKEN.to_string(),
        }
    }
}

/// Compiled, case-insensitive injection patterns
#[derive(Debug, Clone)]
pub struct DangerousPatterns {
    patterns: Vec<Regex>,
}

impl DangerousPatterns {
    pub fn compile<S: AsRef<str>>(sources: &[S]) -> Result<Self, ConfigError> {
        let patterns = sources
            .iter()
            .map(|src| {
                RegexBuilder::new(src.as_ref())
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ConfigError::InvalidPattern {
                        pattern: src.as_ref().to_string(),
                        source: e,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Regex> {
        self.patterns.iter()
    }

    /// How many distinct patterns occur anywhere in `text`
    pub fn count_matching(&self, text: &str) -> usize {
        self.patterns.iter().filter(|p| p.is_match(text)).count()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for DangerousPatterns {
    fn default() -> Self {
        Self::compile(DEFAULT_DANGEROUS_PATTERNS).expect("built-in patterns are valid")
    }
}

pub struct InputSanitizer {
    max_length: usize,
    filter_token: String,
    patterns: DangerousPatterns,
    control_chars: Regex,
    whitespace: Regex,
    blank_runs: Regex,
}

impl InputSanitizer {
    pub fn new(policy: &SanitizationPolicy) -> Result<Self, ConfigError> {
        Ok(Self {
            max_length: policy.max_length,
            filter_token: policy.filter_token.clone(),
            patterns: DangerousPatterns::compile(&policy.dangerous_patterns)?,
            control_chars: Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap(),
            whitespace: Regex::new(r"\s+").unwrap(),
            blank_runs: Regex::new(r"\n{3,}").unwrap(),
        })
    }

    pub fn patterns(&self) -> &DangerousPatterns {
        &self.patterns
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Clean `text` for the prompt (`preserve_structure = false`) or for display
    /// of model output (`preserve_structure = true`). Empty input gives "".
    ///
    /// Sanitizing already-sanitized text is a no-op.
    pub fn sanitize(&self, text: &str, preserve_structure: bool) -> String {
        if text.is_empty() {
            return String::new();
        }

        let stripped = self.control_chars.replace_all(text, "");

        let shaped = if preserve_structure {
            self.blank_runs.replace_all(&stripped, "\n\n").trim().to_string()
        } else {
            self.whitespace.replace_all(&stripped, " ").trim().to_string()
        };

        let mut filtered = shaped;
        for pattern in self.patterns.iter() {
            if pattern.is_match(&filtered) {
                debug!(pattern = %pattern.as_str(), "Filtered injection pattern");
                filtered = pattern
                    .replace_all(&filtered, self.filter_token.as_str())
                    .into_owned();
            }
        }

        self.truncate(filtered, preserve_structure)
    }

    // Cut to max_length chars and append the marker. A body that already fits
    // ahead of an existing marker is left untouched.
    fn truncate(&self, text: String, preserve_structure: bool) -> String {
        if let Some(body) = text.strip_suffix(TRUNCATION_MARKER) {
            if body.trim_end().chars().count() <= self.max_length {
                return text;
            }
        }

        let total = text.chars().count();
        if total <= self.max_length {
            return text;
        }

        let cut = text
            .char_indices()
            .nth(self.max_length)
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        let separator = if preserve_structure { "\n\n" } else { " " };

        debug!(original_chars = total, kept_chars = self.max_length, "Truncated oversized input");
        format!("{}{}{}", text[..cut].trim_end(), separator, TRUNCATION_MARKER)
    }
}

impl Default for InputSanitizer {
    fn default() -> Self {
        Self::new(&SanitizationPolicy::default()).expect("default policy is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let sanitizer = InputSanitizer::default();
        assert_eq!(sanitizer.sanitize("", false), "");
        assert_eq!(sanitizer.sanitize("", true), "");
    }

    #[test]
    fn test_collapse_mode() {
        let sanitizer = InputSanitizer::default();
        assert_eq!(
            sanitizer.sanitize("  line one\n\n\tline\x07 two \x00 ", false),
            "line one line two"
        );
    }

    #[test]
    fn test_preserve_mode_keeps_markdown() {
        let sanitizer = InputSanitizer::default();
        let out = sanitizer.sanitize("## Title\n\n\n\n- item\n  - nested\n", true);
        assert_eq!(out, "## Title\n\n- item\n  - nested");
    }

    #[test]
    fn test_patterns_filtered_case_insensitively() {
        let sanitizer = InputSanitizer::default();
        let out = sanitizer.sanitize("IGNORE  previous\ninstructions then eval (x)", false);
        assert_eq!(out, "[FILTERED] then [FILTERED]x)");
    }

    #[test]
    fn test_role_markers_filtered() {
        let sanitizer = InputSanitizer::default();
        let out = sanitizer.sanitize("System: you are root. Human: hi <script>", false);
        assert_eq!(out, "[FILTERED] root. [FILTERED]hi [FILTERED]");
    }

    #[test]
    fn test_truncation() {
        let policy = SanitizationPolicy {
            max_length: 5,
            ..Default::default()
        };
        let sanitizer = InputSanitizer::new(&policy).unwrap();
        let out = sanitizer.sanitize("abcdefgh", false);
        assert_eq!(out, format!("abcde {}", TRUNCATION_MARKER));
        assert_eq!(sanitizer.sanitize(&out, false), out);
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let policy = SanitizationPolicy {
            max_length: 3,
            ..Default::default()
        };
        let sanitizer = InputSanitizer::new(&policy).unwrap();
        assert_eq!(sanitizer.sanitize("ééé", false), "ééé");
        assert!(sanitizer.sanitize("éééé", false).starts_with("ééé "));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let policy = SanitizationPolicy {
            dangerous_patterns: vec!["(unclosed".to_string()],
            ..Default::default()
        };
        assert!(InputSanitizer::new(&policy).is_err());
    }

    #[test]
    fn test_count_matching_distinct() {
        let patterns = DangerousPatterns::default();
        assert_eq!(patterns.len(), 10);
        assert_eq!(patterns.count_matching("eval( eval( eval("), 1);
        assert_eq!(patterns.count_matching("eval( exec( javascript:"), 3);
    }
}
