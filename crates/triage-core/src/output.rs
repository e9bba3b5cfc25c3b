//! Split a model answer into reasoning, step analysis, TLDR and metadata.
//!
//! Each section is found by an ordered list of named extractors; the first
//! extractor that matches wins and its span is cut from the working text.
//! Whatever is left over is the step analysis.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

pub const METADATA_MARKER: &str = "--- ANALYSIS METADATA ---";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAnalysis {
    pub thinking: String,
    pub step_analysis: String,
    pub tldr: String,
    pub metadata: String,
    pub raw_output: String,
}

/// A named pattern whose `body` group is the section content
pub struct SectionExtractor {
    pub name: &'static str,
    regex: Regex,
}

impl SectionExtractor {
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            regex: Regex::new(pattern)?,
        })
    }

    fn builtin(name: &'static str, pattern: &str) -> Self {
        Self::new(name, pattern).unwrap()
    }

    /// Span to remove and the trimmed content. A `tail` group marks a
    /// terminator (such as a following `---` line) that stays in the text.
    pub fn extract(&self, text: &str) -> Option<(Range<usize>, String)> {
        let caps = self.regex.captures(text)?;
        let whole = caps.get(0)?;
        let body = caps.name("body")?;
        let end = caps.name("tail").map(|t| t.start()).unwrap_or(whole.end());
        Some((whole.start()..end, body.as_str().trim().to_string()))
    }
}

fn think_extractors() -> Vec<SectionExtractor> {
    vec![
        SectionExtractor::builtin("think", r"(?is)<think>(?P<body>.*?)</think>"),
        SectionExtractor::builtin("thinking", r"(?is)<thinking>(?P<body>.*?)</thinking>"),
        SectionExtractor::builtin(
            "any-reasoning-tag",
            r"(?is)<\s*(?:think|thinking|reasoning)\s*>(?P<body>.*?)<\s*/\s*(?:think|thinking|reasoning)\s*>",
        ),
    ]
}

// TLDR body runs to the next line starting with `---` or the end of the text.
// The tail anchors on a line start so an empty body still stops there.
fn tldr_extractors() -> Vec<SectionExtractor> {
    vec![
        SectionExtractor::builtin(
            "bold-label",
            r"(?is)\*\*\s*TL;?DR\s*:?\s*\*\*\s*:?(?P<body>.*?)(?P<tail>(?m:^)[ \t]*---|\z)",
        ),
        SectionExtractor::builtin(
            "heading-blank-line",
            r"(?im)^[ \t]*#{1,6}[ \t]*(?:📋[ \t]*)?TL;?DR[^\n]*\n[ \t]*\n(?P<body>(?s:.*?))(?P<tail>(?m:^)[ \t]*---|\z)",
        ),
        SectionExtractor::builtin(
            "heading",
            r"(?im)^[ \t]*#{1,6}[ \t]*(?:📋[ \t]*)?TL;?DR[^\n]*\n(?P<body>(?s:.*?))(?P<tail>(?m:^)[ \t]*---|\z)",
        ),
        SectionExtractor::builtin(
            "plain-label",
            r"(?im)^[ \t]*TL;?DR[ \t]*:(?P<body>(?s:.*?))(?P<tail>(?m:^)[ \t]*---|\z)",
        ),
    ]
}

pub struct OutputParser {
    think: Vec<SectionExtractor>,
    tldr: Vec<SectionExtractor>,
}

impl OutputParser {
    pub fn new() -> Self {
        Self {
            think: think_extractors(),
            tldr: tldr_extractors(),
        }
    }

    pub fn with_extractors(think: Vec<SectionExtractor>, tldr: Vec<SectionExtractor>) -> Self {
        Self { think, tldr }
    }

    pub fn parse(&self, analysis: &str) -> ParsedAnalysis {
        if analysis.is_empty() {
            return ParsedAnalysis::default();
        }

        let mut working = analysis.to_string();
        let mut found_any = false;

        let thinking = match first_match(&self.think, &working) {
            Some((span, body)) => {
                working.replace_range(span, "");
                found_any = true;
                body
            }
            None => String::new(),
        };

        let tldr = match first_match(&self.tldr, &working) {
            Some((span, body)) => {
                working.replace_range(span, "");
                found_any = true;
                body
            }
            None => String::new(),
        };

        // last marker wins, the engine appends its trailer at the very end
        let metadata = match working.rfind(METADATA_MARKER) {
            Some(pos) => {
                let meta = working[pos + METADATA_MARKER.len()..].trim().to_string();
                working.truncate(pos);
                found_any = true;
                meta
            }
            None => String::new(),
        };

        let mut step_analysis = working.trim().to_string();
        if !found_any || (thinking.is_empty() && tldr.is_empty() && step_analysis.is_empty()) {
            step_analysis = analysis.to_string();
        }

        ParsedAnalysis {
            thinking,
            step_analysis,
            tldr,
            metadata,
            raw_output: analysis.to_string(),
        }
    }
}

impl Default for OutputParser {
    fn default() -> Self {
        Self::new()
    }
}

fn first_match(extractors: &[SectionExtractor], text: &str) -> Option<(Range<usize>, String)> {
    extractors.iter().find_map(|e| e.extract(text))
}
