//! Core pipeline for incident log triage
//! this crate turns a raw log upload into canonical text, guards the prompt
//! boundary and splits the model's answer back into sections.
//! Everything here is pure and synchronous; the LLM round trip lives in `triage-llm`.

pub mod config;
pub mod format;
pub mod output;
pub mod parser;
pub mod sanitizer;
pub mod validator;

pub use config::{load_config, ConfigError, LlmSettings, TriageConfig};
pub use format::{detect, Format, LogSource};
pub use output::{OutputParser, ParsedAnalysis, METADATA_MARKER};
pub use parser::{parse_file, parse_log, ParseOutcome, ParserRegistry};
pub use sanitizer::{InputSanitizer, SanitizationPolicy};
pub use validator::{ContentValidator, Rejection, ValidationPolicy};
