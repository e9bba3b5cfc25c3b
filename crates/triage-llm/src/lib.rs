// Triage LLM - prompt construction, chat completions and the analysis engine

pub mod client;
pub mod engine;
pub mod progress;
pub mod prompt;

pub use client::{ChatCompletionsClient, ChatMessage, ChatRequest, LlmClient, LlmError, Role};
pub use engine::{AnalysisEngine, AnalysisError, AnalysisMetadata, AnalysisReport, ConnectionReport, ConnectionStatus};
pub use progress::{ProgressSink, ProgressState, ProgressTracker};
