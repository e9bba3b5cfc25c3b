// Analysis engine
// Orchestrates: Validation -> Sanitization -> Prompt -> LLM round trip -> Sanitized answer + metadata

use std::time::Instant;

use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use triage_core::{
    ConfigError, ContentValidator, InputSanitizer, LlmSettings, Rejection, TriageConfig,
    METADATA_MARKER,
};

use crate::client::{ChatCompletionsClient, LlmClient, LlmError};
use crate::progress::{milestone, ProgressSink};
use crate::prompt;

pub const NO_RESPONSE: &str = "No response received from LLM";

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Security validation failed: {0}")]
    Rejected(#[from] Rejection),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Trailer appended under the metadata marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub model: String,
    pub elapsed_secs: f64,
    pub input_chars: usize,
    pub validation: String,
    pub timestamp: String,
}

impl AnalysisMetadata {
    pub fn render(&self) -> String {
        format!(
            "{}\nModel: {}\nProcessing Time: {:.2} seconds\nInput Size: {} characters\nSecurity Validation: {}\nTimestamp: {}",
            METADATA_MARKER,
            self.model,
            self.elapsed_secs,
            self.input_chars,
            self.validation,
            self.timestamp
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Sanitized model answer followed by the metadata trailer
    pub text: String,
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub status: ConnectionStatus,
    pub response_time_ms: u128,
    pub model: String,
    pub response: Option<String>,
    pub validation_passed: bool,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn report(progress: Option<&dyn ProgressSink>, percent: u8, message: &str) {
    if let Some(sink) = progress {
        sink.report(percent, message);
    }
}

fn now_stamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// main analysis engine
pub struct AnalysisEngine {
    client: Box<dyn LlmClient>,
    settings: LlmSettings,
    sanitizer: InputSanitizer,
    validator: ContentValidator,
}

impl AnalysisEngine {
    pub fn new(client: Box<dyn LlmClient>, config: &TriageConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client,
            settings: config.llm.clone(),
            sanitizer: InputSanitizer::new(&config.sanitization)?,
            validator: ContentValidator::from_policies(&config.validation, &config.sanitization)?,
        })
    }

    /// Engine talking to the configured chat completions endpoint
    pub fn from_config(config: &TriageConfig) -> Result<Self, AnalysisError> {
        let client = ChatCompletionsClient::from_settings(&config.llm)?;
        Ok(Self::new(Box::new(client), config)?)
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    /// One analysis round trip with a tagged result. Progress milestones are
    /// reported synchronously; 100% is always the last report.
    pub async fn run(
        &self,
        log_text: &str,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<AnalysisReport, AnalysisError> {
        let started = Instant::now();
        report(progress, milestone::INITIALIZING, "Initializing secure analysis");

        if let Err(rejection) = self.validator.validate(log_text) {
            warn!(reason = %rejection, "Analysis rejected before LLM call");
            report(
                progress,
                milestone::DONE,
                &format!("Security validation failed: {}", rejection),
            );
            return Err(rejection.into());
        }

        let sanitized = self.sanitizer.sanitize(log_text, false);
        let input_chars = sanitized.chars().count();
        report(progress, milestone::SANITIZED, "Input sanitization complete");
        debug!(raw_chars = log_text.chars().count(), input_chars, "Sanitized log data");

        let request = prompt::analysis_request(&sanitized, &self.settings);
        report(progress, milestone::SENDING, "Sending secure request to LLM");

        let reply = match self.client.complete(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(model = %self.client.model(), error = %e, "LLM request failed");
                report(progress, milestone::DONE, &format!("Error: {}", e));
                return Err(e.into());
            }
        };
        report(progress, milestone::PROCESSING, "Processing LLM response");

        let reply = if reply.trim().is_empty() {
            NO_RESPONSE.to_string()
        } else {
            reply
        };
        let cleaned = self.sanitizer.sanitize(&reply, true);

        let metadata = AnalysisMetadata {
            model: self.client.model().to_string(),
            elapsed_secs: started.elapsed().as_secs_f64(),
            input_chars,
            validation: "Passed".to_string(),
            timestamp: now_stamp(),
        };
        let text = format!("{}\n\n{}", cleaned, metadata.render());

        info!(
            model = %metadata.model,
            input_chars,
            elapsed_secs = metadata.elapsed_secs,
            "Analysis complete"
        );
        report(progress, milestone::DONE, "Analysis complete");

        Ok(AnalysisReport { text, metadata })
    }

    /// Analysis as display text. Never fails: rejections and LLM errors come
    /// back as readable messages.
    pub async fn analyze(&self, log_text: &str, progress: Option<&dyn ProgressSink>) -> String {
        match self.run(log_text, progress).await {
            Ok(report) => report.text,
            Err(e) => self.describe_error(&e),
        }
    }

    pub fn describe_error(&self, e: &AnalysisError) -> String {
        match e {
            AnalysisError::Rejected(rejection) => {
                format!("Security validation failed: {}", rejection)
            }
            other => format!(
                "Error analyzing logs: {}\n\nPlease ensure the local LLM service is running and reachable at {} with model '{}' available.",
                other,
                self.settings.base_url,
                self.client.model()
            ),
        }
    }

    /// Probe the endpoint with a fixed prompt and time the round trip
    pub async fn validate_connection(&self) -> ConnectionReport {
        let started = Instant::now();
        let result = self.client.complete(&prompt::probe_request()).await;
        let response_time_ms = started.elapsed().as_millis();

        match result {
            Ok(reply) => {
                let validation_passed = reply
                    .to_lowercase()
                    .contains(&prompt::PROBE_EXPECTED.to_lowercase());
                info!(response_time_ms, validation_passed, "LLM connection check");
                ConnectionReport {
                    status: ConnectionStatus::Connected,
                    response_time_ms,
                    model: self.client.model().to_string(),
                    response: Some(reply.trim().to_string()),
                    validation_passed,
                    timestamp: now_stamp(),
                    error: None,
                }
            }
            Err(e) => {
                error!(error = %e, "LLM connection check failed");
                ConnectionReport {
                    status: ConnectionStatus::Error,
                    response_time_ms,
                    model: self.client.model().to_string(),
                    response: None,
                    validation_passed: false,
                    timestamp: now_stamp(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_render() {
        let metadata = AnalysisMetadata {
            model: "llama3.2:3b".to_string(),
            elapsed_secs: 1.23456,
            input_chars: 42,
            validation: "Passed".to_string(),
            timestamp: "2026-01-01 00:00:00".to_string(),
        };
        assert_eq!(
            metadata.render(),
            "--- ANALYSIS METADATA ---\nModel: llama3.2:3b\nProcessing Time: 1.23 seconds\nInput Size: 42 characters\nSecurity Validation: Passed\nTimestamp: 2026-01-01 00:00:00"
        );
    }

    #[test]
    fn test_from_config_builds() {
        let engine = AnalysisEngine::from_config(&TriageConfig::default()).unwrap();
        assert_eq!(engine.model(), "llama3.2:3b");
    }
}
