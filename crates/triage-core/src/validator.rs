// Content validation - reject input before it ever reaches the model

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::ConfigError;
use crate::sanitizer::{DangerousPatterns, SanitizationPolicy};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Empty log data provided")]
    Empty,

    #[error("Log data too short for meaningful analysis ({chars} characters, minimum {min})")]
    TooShort { chars: usize, min: usize },

    // heuristic cutoff, see ValidationPolicy::max_suspicious_patterns
    #[error("Log data contains suspicious content patterns ({matched} distinct injection patterns)")]
    Suspicious { matched: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Minimum trimmed length in characters
    pub min_length: usize,
    /// Reject when more than this many distinct injection patterns occur.
    /// A tunable circuit breaker, not a security boundary.
    pub max_suspicious_patterns: usize,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_length: 10,
            max_suspicious_patterns: 2,
        }
    }
}

pub struct ContentValidator {
    policy: ValidationPolicy,
    patterns: DangerousPatterns,
}

impl ContentValidator {
    pub fn new(policy: ValidationPolicy, patterns: DangerousPatterns) -> Self {
        Self { policy, patterns }
    }

    pub fn from_policies(
        validation: &ValidationPolicy,
        sanitization: &SanitizationPolicy,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            validation.clone(),
            DangerousPatterns::compile(&sanitization.dangerous_patterns)?,
        ))
    }

    /// Check raw (unsanitized) text
    pub fn validate(&self, text: &str) -> Result<(), Rejection> {
        if text.is_empty() {
            return Err(Rejection::Empty);
        }

        let chars = text.trim().chars().count();
        if chars < self.policy.min_length {
            return Err(Rejection::TooShort {
                chars,
                min: self.policy.min_length,
            });
        }

        let matched = self.patterns.count_matching(text);
        if matched > self.policy.max_suspicious_patterns {
            warn!(matched, limit = self.policy.max_suspicious_patterns, "Rejected suspicious log data");
            return Err(Rejection::Suspicious { matched });
        }

        Ok(())
    }
}

impl Default for ContentValidator {
    fn default() -> Self {
        Self::new(ValidationPolicy::default(), DangerousPatterns::default())
    }
}
