// Progress reporting for a single analysis run

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Fixed checkpoints reported by the engine
pub mod milestone {
    pub const INITIALIZING: u8 = 10;
    pub const SANITIZED: u8 = 20;
    pub const SENDING: u8 = 40;
    pub const PROCESSING: u8 = 80;
    pub const DONE: u8 = 100;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub percent: u8,
    pub message: String,
    pub processing: bool,
}

impl ProgressState {
    pub fn new(percent: u8, message: impl Into<String>) -> Self {
        let percent = percent.min(100);
        Self {
            percent,
            message: message.into(),
            processing: percent < 100,
        }
    }

    /// Before the first milestone: 0% and still processing
    pub fn queued() -> Self {
        Self::new(0, "Queued")
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::queued()
    }
}

/// Receives milestones synchronously on the analysing task.
/// Implementations must return quickly.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(u8, &str) + Send + Sync,
{
    fn report(&self, percent: u8, message: &str) {
        self(percent, message)
    }
}

/// Latest progress of one analysis, overwritten on every report.
/// Clones share the same state; give each analysis its own tracker.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    state: Arc<RwLock<ProgressState>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProgressState {
        match self.state.read() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProgressSink for ProgressTracker {
    fn report(&self, percent: u8, message: &str) {
        let next = ProgressState::new(percent, message);
        match self.state.write() {
            Ok(mut state) => *state = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_processing_flag() {
        assert!(ProgressState::new(80, "x").processing);
        assert!(!ProgressState::new(100, "done").processing);
        assert_eq!(ProgressState::new(250, "clamped").percent, 100);
        assert!(ProgressState::queued().processing);
    }

    #[test]
    fn test_fresh_tracker_is_processing() {
        let state = ProgressTracker::new().snapshot();
        assert_eq!(state.percent, 0);
        assert_eq!(state.processing, state.percent < 100);
    }

    #[test]
    fn test_tracker_overwrites() {
        let tracker = ProgressTracker::new();
        let shared = tracker.clone();

        tracker.report(40, "Sending");
        assert_eq!(shared.snapshot(), ProgressState::new(40, "Sending"));

        tracker.report(100, "Analysis complete");
        let state = shared.snapshot();
        assert_eq!(state.message, "Analysis complete");
        assert!(!state.processing);
    }

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |p: u8, m: &str| seen.lock().unwrap().push((p, m.to_string()));
        sink.report(10, "Initializing");
        sink.report(20, "Sanitized");
        assert_eq!(seen.lock().unwrap().len(), 2);
    }
}
