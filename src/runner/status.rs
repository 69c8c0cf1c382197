use serde::{Deserialize, Serialize};

/// Canonical closing step label stamped by `finalize_test` when a test
/// reaches the end without any recorded failure.
pub const CLOSING_STEP: &str = "Booking flow completed";

/// Overall outcome of a single test.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    Passed,
    Failed,
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "PASSED"),
            TestStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Mutable per-test record threaded through every wrapped step.
///
/// Exactly one instance exists per running test. The step orchestrator
/// updates `current_step` before each step runs, so a crash mid-step still
/// identifies which step failed.
#[derive(Debug, Clone, Default)]
pub struct StatusRecord {
    pub success: bool,
    pub failure_reason: String,
    pub current_step: String,
}

impl StatusRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for the named step. The reason sticks; later steps
    /// cannot silently clear it.
    pub fn record_failure(&mut self, step: &str, message: &str) {
        self.failure_reason = format!("Failed at step '{}': {}", step, message);
        self.success = false;
    }

    /// Mark the test successful. Refused while a failure reason is set;
    /// use [`StatusRecord::override_success`] to clear a recorded failure.
    pub fn mark_success(&mut self) {
        if self.failure_reason.is_empty() {
            self.success = true;
        }
    }

    /// Explicitly flip the record to successful, discarding any recorded
    /// failure reason.
    pub fn override_success(&mut self) {
        self.failure_reason.clear();
        self.success = true;
    }

    pub fn has_failed(&self) -> bool {
        !self.failure_reason.is_empty()
    }

    pub fn status(&self) -> TestStatus {
        if self.success {
            TestStatus::Passed
        } else {
            TestStatus::Failed
        }
    }
}

/// Immutable snapshot of a completed test, persisted as JSON in the run
/// folder and aggregated into the run results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    pub name: String,
    pub status: TestStatus,
    pub failure_reason: String,
    pub last_step: String,
    pub duration_ms: u64,
    pub environment: String,
    pub browser: String,
    pub test_data: serde_json::Value,
    /// File name of the end-of-test screenshot inside the run folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    pub started_at: String,
    pub finished_at: String,
}
