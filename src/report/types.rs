use crate::runner::status::{TestStatus, TestSummary};
use serde::{Deserialize, Serialize};

/// Aggregate counters for one suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
}

/// Everything the report generators consume: one entry per test plus the
/// run-level summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResults {
    pub session_id: String,
    pub environment: String,
    pub platform: String,
    pub tests: Vec<TestSummary>,
    pub summary: RunSummary,
    pub generated_at: String,
}

impl RunResults {
    pub fn from_tests(
        session_id: &str,
        environment: &str,
        platform: &str,
        tests: Vec<TestSummary>,
    ) -> Self {
        let passed = tests
            .iter()
            .filter(|t| t.status == TestStatus::Passed)
            .count();
        let failed = tests.len() - passed;
        let total_duration_ms = tests.iter().map(|t| t.duration_ms).sum();

        Self {
            session_id: session_id.to_string(),
            environment: environment.to_string(),
            platform: platform.to_string(),
            summary: RunSummary {
                total: tests.len(),
                passed,
                failed,
                total_duration_ms,
            },
            tests,
            generated_at: chrono::Local::now().to_rfc3339(),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0
    }
}
