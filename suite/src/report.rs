//! Run reports: per-case outcomes plus a summary, serializable to JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Terminal state of one case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    Passed,
    /// A check failed (expected-versus-actual mismatch)
    Failed,
    /// An unexpected error or panic escaped the case
    Errored,
    /// The case exceeded the configured timeout
    TimedOut,
}

/// Outcome of one case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub name: String,
    pub status: CaseStatus,
    /// Failure or error message; absent on pass
    pub message: Option<String>,
    pub duration: Duration,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }
}

/// Counts per terminal state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub timed_out: usize,
}

impl Summary {
    fn tally(outcomes: &[CaseOutcome]) -> Self {
        let mut summary = Summary {
            total: outcomes.len(),
            ..Summary::default()
        };
        for outcome in outcomes {
            match outcome.status {
                CaseStatus::Passed => summary.passed += 1,
                CaseStatus::Failed => summary.failed += 1,
                CaseStatus::Errored => summary.errored += 1,
                CaseStatus::TimedOut => summary.timed_out += 1,
            }
        }
        summary
    }
}

/// Everything one suite run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<CaseOutcome>,
    pub summary: Summary,
}

impl RunReport {
    pub fn new(
        session_id: Uuid,
        started_at: DateTime<Utc>,
        outcomes: Vec<CaseOutcome>,
    ) -> Self {
        let summary = Summary::tally(&outcomes);
        Self {
            session_id,
            started_at,
            finished_at: Utc::now(),
            outcomes,
            summary,
        }
    }

    /// Whether every case passed
    pub fn passed(&self) -> bool {
        self.summary.total == self.summary.passed
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable rendering for the CLI
    pub fn render(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            let marker = match outcome.status {
                CaseStatus::Passed => "PASS",
                CaseStatus::Failed => "FAIL",
                CaseStatus::Errored => "ERROR",
                CaseStatus::TimedOut => "TIMEOUT",
            };
            out.push_str(&format!(
                "{:<8} {:<22} {:>8.1?}\n",
                marker, outcome.name, outcome.duration
            ));
            if let Some(message) = &outcome.message {
                out.push_str(&format!("         {}\n", message));
            }
        }
        out.push_str(&format!(
            "\n{} total, {} passed, {} failed, {} errored, {} timed out (session {})\n",
            self.summary.total,
            self.summary.passed,
            self.summary.failed,
            self.summary.errored,
            self.summary.timed_out,
            self.session_id
        ));
        out
    }
}
