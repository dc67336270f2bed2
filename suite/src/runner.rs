//! Executes cases in isolation and folds the outcomes into a report.
//!
//! Every case runs in its own tokio task under the configured timeout, so
//! a panicking case is reported as an error and a wedged case as a
//! timeout; neither takes the runner down and nothing hangs silently.

use crate::case::{Case, CaseContext};
use crate::config::RunnerConfig;
use crate::registry::SuiteRegistry;
use crate::report::{CaseOutcome, CaseStatus, RunReport};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

/// Runs registered cases under one configuration
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every case in the registry, optionally filtered by substring
    pub async fn run(&self, registry: &SuiteRegistry, filter: Option<&str>) -> RunReport {
        let session_id = Uuid::new_v4();
        let started_at = Utc::now();
        let cases = match filter {
            Some(filter) => registry.matching(filter),
            None => registry.list(),
        };
        info!(session = %session_id, cases = cases.len(), "suite run started");

        let mut outcomes = Vec::with_capacity(cases.len());
        for case in cases {
            let outcome = self.run_case(case).await;
            let stop = !outcome.passed() && self.config.fail_fast;
            outcomes.push(outcome);
            if stop {
                warn!("fail-fast: stopping after first failing case");
                break;
            }
        }

        let report = RunReport::new(session_id, started_at, outcomes);
        info!(
            session = %session_id,
            passed = report.summary.passed,
            total = report.summary.total,
            "suite run finished"
        );
        report
    }

    /// Run a single case to an outcome
    pub async fn run_case(&self, case: Arc<dyn Case>) -> CaseOutcome {
        let name = case.name().to_string();
        let ctx = CaseContext {
            config: self.config.clone(),
            scratch_dir: self.config.scratch_root.join(&name),
        };
        if let Err(error) = std::fs::create_dir_all(&ctx.scratch_dir) {
            return CaseOutcome {
                name,
                status: CaseStatus::Errored,
                message: Some(format!("could not create scratch dir: {error}")),
                duration: std::time::Duration::ZERO,
            };
        }

        info!(case = %name, "running");
        let started = Instant::now();
        let handle = tokio::spawn(async move { case.run(&ctx).await });
        let abort = handle.abort_handle();

        let (status, message) = match timeout(self.config.case_timeout, handle).await {
            Err(_) => {
                abort.abort();
                (
                    CaseStatus::TimedOut,
                    Some(format!(
                        "case exceeded the {:?} timeout",
                        self.config.case_timeout
                    )),
                )
            }
            Ok(Err(join_error)) => {
                let message = if join_error.is_panic() {
                    format!("case panicked: {join_error}")
                } else {
                    format!("case task failed: {join_error}")
                };
                (CaseStatus::Errored, Some(message))
            }
            Ok(Ok(Err(error))) if error.is_check() => {
                (CaseStatus::Failed, Some(error.to_string()))
            }
            Ok(Ok(Err(error))) => (CaseStatus::Errored, Some(error.to_string())),
            Ok(Ok(Ok(()))) => (CaseStatus::Passed, None),
        };

        let duration = started.elapsed();
        match &status {
            CaseStatus::Passed => info!(case = %name, ?duration, "passed"),
            _ => warn!(case = %name, ?duration, ?message, "did not pass"),
        }
        CaseOutcome {
            name,
            status,
            message,
            duration,
        }
    }
}
