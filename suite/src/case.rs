//! The case contract and its failure taxonomy.
//!
//! A case either passes, fails a check (expected-versus-actual mismatch,
//! carrying a descriptive message), or errors (anything unexpected bubbling
//! out of the runtime or harness). The runner maps that distinction onto
//! its outcome report; a case never recovers from its own failure.

use crate::config::RunnerConfig;
use async_trait::async_trait;
use runtime::host::HostError;
use runtime::snapshot::SnapshotError;
use runtime::transfer::TransferError;
use runtime::worker::WorkerError;
use std::fmt::Debug;
use std::path::PathBuf;
use testkit::{CaptureError, PollError};
use thiserror::Error;

/// Why a case did not pass
#[derive(Error, Debug)]
pub enum CaseError {
    /// An asserted expectation did not hold
    #[error("check failed: {message}")]
    Check { message: String },

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaseError {
    /// Check failures are assertion mismatches; everything else is an
    /// unexpected error.
    pub fn is_check(&self) -> bool {
        matches!(self, CaseError::Check { .. })
    }
}

pub type CaseResult = Result<(), CaseError>;

/// Fail with `message` unless `condition` holds
pub fn check(condition: bool, message: impl Into<String>) -> CaseResult {
    if condition {
        Ok(())
    } else {
        Err(CaseError::Check {
            message: message.into(),
        })
    }
}

/// Fail unless `actual == expected`, naming what was compared
pub fn check_eq<T: Debug + PartialEq>(actual: T, expected: T, what: &str) -> CaseResult {
    if actual == expected {
        Ok(())
    } else {
        Err(CaseError::Check {
            message: format!("{what}: expected {expected:?}, got {actual:?}"),
        })
    }
}

/// Fail unless `actual != unexpected`
pub fn check_ne<T: Debug + PartialEq>(actual: T, unexpected: T, what: &str) -> CaseResult {
    if actual != unexpected {
        Ok(())
    } else {
        Err(CaseError::Check {
            message: format!("{what}: did not expect {unexpected:?}"),
        })
    }
}

/// Everything a case needs from its environment
#[derive(Debug, Clone)]
pub struct CaseContext {
    pub config: RunnerConfig,
    /// Per-case scratch directory, created by the runner
    pub scratch_dir: PathBuf,
}

/// One conformance case
#[async_trait]
pub trait Case: Send + Sync {
    /// Stable, filterable name (kebab-case)
    fn name(&self) -> &str;

    /// One line shown by `list`
    fn description(&self) -> &str;

    async fn run(&self, ctx: &CaseContext) -> CaseResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_builds_descriptive_messages() {
        assert!(check(true, "never shown").is_ok());

        let err = check_eq(3, 4, "row count").unwrap_err();
        assert!(err.is_check());
        assert_eq!(
            err.to_string(),
            "check failed: row count: expected 4, got 3"
        );

        let err = check_ne("a", "a", "status").unwrap_err();
        assert!(err.to_string().contains("did not expect"));
    }

    #[test]
    fn wrapped_errors_are_not_checks() {
        let err = CaseError::from(WorkerError::IdleTimeout {
            waited: std::time::Duration::from_secs(1),
        });
        assert!(!err.is_check());
    }
}
