//! Conformance suite for the reference host runtime.
//!
//! Cases drive the runtime through its documented contracts using the
//! capture harness from `testkit`, and the [`runner::Runner`] executes
//! them in isolation with the failure taxonomy the report exposes:
//! a failed check, an unexpected error, or a timeout. Nothing hangs.

pub mod case;
pub mod cases;
pub mod config;
pub mod registry;
pub mod report;
pub mod runner;

pub use case::{check, check_eq, check_ne, Case, CaseContext, CaseError, CaseResult};
pub use config::{ConfigError, RunnerConfig};
pub use registry::{default_registry, SuiteRegistry};
pub use report::{CaseOutcome, CaseStatus, RunReport, Summary};
pub use runner::Runner;
