//! The built-in conformance cases, one module per verified contract.

pub mod dialog;
pub mod geometry;
pub mod input;
pub mod lifecycle;
pub mod snapshot;
pub mod state;
pub mod stubs;
pub mod transfer;
pub mod units;
pub mod worker;
