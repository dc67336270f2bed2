//! Test harness primitives for verifying callback-driven host runtimes.
//!
//! The two building blocks are [`CallbackLog`], a thread-safe journal that
//! stub components record their callback invocations into, and the bounded
//! polling helpers in [`poll`], used for conditions that are not naturally
//! expressed as a single awaited event. Every wait in this crate carries an
//! explicit timeout; a timeout surfaces as a descriptive error rather than
//! a hang or a silent pass.

pub mod capture;
pub mod poll;

pub use capture::{CallbackLog, CaptureError, Entry};
pub use poll::{
    poll_until, poll_until_async, poll_until_with, PollError, DEFAULT_POLL_INTERVAL,
    DEFAULT_POLL_TIMEOUT,
};
