//! Callback capture: the shared journal stub components record into.
//!
//! A [`CallbackLog`] is created by the test, handed to the stub component
//! under test, and read back by the assertion phase. It replaces the static
//! flag pattern: state is per-test and injected, so nothing leaks across
//! tests. Recording is cheap and callable from any thread, including
//! threads that are not part of the tokio runtime; waiting is async and
//! always bounded by a timeout.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::{timeout, Instant};
use tracing::debug;

/// Errors surfaced by capture waits
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The awaited event did not fire (often enough) before the deadline
    #[error(
        "timed out after {waited:?} waiting for '{event}' \
         (expected at least {expected} occurrence(s), observed {observed})"
    )]
    Timeout {
        event: String,
        expected: u64,
        observed: u64,
        waited: Duration,
    },
}

/// One recorded callback invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Position in the journal, starting at 0
    pub seq: u64,
    /// Event name, chosen by the stub (e.g. `"on_create"`)
    pub event: String,
    /// Captured argument, if the stub recorded one
    pub payload: Option<Value>,
}

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<Entry>,
    counts: HashMap<String, u64>,
    next_seq: u64,
}

#[derive(Debug, Default)]
struct LogInner {
    state: Mutex<LogState>,
    notify: Notify,
}

/// Thread-safe journal of callback invocations.
///
/// Each tracked event moves from pending to fired on its first `record`;
/// further records only bump the count. A callback that is documented to
/// fire at most once but fires twice is not prevented here, only surfaced
/// through [`CallbackLog::count`].
///
/// Cloning is cheap and all clones share the same journal.
#[derive(Debug, Clone, Default)]
pub struct CallbackLog {
    inner: Arc<LogInner>,
}

impl CallbackLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one invocation of `event`.
    ///
    /// Wakes every waiter currently blocked in [`CallbackLog::await_event`]
    /// or [`CallbackLog::await_count`]. Safe to call from the host loop, a
    /// worker task, or a plain OS thread.
    pub fn record(&self, event: &str) {
        self.push(event, None);
    }

    /// Record one invocation of `event` together with a captured argument
    pub fn record_with(&self, event: &str, payload: Value) {
        self.push(event, Some(payload));
    }

    fn push(&self, event: &str, payload: Option<Value>) {
        {
            let mut state = match self.inner.state.lock() {
                Ok(state) => state,
                Err(poisoned) => poisoned.into_inner(),
            };
            let seq = state.next_seq;
            state.next_seq += 1;
            state.entries.push(Entry {
                seq,
                event: event.to_string(),
                payload,
            });
            *state.counts.entry(event.to_string()).or_insert(0) += 1;
        }
        debug!(event, "callback recorded");
        self.inner.notify.notify_waiters();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LogState> {
        match self.inner.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Number of times `event` has fired
    pub fn count(&self, event: &str) -> u64 {
        self.lock().counts.get(event).copied().unwrap_or(0)
    }

    /// Whether `event` has fired at least once
    pub fn was_called(&self, event: &str) -> bool {
        self.count(event) > 0
    }

    /// The most recently captured payload for `event`, if any
    pub fn payload(&self, event: &str) -> Option<Value> {
        self.lock()
            .entries
            .iter()
            .rev()
            .find(|e| e.event == event)
            .and_then(|e| e.payload.clone())
    }

    /// Every captured payload for `event`, in firing order
    pub fn payloads(&self, event: &str) -> Vec<Value> {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.event == event)
            .filter_map(|e| e.payload.clone())
            .collect()
    }

    /// Event names in firing order
    pub fn sequence(&self) -> Vec<String> {
        self.lock().entries.iter().map(|e| e.event.clone()).collect()
    }

    /// A snapshot of the full journal
    pub fn entries(&self) -> Vec<Entry> {
        self.lock().entries.clone()
    }

    /// Journal position of the first occurrence of `event`
    pub fn index_of(&self, event: &str) -> Option<usize> {
        self.lock().entries.iter().position(|e| e.event == event)
    }

    /// Whether the first occurrence of `earlier` precedes the first
    /// occurrence of `later`. Returns `false` if either never fired.
    pub fn fired_before(&self, earlier: &str, later: &str) -> bool {
        match (self.index_of(earlier), self.index_of(later)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }

    /// Discard the journal. For reuse in a setup block; a fresh instance
    /// per test is still the preferred pattern.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.counts.clear();
        state.next_seq = 0;
    }

    /// Block until `event` has fired at least once, or until `wait`
    /// elapses.
    ///
    /// An event that fired before this call returns immediately; the
    /// journal acts as a latch, not a plain flag check.
    pub async fn await_event(&self, event: &str, wait: Duration) -> Result<(), CaptureError> {
        self.await_count(event, 1, wait).await.map(|_| ())
    }

    /// Block until `event` has fired at least `expected` times, or until
    /// `wait` elapses. Returns the observed count on success.
    pub async fn await_count(
        &self,
        event: &str,
        expected: u64,
        wait: Duration,
    ) -> Result<u64, CaptureError> {
        let deadline = Instant::now() + wait;
        loop {
            // Register the waiter before checking the count so a record
            // landing between the check and the await still wakes us.
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let observed = self.count(event);
            if observed >= expected {
                return Ok(observed);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(CaptureError::Timeout {
                    event: event.to_string(),
                    expected,
                    observed,
                    waited: wait,
                });
            }

            if timeout(deadline - now, notified).await.is_err() {
                let observed = self.count(event);
                if observed >= expected {
                    return Ok(observed);
                }
                return Err(CaptureError::Timeout {
                    event: event.to_string(),
                    expected,
                    observed,
                    waited: wait,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::assert_ok;

    const WAIT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn await_returns_immediately_when_event_already_fired() {
        let log = CallbackLog::new();
        log.record("on_create");
        assert_ok!(log.await_event("on_create", Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn await_wakes_on_record_from_another_thread() {
        let log = CallbackLog::new();
        let writer = log.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            writer.record("on_receive");
        });
        log.await_event("on_receive", WAIT).await.unwrap();
        handle.join().unwrap();
        assert_eq!(log.count("on_receive"), 1);
    }

    #[tokio::test]
    async fn await_count_accumulates() {
        let log = CallbackLog::new();
        let writer = log.clone();
        tokio::spawn(async move {
            for _ in 0..3 {
                tokio::time::sleep(Duration::from_millis(10)).await;
                writer.record("on_handle");
            }
        });
        let observed = log.await_count("on_handle", 3, WAIT).await.unwrap();
        assert_eq!(observed, 3);
    }

    #[tokio::test]
    async fn timeout_reports_event_and_counts() {
        let log = CallbackLog::new();
        log.record("on_pause");
        let err = log
            .await_count("on_pause", 2, Duration::from_millis(50))
            .await
            .unwrap_err();
        let CaptureError::Timeout {
            event,
            expected,
            observed,
            ..
        } = err;
        assert_eq!(event, "on_pause");
        assert_eq!(expected, 2);
        assert_eq!(observed, 1);
    }

    #[tokio::test]
    async fn concurrent_waiters_all_wake() {
        let log = CallbackLog::new();
        let waits = (0..4).map(|_| {
            let log = log.clone();
            async move { log.await_event("go", WAIT).await }
        });
        let writer = log.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.record("go");
        });
        for result in futures::future::join_all(waits).await {
            result.unwrap();
        }
    }

    #[test]
    fn journal_preserves_order_and_payloads() {
        let log = CallbackLog::new();
        log.record("on_create");
        log.record_with("on_save_state", json!({ "counter": 7 }));
        log.record("on_destroy");

        assert_eq!(log.sequence(), vec!["on_create", "on_save_state", "on_destroy"]);
        assert_eq!(log.payload("on_save_state"), Some(json!({ "counter": 7 })));
        assert!(log.payload("on_create").is_none());
        assert!(log.fired_before("on_create", "on_destroy"));
        assert!(!log.fired_before("on_destroy", "on_create"));
        assert_eq!(log.index_of("on_destroy"), Some(2));
        assert_eq!(log.index_of("on_start"), None);
    }

    #[test]
    fn reset_discards_everything() {
        let log = CallbackLog::new();
        log.record("on_create");
        log.record("on_create");
        assert_eq!(log.count("on_create"), 2);

        log.reset();
        assert_eq!(log.count("on_create"), 0);
        assert!(log.sequence().is_empty());
        assert!(log.entries().is_empty());
    }

    #[test]
    fn repeated_payloads_are_kept_in_order() {
        let log = CallbackLog::new();
        log.record_with("on_key_down", json!({ "code": "Digit0" }));
        log.record_with("on_key_down", json!({ "code": "Back" }));

        let payloads = log.payloads("on_key_down");
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0], json!({ "code": "Digit0" }));
        assert_eq!(log.payload("on_key_down"), Some(json!({ "code": "Back" })));
    }
}
