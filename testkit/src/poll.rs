//! Bounded polling for conditions that are not a single awaited event.
//!
//! Covers the "queue has exactly one matching row" style of check: the
//! predicate is re-evaluated on a fixed interval until it holds or the
//! deadline passes. The loop always checks the predicate once more after
//! the final sleep, so a condition that becomes true right at the deadline
//! still passes.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};

/// Interval between predicate evaluations unless overridden
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Overall deadline unless overridden
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(3);

/// Errors surfaced by polling waits
#[derive(Error, Debug)]
pub enum PollError {
    /// The condition never held within the deadline
    #[error("condition not met within {waited:?} (polled every {interval:?})")]
    ConditionTimeout {
        waited: Duration,
        interval: Duration,
    },
}

/// Poll `predicate` every [`DEFAULT_POLL_INTERVAL`] until it returns
/// `true` or `wait` elapses.
pub async fn poll_until<F>(predicate: F, wait: Duration) -> Result<(), PollError>
where
    F: FnMut() -> bool,
{
    poll_until_with(predicate, wait, DEFAULT_POLL_INTERVAL).await
}

/// Poll `predicate` every `interval` until it returns `true` or `wait`
/// elapses.
pub async fn poll_until_with<F>(
    mut predicate: F,
    wait: Duration,
    interval: Duration,
) -> Result<(), PollError>
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + wait;
    loop {
        if predicate() {
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(PollError::ConditionTimeout {
                waited: wait,
                interval,
            });
        }
        sleep(interval.min(deadline - now)).await;
    }
}

/// Like [`poll_until_with`], for predicates that must await.
pub async fn poll_until_async<F, Fut>(
    mut predicate: F,
    wait: Duration,
    interval: Duration,
) -> Result<(), PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + wait;
    loop {
        if predicate().await {
            return Ok(());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(PollError::ConditionTimeout {
                waited: wait,
                interval,
            });
        }
        sleep(interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn immediate_success_does_not_sleep() {
        let start = Instant::now();
        poll_until(|| true, Duration::from_secs(5)).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn condition_becoming_true_is_seen() {
        let flag = Arc::new(AtomicBool::new(false));
        let setter = flag.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(40)).await;
            setter.store(true, Ordering::SeqCst);
        });
        poll_until_with(
            || flag.load(Ordering::SeqCst),
            Duration::from_secs(2),
            Duration::from_millis(10),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn timeout_is_an_error_not_a_hang() {
        let calls = AtomicU32::new(0);
        let err = poll_until_with(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                false
            },
            Duration::from_millis(80),
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();
        let PollError::ConditionTimeout { waited, interval } = err;
        assert_eq!(waited, Duration::from_millis(80));
        assert_eq!(interval, Duration::from_millis(20));
        // checked at least at start and deadline
        assert!(calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn async_predicate_is_supported() {
        let count = Arc::new(AtomicU32::new(0));
        let seen = count.clone();
        poll_until_async(
            move || {
                let seen = seen.clone();
                async move { seen.fetch_add(1, Ordering::SeqCst) >= 2 }
            },
            Duration::from_secs(1),
            Duration::from_millis(5),
        )
        .await
        .unwrap();
        assert!(count.load(Ordering::SeqCst) >= 3);
    }
}
