//! Queue workers: services that drain a job queue and stop themselves.
//!
//! A [`WorkerRunner`] holds a factory rather than a service instance: the
//! first `submit` after idle builds a fresh instance and spawns its worker
//! task, mirroring start-on-demand service semantics. Jobs are handled one
//! at a time in submission order; when the queue is empty the instance is
//! destroyed and no further `on_handle` can reach it. The drain-or-keep
//! decision and `submit` share one lock, so a job submitted while the
//! worker is deciding is never stranded.

use crate::component::StateBundle;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::{timeout, Instant};
use tracing::{debug, info};

/// Errors surfaced by worker operations
#[derive(Error, Debug)]
pub enum WorkerError {
    /// The worker still had a live instance when the deadline passed
    #[error("worker did not become idle within {waited:?}")]
    IdleTimeout { waited: Duration },
}

/// One unit of queued work
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub action: String,
    pub extras: StateBundle,
}

impl Job {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            extras: StateBundle::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extras.put(key, value);
        self
    }
}

/// Contract for a queue-draining service instance
#[async_trait]
pub trait WorkerService: Send + 'static {
    fn name(&self) -> &str {
        "worker"
    }

    async fn on_create(&mut self) {}

    /// Handle one job. Called serially, in FIFO order, on the worker task.
    async fn on_handle(&mut self, job: Job);

    /// Called once after the queue drained; the instance is gone afterwards
    async fn on_destroy(&mut self) {}
}

struct QueueState {
    queue: VecDeque<Job>,
    running: bool,
    live_instances: u32,
}

struct Shared {
    state: Mutex<QueueState>,
    done: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Runs [`WorkerService`] instances on demand
pub struct WorkerRunner<S> {
    factory: Arc<dyn Fn() -> S + Send + Sync>,
    shared: Arc<Shared>,
}

impl<S> Clone for WorkerRunner<S> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<S: WorkerService> WorkerRunner<S> {
    pub fn new(factory: impl Fn() -> S + Send + Sync + 'static) -> Self {
        Self {
            factory: Arc::new(factory),
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState {
                    queue: VecDeque::new(),
                    running: false,
                    live_instances: 0,
                }),
                done: Notify::new(),
            }),
        }
    }

    /// Enqueue a job, creating a service instance if none is live
    pub fn submit(&self, job: Job) {
        let spawn = {
            let mut state = self.shared.lock();
            state.queue.push_back(job);
            if state.running {
                false
            } else {
                state.running = true;
                state.live_instances += 1;
                true
            }
        };
        if spawn {
            self.spawn_instance();
        }
    }

    fn spawn_instance(&self) {
        let factory = self.factory.clone();
        let shared = self.shared.clone();
        tokio::spawn(async move {
            let mut service = (factory)();
            info!(name = service.name(), "worker instance created");
            service.on_create().await;
            loop {
                let job = {
                    let mut state = shared.lock();
                    match state.queue.pop_front() {
                        Some(job) => Some(job),
                        None => {
                            // decide to stop while still holding the lock,
                            // so a concurrent submit spawns a new instance
                            state.running = false;
                            None
                        }
                    }
                };
                match job {
                    Some(job) => {
                        debug!(action = %job.action, "handling job");
                        service.on_handle(job).await;
                    }
                    None => break,
                }
            }
            service.on_destroy().await;
            info!(name = service.name(), "worker instance destroyed");
            {
                let mut state = shared.lock();
                state.live_instances -= 1;
            }
            shared.done.notify_waiters();
        });
    }

    /// Whether a service instance is currently draining the queue
    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    /// Jobs still waiting to be handled
    pub fn pending_jobs(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Wait until no instance is live (the queue drained and `on_destroy`
    /// finished), or fail after `wait`.
    pub async fn wait_idle(&self, wait: Duration) -> Result<(), WorkerError> {
        let deadline = Instant::now() + wait;
        loop {
            let notified = self.shared.done.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.shared.lock();
                if !state.running && state.live_instances == 0 {
                    return Ok(());
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(WorkerError::IdleTimeout { waited: wait });
            }
            if timeout(deadline - now, notified).await.is_err() {
                let state = self.shared.lock();
                if !state.running && state.live_instances == 0 {
                    return Ok(());
                }
                return Err(WorkerError::IdleTimeout { waited: wait });
            }
        }
    }
}
