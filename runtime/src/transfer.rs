//! Transfer manager: enqueue, query, remove, and completion watching.
//!
//! Sources are keys into a [`ContentStore`]; a key the store cannot
//! resolve fails the transfer, which is how tests exercise both terminal
//! statuses without a network. Completed payloads are written under the
//! configured destination directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

/// Identifier returned by `enqueue`
pub type TransferId = u64;

/// Errors surfaced by transfer operations
#[derive(Error, Debug)]
pub enum TransferError {
    /// No row with that id
    #[error("transfer {id} not found")]
    RowNotFound { id: TransferId },

    /// The transfer did not finish successfully
    #[error("transfer {id} is {status:?}, not successful")]
    NotSuccessful { id: TransferId, status: TransferStatus },

    /// Fewer completions than expected arrived before the deadline
    #[error(
        "timed out after {waited:?} waiting for {expected} completion(s), observed {observed}"
    )]
    CompletionTimeout {
        expected: usize,
        observed: usize,
        waited: Duration,
    },

    /// The manager was dropped while a watcher was waiting
    #[error("completion channel closed")]
    ChannelClosed,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a transfer is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferStatus {
    Pending,
    Running,
    Successful,
    Failed,
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Successful | TransferStatus::Failed)
    }
}

/// Why a transfer failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The source key resolved to nothing
    SourceMissing,
    /// Writing the payload failed
    Io(String),
}

/// One row in the transfer table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRow {
    pub id: TransferId,
    pub source_key: String,
    pub title: Option<String>,
    pub status: TransferStatus,
    pub total_bytes: Option<u64>,
    pub local_path: Option<PathBuf>,
    pub failure: Option<FailureReason>,
    pub queued_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

/// A transfer to enqueue
#[derive(Debug, Clone)]
pub struct TransferRequest {
    source_key: String,
    title: Option<String>,
    destination_name: Option<String>,
}

impl TransferRequest {
    pub fn new(source_key: impl Into<String>) -> Self {
        Self {
            source_key: source_key.into(),
            title: None,
            destination_name: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_destination_name(mut self, name: impl Into<String>) -> Self {
        self.destination_name = Some(name.into());
        self
    }
}

/// Row filter for [`TransferManager::query`]
#[derive(Debug, Clone, Default)]
pub struct Query {
    ids: Option<Vec<TransferId>>,
    statuses: Option<Vec<TransferStatus>>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one id; may be called repeatedly to accumulate ids
    pub fn filter_by_id(mut self, id: TransferId) -> Self {
        self.ids.get_or_insert_with(Vec::new).push(id);
        self
    }

    /// Restrict to a status; may be called repeatedly to accumulate
    pub fn filter_by_status(mut self, status: TransferStatus) -> Self {
        self.statuses.get_or_insert_with(Vec::new).push(status);
        self
    }

    fn matches(&self, row: &TransferRow) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.contains(&row.id) {
                return false;
            }
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&row.status) {
                return false;
            }
        }
        true
    }
}

/// In-memory source registry transfers read from
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    entries: Arc<Mutex<HashMap<String, Arc<Vec<u8>>>>>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, bytes: Vec<u8>) {
        self.lock().insert(key.into(), Arc::new(bytes));
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        self.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Vec<u8>>>> {
        match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Transfer manager configuration
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Directory completed payloads are written into
    pub destination_dir: PathBuf,
    /// Artificial delay before the payload is resolved, to keep a transfer
    /// observable in `Running`
    pub fetch_delay: Duration,
    /// Completion channel capacity
    pub completion_buffer: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            destination_dir: std::env::temp_dir().join("hostbench-transfers"),
            fetch_delay: Duration::ZERO,
            completion_buffer: 64,
        }
    }
}

impl TransferConfig {
    pub fn new(destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            destination_dir: destination_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_fetch_delay(mut self, fetch_delay: Duration) -> Self {
        self.fetch_delay = fetch_delay;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.destination_dir.as_os_str().is_empty() {
            return Err("Destination directory cannot be empty".to_string());
        }
        if self.completion_buffer == 0 {
            return Err("Completion buffer must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Completion notification
#[derive(Debug, Clone)]
pub struct TransferEvent {
    pub id: TransferId,
    pub status: TransferStatus,
}

struct RowCell {
    row: TransferRow,
    task: Option<JoinHandle<()>>,
}

struct ManagerInner {
    store: ContentStore,
    config: TransferConfig,
    rows: Mutex<BTreeMap<TransferId, RowCell>>,
    next_id: AtomicU64,
    events: broadcast::Sender<TransferEvent>,
}

impl ManagerInner {
    fn lock_rows(&self) -> MutexGuard<'_, BTreeMap<TransferId, RowCell>> {
        match self.rows.lock() {
            Ok(rows) => rows,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn update_row(&self, id: TransferId, apply: impl FnOnce(&mut TransferRow)) {
        let mut rows = self.lock_rows();
        if let Some(cell) = rows.get_mut(&id) {
            apply(&mut cell.row);
            cell.row.last_modified = Utc::now();
        }
    }
}

/// Enqueues and tracks transfers
#[derive(Clone)]
pub struct TransferManager {
    inner: Arc<ManagerInner>,
}

impl TransferManager {
    pub fn new(store: ContentStore, config: TransferConfig) -> Self {
        let (events, _) = broadcast::channel(config.completion_buffer);
        Self {
            inner: Arc::new(ManagerInner {
                store,
                config,
                rows: Mutex::new(BTreeMap::new()),
                next_id: AtomicU64::new(1),
                events,
            }),
        }
    }

    /// Enqueue a transfer and return its id. The row is visible to
    /// `query` immediately.
    pub fn enqueue(&self, request: TransferRequest) -> TransferId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let now = Utc::now();
        let row = TransferRow {
            id,
            source_key: request.source_key.clone(),
            title: request.title.clone(),
            status: TransferStatus::Pending,
            total_bytes: None,
            local_path: None,
            failure: None,
            queued_at: now,
            last_modified: now,
        };
        // the row must be visible before the task can touch it
        self.inner
            .lock_rows()
            .insert(id, RowCell { row, task: None });
        let task = tokio::spawn(run_transfer(self.inner.clone(), id, request));
        if let Some(cell) = self.inner.lock_rows().get_mut(&id) {
            cell.task = Some(task);
        }
        info!(id, "transfer enqueued");
        id
    }

    /// Rows matching `query`, ordered by id
    pub fn query(&self, query: &Query) -> Vec<TransferRow> {
        self.inner
            .lock_rows()
            .values()
            .filter(|cell| query.matches(&cell.row))
            .map(|cell| cell.row.clone())
            .collect()
    }

    /// Remove rows; running transfers are cancelled and any written file
    /// deleted. Returns how many rows were removed.
    pub fn remove(&self, ids: &[TransferId]) -> usize {
        let mut removed = 0;
        let mut rows = self.inner.lock_rows();
        for id in ids {
            if let Some(mut cell) = rows.remove(id) {
                if let Some(task) = cell.task.take() {
                    task.abort();
                }
                if let Some(path) = &cell.row.local_path {
                    if let Err(error) = std::fs::remove_file(path) {
                        warn!(id, %error, "failed to delete transfer payload");
                    }
                }
                removed += 1;
            }
        }
        debug!(removed, "transfers removed");
        removed
    }

    /// Read back the payload of a successful transfer
    pub async fn open_completed(&self, id: TransferId) -> Result<Vec<u8>, TransferError> {
        let (status, path) = {
            let rows = self.inner.lock_rows();
            let cell = rows.get(&id).ok_or(TransferError::RowNotFound { id })?;
            (cell.row.status, cell.row.local_path.clone())
        };
        if status != TransferStatus::Successful {
            return Err(TransferError::NotSuccessful { id, status });
        }
        let path = path.ok_or(TransferError::NotSuccessful { id, status })?;
        Ok(tokio::fs::read(path).await?)
    }

    /// Subscribe to completion events. Subscribe before enqueueing to
    /// observe every completion.
    pub fn subscribe(&self) -> CompletionWatcher {
        CompletionWatcher {
            rx: self.inner.events.subscribe(),
        }
    }
}

async fn run_transfer(inner: Arc<ManagerInner>, id: TransferId, request: TransferRequest) {
    inner.update_row(id, |row| row.status = TransferStatus::Running);
    if !inner.config.fetch_delay.is_zero() {
        sleep(inner.config.fetch_delay).await;
    }

    let outcome = match inner.store.get(&request.source_key) {
        Some(bytes) => {
            let file_name = request
                .destination_name
                .unwrap_or_else(|| format!("transfer-{}", id));
            let path = inner.config.destination_dir.join(file_name);
            match write_payload(&path, &bytes).await {
                Ok(()) => Ok((bytes.len() as u64, path)),
                Err(error) => Err(FailureReason::Io(error.to_string())),
            }
        }
        None => Err(FailureReason::SourceMissing),
    };

    let status = match outcome {
        Ok((total_bytes, path)) => {
            inner.update_row(id, |row| {
                row.status = TransferStatus::Successful;
                row.total_bytes = Some(total_bytes);
                row.local_path = Some(path.clone());
            });
            info!(id, total_bytes, "transfer completed");
            TransferStatus::Successful
        }
        Err(reason) => {
            inner.update_row(id, |row| {
                row.status = TransferStatus::Failed;
                row.failure = Some(reason.clone());
            });
            warn!(id, ?reason, "transfer failed");
            TransferStatus::Failed
        }
    };

    let _ = inner.events.send(TransferEvent { id, status });
}

async fn write_payload(path: &std::path::Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}

/// Countdown-style receiver for completion events
pub struct CompletionWatcher {
    rx: broadcast::Receiver<TransferEvent>,
}

impl CompletionWatcher {
    /// Wait for `expected` completions (successful or failed), or fail
    /// after `wait`.
    pub async fn await_completions(
        &mut self,
        expected: usize,
        wait: Duration,
    ) -> Result<Vec<TransferEvent>, TransferError> {
        let deadline = Instant::now() + wait;
        let mut seen = Vec::new();
        while seen.len() < expected {
            let now = Instant::now();
            if now >= deadline {
                return Err(TransferError::CompletionTimeout {
                    expected,
                    observed: seen.len(),
                    waited: wait,
                });
            }
            match timeout(deadline - now, self.rx.recv()).await {
                Ok(Ok(event)) if event.status.is_terminal() => seen.push(event),
                Ok(Ok(_)) => {}
                Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    warn!(skipped, "completion watcher lagged");
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => {
                    return Err(TransferError::ChannelClosed);
                }
                Err(_) => {
                    return Err(TransferError::CompletionTimeout {
                        expected,
                        observed: seen.len(),
                        waited: wait,
                    });
                }
            }
        }
        Ok(seen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    fn manager(dir: &std::path::Path) -> (TransferManager, ContentStore) {
        let store = ContentStore::new();
        store.insert("good", b"payload-bytes".to_vec());
        let manager = TransferManager::new(store.clone(), TransferConfig::new(dir));
        (manager, store)
    }

    #[tokio::test]
    async fn good_and_bad_sources_reach_their_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _store) = manager(dir.path());
        let mut watcher = manager.subscribe();

        let good = manager.enqueue(TransferRequest::new("good"));
        let bad = manager.enqueue(TransferRequest::new("nosuchkey"));
        assert_eq!(manager.query(&Query::new()).len(), 2);

        watcher.await_completions(2, WAIT).await.unwrap();

        let good_rows = manager.query(&Query::new().filter_by_id(good));
        assert_eq!(good_rows.len(), 1);
        assert_eq!(good_rows[0].status, TransferStatus::Successful);
        assert_eq!(good_rows[0].total_bytes, Some(13));

        let bad_rows = manager.query(&Query::new().filter_by_id(bad));
        assert_eq!(bad_rows.len(), 1);
        assert_eq!(bad_rows[0].status, TransferStatus::Failed);
        assert_eq!(bad_rows[0].failure, Some(FailureReason::SourceMissing));
    }

    #[tokio::test]
    async fn remove_decrements_row_count() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _store) = manager(dir.path());
        let mut watcher = manager.subscribe();

        let first = manager.enqueue(TransferRequest::new("good"));
        let second = manager.enqueue(TransferRequest::new("good"));
        watcher.await_completions(2, WAIT).await.unwrap();

        assert_eq!(manager.remove(&[first]), 1);
        assert_eq!(manager.query(&Query::new()).len(), 1);
        assert_eq!(manager.remove(&[second]), 1);
        assert_eq!(manager.query(&Query::new()).len(), 0);
        // already removed
        assert_eq!(manager.remove(&[first]), 0);
    }

    #[tokio::test]
    async fn open_completed_returns_the_payload() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _store) = manager(dir.path());
        let mut watcher = manager.subscribe();

        let id = manager.enqueue(
            TransferRequest::new("good").with_destination_name("payload.bin"),
        );
        watcher.await_completions(1, WAIT).await.unwrap();

        let bytes = manager.open_completed(id).await.unwrap();
        assert_eq!(bytes, b"payload-bytes");
        assert!(dir.path().join("payload.bin").exists());
    }

    #[tokio::test]
    async fn open_failed_transfer_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _store) = manager(dir.path());
        let mut watcher = manager.subscribe();

        let id = manager.enqueue(TransferRequest::new("missing"));
        watcher.await_completions(1, WAIT).await.unwrap();

        let err = manager.open_completed(id).await.unwrap_err();
        assert!(matches!(
            err,
            TransferError::NotSuccessful {
                status: TransferStatus::Failed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn watcher_timeout_reports_counts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new();
        store.insert("good", vec![1, 2, 3]);
        let manager = TransferManager::new(
            store,
            TransferConfig::new(dir.path()).with_fetch_delay(Duration::from_secs(10)),
        );
        let mut watcher = manager.subscribe();
        manager.enqueue(TransferRequest::new("good"));

        let err = watcher
            .await_completions(1, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransferError::CompletionTimeout {
                expected: 1,
                observed: 0,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn query_by_status_finds_terminal_rows() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _store) = manager(dir.path());
        let mut watcher = manager.subscribe();

        manager.enqueue(TransferRequest::new("good"));
        manager.enqueue(TransferRequest::new("absent"));
        watcher.await_completions(2, WAIT).await.unwrap();

        let successful = manager.query(&Query::new().filter_by_status(TransferStatus::Successful));
        assert_eq!(successful.len(), 1);
        let failed = manager.query(&Query::new().filter_by_status(TransferStatus::Failed));
        assert_eq!(failed.len(), 1);
        let terminal = manager.query(
            &Query::new()
                .filter_by_status(TransferStatus::Successful)
                .filter_by_status(TransferStatus::Failed),
        );
        assert_eq!(terminal.len(), 2);
    }
}
