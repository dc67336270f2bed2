//! Transfer manager queryability: enqueue, status filters, remove, open.

use crate::case::{check, check_eq, Case, CaseContext, CaseResult};
use async_trait::async_trait;
use runtime::{
    ContentStore, Query, TransferConfig, TransferManager, TransferRequest, TransferStatus,
};
use std::time::Duration;
use testkit::poll_until_with;

const WAIT: Duration = Duration::from_secs(5);
const PAYLOAD: &[u8] = b"conformance-payload";

pub struct TransferQueueCase;

#[async_trait]
impl Case for TransferQueueCase {
    fn name(&self) -> &str {
        "transfer-queue"
    }

    fn description(&self) -> &str {
        "enqueued transfers are queryable by id and status; remove drops exactly one row"
    }

    async fn run(&self, ctx: &CaseContext) -> CaseResult {
        let store = ContentStore::new();
        store.insert("good", PAYLOAD.to_vec());

        let manager = TransferManager::new(store, TransferConfig::new(&ctx.scratch_dir));
        let mut watcher = manager.subscribe();

        let good = manager.enqueue(TransferRequest::new("good").with_title("good transfer"));
        let bad = manager.enqueue(TransferRequest::new("nosuchkey"));

        check_eq(manager.query(&Query::new()).len(), 2, "total rows after enqueue")?;
        check_eq(
            manager.query(&Query::new().filter_by_id(good)).len(),
            1,
            "rows for the good id",
        )?;
        check_eq(
            manager.query(&Query::new().filter_by_id(bad)).len(),
            1,
            "rows for the bad id",
        )?;

        watcher.await_completions(2, WAIT).await?;

        // terminal statuses land on the right rows
        let interval = ctx.config.poll_interval;
        poll_until_with(
            || {
                manager
                    .query(&Query::new().filter_by_status(TransferStatus::Successful))
                    .len()
                    == 1
            },
            WAIT,
            interval,
        )
        .await?;
        poll_until_with(
            || {
                manager
                    .query(&Query::new().filter_by_status(TransferStatus::Failed))
                    .len()
                    == 1
            },
            WAIT,
            interval,
        )
        .await?;

        let successful = manager.query(&Query::new().filter_by_id(good));
        check_eq(
            successful[0].status,
            TransferStatus::Successful,
            "status of the resolvable source",
        )?;
        check_eq(
            successful[0].total_bytes,
            Some(PAYLOAD.len() as u64),
            "recorded payload size",
        )?;

        let failed = manager.query(&Query::new().filter_by_id(bad));
        check_eq(
            failed[0].status,
            TransferStatus::Failed,
            "status of the missing source",
        )?;

        // the completed payload reads back byte-for-byte
        let bytes = manager.open_completed(good).await?;
        check_eq(bytes.as_slice(), PAYLOAD, "payload read back")?;

        // remove drops exactly one row each time
        check_eq(manager.remove(&[good]), 1, "rows removed for the good id")?;
        check_eq(manager.query(&Query::new()).len(), 1, "rows after first remove")?;
        check_eq(manager.remove(&[bad]), 1, "rows removed for the bad id")?;
        check_eq(manager.query(&Query::new()).len(), 0, "rows after second remove")?;
        check_eq(manager.remove(&[good]), 0, "removing an absent id")?;

        // open after remove is an error, asserted explicitly
        match manager.open_completed(good).await {
            Err(runtime::TransferError::RowNotFound { id }) => {
                check_eq(id, good, "id in the not-found error")?;
            }
            Ok(_) => return check(false, "open after remove must fail"),
            Err(other) => return Err(other.into()),
        }

        Ok(())
    }
}
