//! Queue worker drain: N submits, N handles, then automatic destruction.

use crate::case::{check, check_eq, Case, CaseContext, CaseResult};
use async_trait::async_trait;
use runtime::{Job, WorkerRunner, WorkerService};
use serde_json::json;
use std::time::Duration;
use testkit::{poll_until_with, CallbackLog};

const WAIT: Duration = Duration::from_secs(5);

struct AccumulatorService {
    log: CallbackLog,
    total: i64,
}

#[async_trait]
impl WorkerService for AccumulatorService {
    fn name(&self) -> &str {
        "accumulator"
    }

    async fn on_create(&mut self) {
        self.log.record("on_create");
    }

    async fn on_handle(&mut self, job: Job) {
        if let Some(value) = job.extras.get_i64("value") {
            self.total += value;
        }
        self.log.record_with("on_handle", json!(job.action));
    }

    async fn on_destroy(&mut self) {
        self.log.record_with("on_destroy", json!(self.total));
    }
}

pub struct WorkerDrainCase;

#[async_trait]
impl Case for WorkerDrainCase {
    fn name(&self) -> &str {
        "worker-drain"
    }

    fn description(&self) -> &str {
        "N submitted jobs are handled exactly N times, then the instance destroys itself"
    }

    async fn run(&self, ctx: &CaseContext) -> CaseResult {
        const VALUE: i64 = 42;
        const SUBMITS: u64 = 3;

        let log = CallbackLog::new();
        let runner = {
            let log = log.clone();
            WorkerRunner::new(move || AccumulatorService {
                log: log.clone(),
                total: 0,
            })
        };

        for _ in 0..SUBMITS {
            runner.submit(Job::new("add").with_extra("value", json!(VALUE)));
        }
        runner.wait_idle(WAIT).await?;

        check_eq(log.count("on_create"), 1, "service instances created")?;
        check_eq(log.count("on_handle"), SUBMITS, "handled job count")?;
        check_eq(
            log.payload("on_destroy"),
            Some(json!(VALUE * SUBMITS as i64)),
            "accumulated total at destruction",
        )?;

        // ordering: created before the first job, destroyed after the last
        check(
            log.fired_before("on_create", "on_handle"),
            "create must precede handling",
        )?;
        let destroy_at = log.index_of("on_destroy").unwrap_or(0);
        let last_handle = log
            .entries()
            .iter()
            .rposition(|e| e.event == "on_handle")
            .unwrap_or(usize::MAX);
        check(
            last_handle < destroy_at,
            "no job may be handled after destruction",
        )?;

        // the queue really drained
        poll_until_with(
            || !runner.is_running() && runner.pending_jobs() == 0,
            WAIT,
            ctx.config.poll_interval,
        )
        .await?;

        // a fresh submit builds a fresh instance
        runner.submit(Job::new("add").with_extra("value", json!(VALUE)));
        runner.wait_idle(WAIT).await?;
        check_eq(log.count("on_create"), 2, "instances after resubmission")?;
        check_eq(log.count("on_destroy"), 2, "destructions after resubmission")?;
        check_eq(
            log.payload("on_destroy"),
            Some(json!(VALUE)),
            "fresh instance starts from zero",
        )?;

        Ok(())
    }
}
