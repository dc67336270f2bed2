//! Lifecycle ordering as observed through the callback journal.

use crate::case::{check, check_eq, Case, CaseContext, CaseResult};
use crate::cases::stubs::ProbeComponent;
use async_trait::async_trait;
use runtime::{Host, HostError};
use testkit::CallbackLog;

pub struct LifecycleOrderCase;

#[async_trait]
impl Case for LifecycleOrderCase {
    fn name(&self) -> &str {
        "lifecycle-order"
    }

    fn description(&self) -> &str {
        "the host delivers lifecycle callbacks in documented order and rejects illegal hops"
    }

    async fn run(&self, _ctx: &CaseContext) -> CaseResult {
        let host = Host::new();
        let log = CallbackLog::new();
        let id = host
            .launch(Box::new(ProbeComponent::new("subject", log.clone())))
            .await?;

        check_eq(
            log.sequence(),
            vec![
                "on_create".to_string(),
                "on_start".to_string(),
                "on_resume".to_string(),
            ],
            "launch callback order",
        )?;

        // stop pauses first; the documented pause-before-stop ordering
        host.stop(id).await?;
        check(
            log.fired_before("on_pause", "on_stop"),
            "pause must precede stop",
        )?;
        check_eq(log.count("on_pause"), 1, "pause invocations")?;
        check_eq(log.count("on_stop"), 1, "stop invocations")?;

        // resuming a stopped component restarts it
        host.resume(id).await?;
        check_eq(log.count("on_restart"), 1, "restart invocations")?;
        check_eq(log.count("on_start"), 2, "start invocations after restart")?;
        check_eq(log.count("on_resume"), 2, "resume invocations after restart")?;
        check(
            log.fired_before("on_restart", "on_destroy") || !log.was_called("on_destroy"),
            "restart cannot happen after destroy",
        )?;

        // an illegal hop is rejected with a lifecycle error, and the
        // component remains usable
        host.pause(id).await?;
        match host.pause(id).await {
            Err(HostError::Lifecycle(_)) => {}
            Ok(()) => return check(false, "a second pause must be rejected"),
            Err(other) => return Err(other.into()),
        }
        host.resume(id).await?;

        // finish ends with destroy, exactly once, as the final callback
        host.finish(id).await?;
        check_eq(log.count("on_destroy"), 1, "destroy invocations")?;
        let entries = log.entries();
        let last = match entries.last() {
            Some(entry) => entry.event.clone(),
            None => return check(false, "journal cannot be empty"),
        };
        check_eq(last, "on_destroy".to_string(), "final callback")?;

        host.shutdown().await?;
        Ok(())
    }
}
