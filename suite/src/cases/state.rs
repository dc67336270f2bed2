//! Save/restore: the bundle carries component state across instances.

use crate::case::{check, check_eq, Case, CaseContext, CaseResult};
use crate::cases::stubs::ProbeComponent;
use async_trait::async_trait;
use runtime::Host;
use serde_json::json;
use testkit::CallbackLog;

pub struct StateRestoreCase;

#[async_trait]
impl Case for StateRestoreCase {
    fn name(&self) -> &str {
        "state-restore"
    }

    fn description(&self) -> &str {
        "a saved bundle restores the same values into a fresh component instance"
    }

    async fn run(&self, _ctx: &CaseContext) -> CaseResult {
        let host = Host::new();

        // first instance saves its counter into the bundle
        let first_log = CallbackLog::new();
        let first = host
            .launch(Box::new(
                ProbeComponent::new("stateful", first_log.clone()).with_counter(7),
            ))
            .await?;
        host.pause(first).await?;

        let bundle = host.save_state(first).await?;
        check_eq(bundle.get_i64("counter"), Some(7), "saved counter")?;
        check_eq(first_log.count("on_save_state"), 1, "save callbacks")?;
        check_eq(
            first_log.payload("on_save_state"),
            Some(json!(7)),
            "captured save argument",
        )?;
        host.finish(first).await?;

        // a fresh instance picks the value up from the bundle
        let second_log = CallbackLog::new();
        let second = host
            .launch(Box::new(ProbeComponent::new(
                "stateful",
                second_log.clone(),
            )))
            .await?;
        host.restore_state(second, bundle.clone()).await?;

        check_eq(
            second_log.payload("on_restore_state"),
            Some(json!(7)),
            "restored counter",
        )?;

        // and saves it back out unchanged
        let round_tripped = host.save_state(second).await?;
        check_eq(round_tripped, bundle, "bundle after a save-restore-save loop")?;
        check(
            second_log.fired_before("on_restore_state", "on_save_state"),
            "restore must precede the second save",
        )?;

        host.shutdown().await?;
        Ok(())
    }
}
