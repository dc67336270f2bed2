//! Synchronous key dispatch through the host's focus stack.

use crate::case::{check_eq, Case, CaseContext, CaseResult};
use crate::cases::stubs::ProbeComponent;
use async_trait::async_trait;
use runtime::{Host, KeyCode, KeyEvent};
use serde_json::json;
use testkit::CallbackLog;

pub struct KeyDispatchCase;

#[async_trait]
impl Case for KeyDispatchCase {
    fn name(&self) -> &str {
        "key-dispatch"
    }

    fn description(&self) -> &str {
        "a down/up pair reaches the focused component exactly once with the right code"
    }

    async fn run(&self, _ctx: &CaseContext) -> CaseResult {
        let host = Host::new();
        let log = CallbackLog::new();
        host.launch(Box::new(ProbeComponent::new("receiver", log.clone())))
            .await?;

        host.send_key_down_up(KeyCode::Digit0).await?;
        host.wait_for_idle().await?;

        check_eq(log.count("on_key_down"), 1, "key-down deliveries")?;
        check_eq(log.count("on_key_up"), 1, "key-up deliveries")?;
        check_eq(
            log.payload("on_key_down"),
            Some(json!("Digit0")),
            "key-down code",
        )?;
        check_eq(
            log.payload("on_key_up"),
            Some(json!("Digit0")),
            "key-up code",
        )?;

        // individual events accumulate in order
        host.send_key(KeyEvent::down(KeyCode::Enter)).await?;
        host.send_key(KeyEvent::up(KeyCode::Enter)).await?;
        host.wait_for_idle().await?;

        check_eq(log.count("on_key_down"), 2, "key-down deliveries after singles")?;
        check_eq(log.count("on_key_up"), 2, "key-up deliveries after singles")?;
        check_eq(
            log.sequence()
                .iter()
                .filter(|e| e.starts_with("on_key"))
                .count(),
            4,
            "total key callbacks",
        )?;

        host.shutdown().await?;
        Ok(())
    }
}
