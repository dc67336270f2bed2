//! Dialog cancel semantics: back-key behavior under the cancelable flag.

use crate::case::{check, check_eq, Case, CaseContext, CaseResult};
use crate::cases::stubs::ProbeComponent;
use async_trait::async_trait;
use runtime::{Dialog, Host, KeyCode};
use testkit::CallbackLog;

pub struct DialogCancelCase;

#[async_trait]
impl Case for DialogCancelCase {
    fn name(&self) -> &str {
        "dialog-cancel"
    }

    fn description(&self) -> &str {
        "back key cancels a cancelable dialog exactly once; a non-cancelable dialog stays up"
    }

    async fn run(&self, _ctx: &CaseContext) -> CaseResult {
        let host = Host::new();
        let log = CallbackLog::new();
        host.launch(Box::new(ProbeComponent::new("dialog-owner", log.clone())))
            .await?;

        // cancelable dialog: back key fires the cancel listener once and
        // takes it down
        let dialog = Dialog::new();
        {
            let log = log.clone();
            dialog.set_on_cancel(move || log.record("cancel"));
        }
        {
            let log = log.clone();
            dialog.set_on_dismiss(move || log.record("dismiss"));
        }
        dialog.show(&host).await?;
        check(dialog.is_showing(), "dialog must be showing after show()")?;

        host.send_key_down_up(KeyCode::Back).await?;
        host.wait_for_idle().await?;

        check(!dialog.is_showing(), "back key must take the dialog down")?;
        check_eq(log.count("cancel"), 1, "cancel listener invocations")?;
        check_eq(log.count("dismiss"), 1, "dismiss listener invocations")?;
        check(
            log.fired_before("cancel", "dismiss"),
            "cancel must precede dismiss",
        )?;

        // a second back key cannot fire it again
        host.send_key_down_up(KeyCode::Back).await?;
        host.wait_for_idle().await?;
        check_eq(log.count("cancel"), 1, "cancel count after extra back key")?;

        // non-cancelable dialog: the same key leaves it showing and the
        // listener untouched
        let locked = Dialog::new();
        locked.set_cancelable(false);
        {
            let log = log.clone();
            locked.set_on_cancel(move || log.record("locked-cancel"));
        }
        locked.show(&host).await?;

        host.send_key_down_up(KeyCode::Back).await?;
        host.wait_for_idle().await?;

        check(
            locked.is_showing(),
            "non-cancelable dialog must survive the back key",
        )?;
        check_eq(log.count("locked-cancel"), 0, "locked cancel invocations")?;

        // direct cancel still works regardless of the flag, exactly once
        locked.cancel();
        locked.cancel();
        check_eq(log.count("locked-cancel"), 1, "direct cancel invocations")?;
        check(!locked.is_showing(), "cancel must take the dialog down")?;

        host.shutdown().await?;
        Ok(())
    }
}
