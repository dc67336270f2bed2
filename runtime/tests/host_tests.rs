//! Host loop integration tests: lifecycle ordering, key dispatch, dialog
//! focus and state save/restore, observed through an injected callback
//! log.

use async_trait::async_trait;
use runtime::{
    Component, ComponentContext, Dialog, Host, HostError, KeyCode, KeyEvent, StateBundle,
};
use serde_json::json;
use testkit::CallbackLog;

/// Component double that forwards every callback into a log
struct Probe {
    name: String,
    log: CallbackLog,
}

impl Probe {
    fn new(name: &str, log: CallbackLog) -> Self {
        Self {
            name: name.to_string(),
            log,
        }
    }
}

#[async_trait]
impl Component for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_create(&mut self, ctx: &ComponentContext) {
        self.log.record_with("on_create", json!(ctx.id.0));
    }

    async fn on_start(&mut self) {
        self.log.record("on_start");
    }

    async fn on_resume(&mut self) {
        self.log.record("on_resume");
    }

    async fn on_pause(&mut self) {
        self.log.record("on_pause");
    }

    async fn on_stop(&mut self) {
        self.log.record("on_stop");
    }

    async fn on_restart(&mut self) {
        self.log.record("on_restart");
    }

    async fn on_destroy(&mut self) {
        self.log.record("on_destroy");
    }

    async fn on_save_state(&mut self, state: &mut StateBundle) {
        state.put_i64("counter", 42);
        self.log.record("on_save_state");
    }

    async fn on_restore_state(&mut self, state: &StateBundle) {
        self.log
            .record_with("on_restore_state", json!(state.get_i64("counter")));
    }

    async fn on_key_down(&mut self, event: KeyEvent) -> bool {
        self.log
            .record_with("on_key_down", json!(event.code.to_string()));
        true
    }

    async fn on_key_up(&mut self, event: KeyEvent) -> bool {
        self.log
            .record_with("on_key_up", json!(event.code.to_string()));
        true
    }
}

#[tokio::test]
async fn launch_delivers_create_start_resume_in_order() {
    let host = Host::new();
    let log = CallbackLog::new();
    let id = host
        .launch(Box::new(Probe::new("main", log.clone())))
        .await
        .unwrap();
    host.wait_for_idle().await.unwrap();

    assert_eq!(log.sequence(), vec!["on_create", "on_start", "on_resume"]);
    assert_eq!(log.payload("on_create"), Some(json!(id.0)));
    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn finish_delivers_pause_stop_destroy_in_order() {
    let host = Host::new();
    let log = CallbackLog::new();
    let id = host
        .launch(Box::new(Probe::new("main", log.clone())))
        .await
        .unwrap();
    host.finish(id).await.unwrap();

    assert!(log.fired_before("on_pause", "on_stop"));
    assert!(log.fired_before("on_stop", "on_destroy"));
    assert_eq!(log.count("on_pause"), 1);
    assert_eq!(log.count("on_destroy"), 1);

    // the component is gone
    let err = host.pause(id).await.unwrap_err();
    assert!(matches!(err, HostError::ComponentNotFound { .. }));
    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn resume_from_stopped_takes_the_restart_path() {
    let host = Host::new();
    let log = CallbackLog::new();
    let id = host
        .launch(Box::new(Probe::new("main", log.clone())))
        .await
        .unwrap();

    host.stop(id).await.unwrap();
    assert_eq!(log.count("on_pause"), 1);
    assert_eq!(log.count("on_stop"), 1);

    host.resume(id).await.unwrap();
    assert_eq!(log.count("on_restart"), 1);
    assert_eq!(log.count("on_start"), 2);
    assert_eq!(log.count("on_resume"), 2);
    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn illegal_hop_is_rejected_with_state_names() {
    let host = Host::new();
    let log = CallbackLog::new();
    let id = host
        .launch(Box::new(Probe::new("main", log.clone())))
        .await
        .unwrap();

    host.pause(id).await.unwrap();
    let err = host.pause(id).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Invalid transition"), "got: {message}");
    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn key_down_up_reaches_focused_component_exactly_once() {
    let host = Host::new();
    let log = CallbackLog::new();
    host.launch(Box::new(Probe::new("main", log.clone())))
        .await
        .unwrap();

    host.send_key_down_up(KeyCode::Digit0).await.unwrap();
    host.wait_for_idle().await.unwrap();

    assert_eq!(log.count("on_key_down"), 1);
    assert_eq!(log.count("on_key_up"), 1);
    assert_eq!(log.payload("on_key_down"), Some(json!("Digit0")));
    assert_eq!(log.payload("on_key_up"), Some(json!("Digit0")));
    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn most_recent_launch_owns_the_focus() {
    let host = Host::new();
    let below = CallbackLog::new();
    let above = CallbackLog::new();
    host.launch(Box::new(Probe::new("below", below.clone())))
        .await
        .unwrap();
    host.launch(Box::new(Probe::new("above", above.clone())))
        .await
        .unwrap();

    host.send_key_down_up(KeyCode::Enter).await.unwrap();

    assert_eq!(below.count("on_key_down"), 0);
    assert_eq!(above.count("on_key_down"), 1);
    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn showing_dialog_steals_keys_from_the_component() {
    let host = Host::new();
    let log = CallbackLog::new();
    host.launch(Box::new(Probe::new("main", log.clone())))
        .await
        .unwrap();

    let dialog = Dialog::new();
    dialog.show(&host).await.unwrap();

    host.send_key_down_up(KeyCode::Digit5).await.unwrap();
    assert_eq!(log.count("on_key_down"), 0);

    // once dismissed, keys flow to the component again
    dialog.dismiss();
    host.wait_for_idle().await.unwrap();
    host.send_key_down_up(KeyCode::Digit5).await.unwrap();
    assert_eq!(log.count("on_key_down"), 1);
    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn save_and_restore_round_trip_the_bundle() {
    let host = Host::new();
    let log = CallbackLog::new();
    let id = host
        .launch(Box::new(Probe::new("main", log.clone())))
        .await
        .unwrap();

    let bundle = host.save_state(id).await.unwrap();
    assert_eq!(bundle.get_i64("counter"), Some(42));
    assert_eq!(log.count("on_save_state"), 1);

    host.restore_state(id, bundle).await.unwrap();
    assert_eq!(log.payload("on_restore_state"), Some(json!(42)));
    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn snapshot_reflects_the_stack() {
    let host = Host::new();
    let log = CallbackLog::new();
    host.launch(Box::new(Probe::new("base", log.clone())))
        .await
        .unwrap();
    let top = host
        .launch(Box::new(Probe::new("top", log.clone())))
        .await
        .unwrap();
    host.pause(top).await.unwrap();

    let snapshot = host.task_snapshot().await.unwrap();
    assert_eq!(snapshot.base_component.as_deref(), Some("base"));
    assert_eq!(snapshot.top_component.as_deref(), Some("top"));
    assert_eq!(snapshot.component_count, 2);
    assert_eq!(snapshot.running_count, 1);
    host.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_finishes_live_components() {
    let host = Host::new();
    let log = CallbackLog::new();
    host.launch(Box::new(Probe::new("main", log.clone())))
        .await
        .unwrap();

    host.shutdown().await.unwrap();
    assert_eq!(log.count("on_destroy"), 1);

    // the loop is gone; further calls fail cleanly
    let result = host.wait_for_idle().await;
    assert!(matches!(result, Err(HostError::LoopClosed)));
}
