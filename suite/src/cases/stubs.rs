//! Component doubles shared by the conformance cases.

use async_trait::async_trait;
use runtime::{Component, ComponentContext, KeyEvent, StateBundle};
use serde_json::json;
use testkit::CallbackLog;

/// Component that forwards every callback into an injected log.
///
/// Carries one piece of state (`counter`) so save/restore cases have a
/// real value to round-trip.
pub struct ProbeComponent {
    name: String,
    log: CallbackLog,
    counter: i64,
}

impl ProbeComponent {
    pub fn new(name: impl Into<String>, log: CallbackLog) -> Self {
        Self {
            name: name.into(),
            log,
            counter: 0,
        }
    }

    pub fn with_counter(mut self, counter: i64) -> Self {
        self.counter = counter;
        self
    }
}

#[async_trait]
impl Component for ProbeComponent {
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
        state.put_i64("counter", self.counter);
        self.log.record_with("on_save_state", json!(self.counter));
    }

    async fn on_restore_state(&mut self, state: &StateBundle) {
        if let Some(counter) = state.get_i64("counter") {
            self.counter = counter;
        }
        self.log
            .record_with("on_restore_state", json!(self.counter));
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
