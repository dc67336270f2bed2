//! The component contract the host demands of everything it manages.
//!
//! A test double implements [`Component`], holds whatever capture handle
//! the test injected, and forwards each callback into it. The default
//! method bodies are the framework behavior, so an override that wants to
//! keep it simply records and returns.

use crate::input::KeyEvent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Identifier assigned by the host at launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u64);

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "component-{}", self.0)
    }
}

/// Context handed to `on_create`
#[derive(Debug, Clone, Copy)]
pub struct ComponentContext {
    /// The id the host assigned to this instance
    pub id: ComponentId,
}

/// String-keyed saved state, the argument to save/restore callbacks.
///
/// Values are JSON so tests can capture and compare them without caring
/// about concrete types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateBundle {
    values: BTreeMap<String, Value>,
}

impl StateBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn put_str(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.put(key, Value::String(value.into()));
    }

    pub fn put_i64(&mut self, key: impl Into<String>, value: i64) {
        self.put(key, Value::from(value));
    }

    pub fn put_bool(&mut self, key: impl Into<String>, value: bool) {
        self.put(key, Value::Bool(value));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Lifecycle contract for host-managed components.
///
/// The host invokes these in documented order: create, start, resume on
/// launch; pause, stop, destroy on finish; restart, start, resume when a
/// stopped component is resumed. Key callbacks return whether the event
/// was consumed.
#[async_trait]
pub trait Component: Send {
    /// Stable name used in snapshots and logs
    fn name(&self) -> &str;

    async fn on_create(&mut self, _ctx: &ComponentContext) {}

    async fn on_start(&mut self) {}

    async fn on_resume(&mut self) {}

    async fn on_pause(&mut self) {}

    async fn on_stop(&mut self) {}

    async fn on_restart(&mut self) {}

    async fn on_destroy(&mut self) {}

    async fn on_save_state(&mut self, _state: &mut StateBundle) {}

    async fn on_restore_state(&mut self, _state: &StateBundle) {}

    async fn on_key_down(&mut self, _event: KeyEvent) -> bool {
        false
    }

    async fn on_key_up(&mut self, _event: KeyEvent) -> bool {
        false
    }
}
