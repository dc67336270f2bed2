//! The host loop: the single "main thread" that owns every component.
//!
//! All mutation goes through one command channel processed strictly in
//! order by a dedicated task, which is what makes `wait_for_idle` a real
//! barrier and key dispatch synchronous: when `send_key_down_up` returns,
//! the focused target has already seen both transitions. Every public
//! call is bounded by the configured reply timeout so a wedged loop shows
//! up as a failure instead of a hung test.

use crate::component::{Component, ComponentContext, ComponentId, StateBundle};
use crate::dialog::Dialog;
use crate::input::{KeyCode, KeyEvent};
use crate::lifecycle::{Lifecycle, LifecycleError, LifecycleState, TransitionGraph};
use crate::snapshot::TaskSnapshot;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Errors surfaced by host operations
#[derive(Error, Debug)]
pub enum HostError {
    /// The id does not name a live component
    #[error("component {id} not found")]
    ComponentNotFound { id: ComponentId },

    /// The requested operation would take an illegal lifecycle hop
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// The host loop has exited
    #[error("host loop is no longer running")]
    LoopClosed,

    /// The host loop did not answer in time
    #[error("host did not answer within {timeout:?}: {operation}")]
    ReplyTimeout {
        operation: String,
        timeout: Duration,
    },
}

pub type HostResult<T> = Result<T, HostError>;

/// Host configuration
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Upper bound on any single call into the host loop
    pub reply_timeout: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            reply_timeout: Duration::from_secs(5),
        }
    }
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply_timeout(mut self, reply_timeout: Duration) -> Self {
        self.reply_timeout = reply_timeout;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.reply_timeout.is_zero() {
            return Err("Reply timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

pub(crate) enum Command {
    Launch {
        component: Box<dyn Component>,
        reply: oneshot::Sender<HostResult<ComponentId>>,
    },
    Pause {
        id: ComponentId,
        reply: oneshot::Sender<HostResult<()>>,
    },
    Resume {
        id: ComponentId,
        reply: oneshot::Sender<HostResult<()>>,
    },
    Stop {
        id: ComponentId,
        reply: oneshot::Sender<HostResult<()>>,
    },
    Finish {
        id: ComponentId,
        reply: oneshot::Sender<HostResult<()>>,
    },
    SaveState {
        id: ComponentId,
        reply: oneshot::Sender<HostResult<StateBundle>>,
    },
    RestoreState {
        id: ComponentId,
        bundle: StateBundle,
        reply: oneshot::Sender<HostResult<()>>,
    },
    Key {
        event: KeyEvent,
        reply: oneshot::Sender<HostResult<()>>,
    },
    KeyDownUp {
        code: KeyCode,
        reply: oneshot::Sender<HostResult<()>>,
    },
    ShowDialog {
        dialog: Dialog,
        reply: oneshot::Sender<HostResult<()>>,
    },
    RemoveDialog {
        dialog_id: u64,
    },
    Snapshot {
        reply: oneshot::Sender<HostResult<TaskSnapshot>>,
    },
    Idle {
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running host loop. Cloning shares the loop.
#[derive(Clone)]
pub struct Host {
    tx: mpsc::UnboundedSender<Command>,
    config: HostConfig,
    loop_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Host {
    pub fn new() -> Self {
        Self::with_config(HostConfig::default())
    }

    pub fn with_config(config: HostConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(HostLoop::new().run(rx));
        Self {
            tx,
            config,
            loop_task: Arc::new(Mutex::new(Some(task))),
        }
    }

    pub(crate) fn sender(&self) -> mpsc::UnboundedSender<Command> {
        self.tx.clone()
    }

    fn send(&self, command: Command) -> HostResult<()> {
        self.tx.send(command).map_err(|_| HostError::LoopClosed)
    }

    async fn call<T>(
        &self,
        operation: &str,
        rx: oneshot::Receiver<HostResult<T>>,
    ) -> HostResult<T> {
        match timeout(self.config.reply_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(HostError::LoopClosed),
            Err(_) => Err(HostError::ReplyTimeout {
                operation: operation.to_string(),
                timeout: self.config.reply_timeout,
            }),
        }
    }

    /// Launch a component: create, start and resume it in order, then
    /// place it on top of the focus stack. Returns its id.
    pub async fn launch(&self, component: Box<dyn Component>) -> HostResult<ComponentId> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Launch { component, reply })?;
        self.call("launch", rx).await
    }

    pub async fn pause(&self, id: ComponentId) -> HostResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Pause { id, reply })?;
        self.call("pause", rx).await
    }

    /// Resume a paused component, or restart-start-resume a stopped one.
    pub async fn resume(&self, id: ComponentId) -> HostResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Resume { id, reply })?;
        self.call("resume", rx).await
    }

    /// Stop a component, pausing it first if it is resumed.
    pub async fn stop(&self, id: ComponentId) -> HostResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stop { id, reply })?;
        self.call("stop", rx).await
    }

    /// Tear the component down: pause, stop and destroy as needed, then
    /// drop it from the host.
    pub async fn finish(&self, id: ComponentId) -> HostResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Finish { id, reply })?;
        self.call("finish", rx).await
    }

    /// Ask the component to save its state into a fresh bundle
    pub async fn save_state(&self, id: ComponentId) -> HostResult<StateBundle> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SaveState { id, reply })?;
        self.call("save_state", rx).await
    }

    pub async fn restore_state(&self, id: ComponentId, bundle: StateBundle) -> HostResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::RestoreState { id, bundle, reply })?;
        self.call("restore_state", rx).await
    }

    /// Deliver one key event to the focus target; returns after delivery
    pub async fn send_key(&self, event: KeyEvent) -> HostResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Key { event, reply })?;
        self.call("send_key", rx).await
    }

    /// Deliver a down/up pair for `code`; returns after both were seen by
    /// the focus target
    pub async fn send_key_down_up(&self, code: KeyCode) -> HostResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::KeyDownUp { code, reply })?;
        self.call("send_key_down_up", rx).await
    }

    pub(crate) async fn show_dialog(&self, dialog: Dialog) -> HostResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::ShowDialog { dialog, reply })?;
        self.call("show_dialog", rx).await
    }

    /// Snapshot of the live component stack
    pub async fn task_snapshot(&self) -> HostResult<TaskSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply })?;
        self.call("task_snapshot", rx).await
    }

    /// Barrier: resolves once every command queued before it has been
    /// processed.
    pub async fn wait_for_idle(&self) -> HostResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Idle { reply })?;
        match timeout(self.config.reply_timeout, rx).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(HostError::LoopClosed),
            Err(_) => Err(HostError::ReplyTimeout {
                operation: "wait_for_idle".to_string(),
                timeout: self.config.reply_timeout,
            }),
        }
    }

    /// Finish every remaining component and stop the loop.
    pub async fn shutdown(&self) -> HostResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown { reply })?;
        match timeout(self.config.reply_timeout, rx).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {}
            Err(_) => {
                warn!("host loop did not confirm shutdown in time");
            }
        }
        let task = {
            let mut guard = match self.loop_task.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.take()
        };
        if let Some(task) = task {
            let _ = task.await;
        }
        Ok(())
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

struct Cell {
    component: Box<dyn Component>,
    lifecycle: Lifecycle,
    name: String,
}

struct HostLoop {
    components: HashMap<ComponentId, Cell>,
    stack: Vec<ComponentId>,
    dialogs: Vec<Dialog>,
    graph: TransitionGraph,
    next_id: u64,
}

impl HostLoop {
    fn new() -> Self {
        Self {
            components: HashMap::new(),
            stack: Vec::new(),
            dialogs: Vec::new(),
            graph: TransitionGraph::new(),
            next_id: 1,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        debug!("host loop started");
        while let Some(command) = rx.recv().await {
            match command {
                Command::Launch { component, reply } => {
                    let _ = reply.send(self.launch(component).await);
                }
                Command::Pause { id, reply } => {
                    let _ = reply.send(self.hop(id, LifecycleState::Paused).await);
                }
                Command::Resume { id, reply } => {
                    let _ = reply.send(self.resume(id).await);
                }
                Command::Stop { id, reply } => {
                    let _ = reply.send(self.stop(id).await);
                }
                Command::Finish { id, reply } => {
                    let _ = reply.send(self.finish(id).await);
                }
                Command::SaveState { id, reply } => {
                    let _ = reply.send(self.save_state(id).await);
                }
                Command::RestoreState { id, bundle, reply } => {
                    let _ = reply.send(self.restore_state(id, bundle).await);
                }
                Command::Key { event, reply } => {
                    let _ = reply.send(self.deliver_key(event).await);
                }
                Command::KeyDownUp { code, reply } => {
                    let mut result = self.deliver_key(KeyEvent::down(code)).await;
                    if result.is_ok() {
                        result = self.deliver_key(KeyEvent::up(code)).await;
                    }
                    let _ = reply.send(result);
                }
                Command::ShowDialog { dialog, reply } => {
                    dialog.open();
                    self.dialogs.push(dialog);
                    let _ = reply.send(Ok(()));
                }
                Command::RemoveDialog { dialog_id } => {
                    self.dialogs.retain(|d| d.id() != dialog_id);
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(Ok(self.snapshot()));
                }
                Command::Idle { reply } => {
                    let _ = reply.send(());
                }
                Command::Shutdown { reply } => {
                    self.shutdown_all().await;
                    let _ = reply.send(());
                    break;
                }
            }
        }
        debug!("host loop stopped");
    }

    fn state_of(&self, id: ComponentId) -> HostResult<LifecycleState> {
        self.components
            .get(&id)
            .map(|cell| cell.lifecycle.state())
            .ok_or(HostError::ComponentNotFound { id })
    }

    /// Take one lifecycle hop and deliver the matching callback
    async fn hop(&mut self, id: ComponentId, to: LifecycleState) -> HostResult<()> {
        let cell = self
            .components
            .get_mut(&id)
            .ok_or(HostError::ComponentNotFound { id })?;
        cell.lifecycle.advance(&self.graph, to)?;
        debug!(%id, state = %to, "lifecycle transition");
        match to {
            LifecycleState::Created => {
                let ctx = ComponentContext { id };
                cell.component.on_create(&ctx).await;
            }
            LifecycleState::Started => cell.component.on_start().await,
            LifecycleState::Resumed => cell.component.on_resume().await,
            LifecycleState::Paused => cell.component.on_pause().await,
            LifecycleState::Stopped => cell.component.on_stop().await,
            LifecycleState::Restarted => cell.component.on_restart().await,
            LifecycleState::Destroyed => cell.component.on_destroy().await,
            LifecycleState::Launched => {}
        }
        Ok(())
    }

    async fn launch(&mut self, component: Box<dyn Component>) -> HostResult<ComponentId> {
        let id = ComponentId(self.next_id);
        self.next_id += 1;
        let name = component.name().to_string();
        self.components.insert(
            id,
            Cell {
                component,
                lifecycle: Lifecycle::new(),
                name: name.clone(),
            },
        );
        self.hop(id, LifecycleState::Created).await?;
        self.hop(id, LifecycleState::Started).await?;
        self.hop(id, LifecycleState::Resumed).await?;
        self.stack.push(id);
        info!(%id, name, "component launched");
        Ok(id)
    }

    async fn resume(&mut self, id: ComponentId) -> HostResult<()> {
        match self.state_of(id)? {
            LifecycleState::Resumed => Ok(()),
            LifecycleState::Stopped => {
                self.hop(id, LifecycleState::Restarted).await?;
                self.hop(id, LifecycleState::Started).await?;
                self.hop(id, LifecycleState::Resumed).await
            }
            _ => self.hop(id, LifecycleState::Resumed).await,
        }
    }

    async fn stop(&mut self, id: ComponentId) -> HostResult<()> {
        if self.state_of(id)? == LifecycleState::Resumed {
            self.hop(id, LifecycleState::Paused).await?;
        }
        self.hop(id, LifecycleState::Stopped).await
    }

    async fn finish(&mut self, id: ComponentId) -> HostResult<()> {
        if self.state_of(id)? == LifecycleState::Resumed {
            self.hop(id, LifecycleState::Paused).await?;
        }
        if self.state_of(id)? == LifecycleState::Paused {
            self.hop(id, LifecycleState::Stopped).await?;
        }
        self.hop(id, LifecycleState::Destroyed).await?;
        self.components.remove(&id);
        self.stack.retain(|c| *c != id);
        info!(%id, "component finished");
        Ok(())
    }

    async fn save_state(&mut self, id: ComponentId) -> HostResult<StateBundle> {
        let cell = self
            .components
            .get_mut(&id)
            .ok_or(HostError::ComponentNotFound { id })?;
        let mut bundle = StateBundle::new();
        cell.component.on_save_state(&mut bundle).await;
        Ok(bundle)
    }

    async fn restore_state(&mut self, id: ComponentId, bundle: StateBundle) -> HostResult<()> {
        let cell = self
            .components
            .get_mut(&id)
            .ok_or(HostError::ComponentNotFound { id })?;
        cell.component.on_restore_state(&bundle).await;
        Ok(())
    }

    async fn deliver_key(&mut self, event: KeyEvent) -> HostResult<()> {
        // drop dialogs that dismissed themselves since the last event
        self.dialogs.retain(|d| d.is_showing());
        if let Some(dialog) = self.dialogs.last() {
            dialog.deliver_key(event);
            return Ok(());
        }
        let Some(&id) = self.stack.last() else {
            warn!(?event, "key event dropped: nothing focused");
            return Ok(());
        };
        let cell = self
            .components
            .get_mut(&id)
            .ok_or(HostError::ComponentNotFound { id })?;
        let consumed = match event.action {
            crate::input::KeyAction::Down => cell.component.on_key_down(event).await,
            crate::input::KeyAction::Up => cell.component.on_key_up(event).await,
        };
        debug!(?event, consumed, "key delivered");
        Ok(())
    }

    fn snapshot(&self) -> TaskSnapshot {
        let name_of = |id: &ComponentId| self.components.get(id).map(|c| c.name.clone());
        let running = self
            .stack
            .iter()
            .filter(|id| {
                self.components
                    .get(*id)
                    .map(|c| c.lifecycle.state() == LifecycleState::Resumed)
                    .unwrap_or(false)
            })
            .count() as u32;
        TaskSnapshot {
            id: 1,
            base_component: self.stack.first().and_then(name_of),
            top_component: self.stack.last().and_then(name_of),
            component_count: self.stack.len() as u32,
            running_count: running,
            thumbnail: None,
            description: None,
        }
    }

    async fn shutdown_all(&mut self) {
        self.dialogs.clear();
        for id in self.stack.clone().into_iter().rev() {
            if let Err(error) = self.finish(id).await {
                warn!(%id, %error, "failed to finish component during shutdown");
            }
        }
    }
}
