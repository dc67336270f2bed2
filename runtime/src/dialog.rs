//! Dialogs: modal surfaces layered above components on the focus stack.
//!
//! A [`Dialog`] is a cheap cloneable handle; all clones share one state.
//! Listeners are registered as closures, so a test injects its capture
//! handle directly instead of subclassing. Cancel semantics follow the
//! documented contract: cancel fires the cancel listener exactly once,
//! then dismisses; dismiss alone never fires the cancel listener; the
//! back key cancels only while the dialog is cancelable.

use crate::host::{Command, Host, HostResult};
use crate::input::{KeyCode, KeyEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

static NEXT_DIALOG_ID: AtomicU64 = AtomicU64::new(1);

type Listener = Arc<dyn Fn() + Send + Sync>;
type KeyListener = Arc<dyn Fn(KeyEvent) + Send + Sync>;

struct DialogState {
    showing: bool,
    cancelable: bool,
    on_show: Option<Listener>,
    on_cancel: Option<Listener>,
    on_dismiss: Option<Listener>,
    on_key: Option<KeyListener>,
    host: Option<UnboundedSender<Command>>,
}

/// Handle to one dialog
#[derive(Clone)]
pub struct Dialog {
    id: u64,
    state: Arc<Mutex<DialogState>>,
}

impl Dialog {
    pub fn new() -> Self {
        Self {
            id: NEXT_DIALOG_ID.fetch_add(1, Ordering::Relaxed),
            state: Arc::new(Mutex::new(DialogState {
                showing: false,
                cancelable: true,
                on_show: None,
                on_cancel: None,
                on_dismiss: None,
                on_key: None,
                host: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DialogState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub fn is_showing(&self) -> bool {
        self.lock().showing
    }

    pub fn is_cancelable(&self) -> bool {
        self.lock().cancelable
    }

    pub fn set_cancelable(&self, cancelable: bool) {
        self.lock().cancelable = cancelable;
    }

    pub fn set_on_show(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.lock().on_show = Some(Arc::new(listener));
    }

    pub fn set_on_cancel(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.lock().on_cancel = Some(Arc::new(listener));
    }

    pub fn set_on_dismiss(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.lock().on_dismiss = Some(Arc::new(listener));
    }

    /// Observe every key event delivered to this dialog
    pub fn set_on_key(&self, listener: impl Fn(KeyEvent) + Send + Sync + 'static) {
        self.lock().on_key = Some(Arc::new(listener));
    }

    /// Put the dialog on top of the host's focus stack.
    ///
    /// Showing an already-showing dialog is a no-op.
    pub async fn show(&self, host: &Host) -> HostResult<()> {
        if self.is_showing() {
            return Ok(());
        }
        self.lock().host = Some(host.sender());
        host.show_dialog(self.clone()).await
    }

    /// Host-side: mark shown and fire the show listener
    pub(crate) fn open(&self) {
        let on_show = {
            let mut state = self.lock();
            if state.showing {
                None
            } else {
                state.showing = true;
                state.on_show.clone()
            }
        };
        if let Some(listener) = on_show {
            listener();
        }
        debug!(dialog = self.id, "dialog shown");
    }

    /// Cancel the dialog: fire the cancel listener once, then dismiss.
    ///
    /// A dialog that is not showing ignores the call, which is what makes
    /// "exactly once" hold even if cancel races the back key.
    pub fn cancel(&self) {
        let (on_cancel, on_dismiss, host) = {
            let mut state = self.lock();
            if !state.showing {
                return;
            }
            state.showing = false;
            (
                state.on_cancel.clone(),
                state.on_dismiss.clone(),
                state.host.clone(),
            )
        };
        debug!(dialog = self.id, "dialog cancelled");
        if let Some(listener) = on_cancel {
            listener();
        }
        if let Some(listener) = on_dismiss {
            listener();
        }
        if let Some(tx) = host {
            let _ = tx.send(Command::RemoveDialog { dialog_id: self.id });
        }
    }

    /// Dismiss without cancelling; the cancel listener does not fire.
    pub fn dismiss(&self) {
        let (on_dismiss, host) = {
            let mut state = self.lock();
            if !state.showing {
                return;
            }
            state.showing = false;
            (state.on_dismiss.clone(), state.host.clone())
        };
        debug!(dialog = self.id, "dialog dismissed");
        if let Some(listener) = on_dismiss {
            listener();
        }
        if let Some(tx) = host {
            let _ = tx.send(Command::RemoveDialog { dialog_id: self.id });
        }
    }

    /// Host-side key delivery. The dialog consumes every key; back cancels
    /// when cancelable.
    pub(crate) fn deliver_key(&self, event: KeyEvent) {
        let on_key = self.lock().on_key.clone();
        if let Some(listener) = on_key {
            listener(event);
        }
        if event.code == KeyCode::Back && event.is_down() && self.is_cancelable() {
            self.cancel();
        }
    }
}

impl Default for Dialog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialog")
            .field("id", &self.id)
            .field("showing", &self.is_showing())
            .field("cancelable", &self.is_cancelable())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn cancel_fires_listener_once_then_dismisses() {
        let dialog = Dialog::new();
        let cancels = Arc::new(AtomicU32::new(0));
        let dismisses = Arc::new(AtomicU32::new(0));
        {
            let cancels = cancels.clone();
            dialog.set_on_cancel(move || {
                cancels.fetch_add(1, Ordering::SeqCst);
            });
        }
        {
            let dismisses = dismisses.clone();
            dialog.set_on_dismiss(move || {
                dismisses.fetch_add(1, Ordering::SeqCst);
            });
        }

        dialog.open();
        assert!(dialog.is_showing());

        dialog.cancel();
        assert!(!dialog.is_showing());
        assert_eq!(cancels.load(Ordering::SeqCst), 1);
        assert_eq!(dismisses.load(Ordering::SeqCst), 1);

        // second cancel is a no-op
        dialog.cancel();
        assert_eq!(cancels.load(Ordering::SeqCst), 1);
        assert_eq!(dismisses.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dismiss_does_not_fire_cancel_listener() {
        let dialog = Dialog::new();
        let cancels = Arc::new(AtomicU32::new(0));
        {
            let cancels = cancels.clone();
            dialog.set_on_cancel(move || {
                cancels.fetch_add(1, Ordering::SeqCst);
            });
        }
        dialog.open();
        dialog.dismiss();
        assert!(!dialog.is_showing());
        assert_eq!(cancels.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn back_key_respects_cancelable_flag() {
        let dialog = Dialog::new();
        dialog.open();

        dialog.set_cancelable(false);
        dialog.deliver_key(KeyEvent::down(KeyCode::Back));
        dialog.deliver_key(KeyEvent::up(KeyCode::Back));
        assert!(dialog.is_showing());

        dialog.set_cancelable(true);
        dialog.deliver_key(KeyEvent::down(KeyCode::Back));
        assert!(!dialog.is_showing());
    }

    #[test]
    fn key_listener_sees_delivered_events() {
        let dialog = Dialog::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = seen.clone();
            dialog.set_on_key(move |event| {
                seen.lock().unwrap().push(event);
            });
        }
        dialog.open();
        dialog.deliver_key(KeyEvent::down(KeyCode::Enter));
        dialog.deliver_key(KeyEvent::up(KeyCode::Enter));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], KeyEvent::down(KeyCode::Enter));
        assert!(dialog.is_showing());
    }

    #[test]
    fn show_listener_fires_on_open_only_once() {
        let dialog = Dialog::new();
        let shows = Arc::new(AtomicU32::new(0));
        {
            let shows = shows.clone();
            dialog.set_on_show(move || {
                shows.fetch_add(1, Ordering::SeqCst);
            });
        }
        dialog.open();
        dialog.open();
        assert_eq!(shows.load(Ordering::SeqCst), 1);
    }
}
