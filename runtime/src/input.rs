//! Key input events delivered through the host's focus stack.

use serde::{Deserialize, Serialize};

/// Physical key identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Back,
    Home,
    Enter,
    Space,
    Tab,
    Escape,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Whether the key is going down or coming up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAction {
    Down,
    Up,
}

/// One key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub action: KeyAction,
    pub code: KeyCode,
}

impl KeyEvent {
    pub fn down(code: KeyCode) -> Self {
        Self {
            action: KeyAction::Down,
            code,
        }
    }

    pub fn up(code: KeyCode) -> Self {
        Self {
            action: KeyAction::Up,
            code,
        }
    }

    pub fn is_down(&self) -> bool {
        self.action == KeyAction::Down
    }
}
