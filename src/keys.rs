//! Keyboard shortcuts
//!
//! Key presses are aliases for regular input events: Enter submits the
//! current draft, Ctrl+H toggles the hint and Ctrl+Space toggles pause.

use serde::{Deserialize, Serialize};

/// A key press as reported by the front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPress {
    /// Key value, e.g. `"Enter"`, `"h"` or `" "`
    pub key: String,
    /// Whether Control was held
    #[serde(default)]
    pub ctrl: bool,
    /// Whether Shift was held
    #[serde(default)]
    pub shift: bool,
}

/// Game action bound to a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Submit the current draft
    Submit,
    /// Show or hide the hint
    ToggleHint,
    /// Pause or resume the clock
    TogglePause,
}

impl KeyPress {
    /// A plain key press without modifiers
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            shift: false,
        }
    }

    /// The same key press with Control held
    #[must_use]
    pub fn with_ctrl(self) -> Self {
        Self { ctrl: true, ..self }
    }

    /// The same key press with Shift held
    #[must_use]
    pub fn with_shift(self) -> Self {
        Self {
            shift: true,
            ..self
        }
    }

    /// The action this key press stands for, if any
    pub fn action(&self) -> Option<KeyAction> {
        match self.key.as_str() {
            "Enter" if !self.shift => Some(KeyAction::Submit),
            " " if self.ctrl => Some(KeyAction::TogglePause),
            key if self.ctrl && key.eq_ignore_ascii_case("h") => Some(KeyAction::ToggleHint),
            _ => None,
        }
    }
}
