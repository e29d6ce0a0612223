//! Type-safe key bindings shared by every panel component.
//!
//! A [`Binding`] groups one or more key presses under a single action together
//! with the short help text shown in hint lines. Components expose their
//! bindings through a keymap struct implementing [`KeyMap`].
//!
//! ```rust
//! use bubbletea_panels::key::Binding;
//! use crossterm::event::{KeyCode, KeyModifiers};
//!
//! let refresh = Binding::new(vec![KeyCode::Char('r')]).with_help("r", "refresh");
//! let web = Binding::new(vec![(KeyCode::Char('i'), KeyModifiers::CONTROL)])
//!     .with_help("ctrl+i", "use web");
//! assert_eq!(refresh.help().key, "r");
//! assert!(web.enabled());
//! ```

use bubbletea_rs::KeyMsg;
use crossterm::event::{KeyCode, KeyModifiers};

/// A single key press: a key code plus the modifiers that must be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// The key code.
    pub code: KeyCode,
    /// Required modifiers. `NONE` matches presses without control/alt.
    pub modifiers: KeyModifiers,
}

impl From<KeyCode> for KeyPress {
    fn from(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }
}

impl From<(KeyCode, KeyModifiers)> for KeyPress {
    fn from((code, modifiers): (KeyCode, KeyModifiers)) -> Self {
        Self { code, modifiers }
    }
}

impl KeyPress {
    fn matches(&self, msg: &KeyMsg) -> bool {
        if self.code != msg.key {
            return false;
        }
        // Shift is folded into the character itself for Char codes.
        let relevant = msg.modifiers & (KeyModifiers::CONTROL | KeyModifiers::ALT);
        relevant == self.modifiers & (KeyModifiers::CONTROL | KeyModifiers::ALT)
    }
}

/// Help text attached to a binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Help {
    /// Short key label, e.g. `"←/h"`.
    pub key: String,
    /// What the binding does, e.g. `"prev page"`.
    pub desc: String,
}

/// A set of key presses bound to one action.
#[derive(Debug, Clone)]
pub struct Binding {
    keys: Vec<KeyPress>,
    help: Help,
    disabled: bool,
}

impl Binding {
    /// Creates a binding matching any of `keys`.
    pub fn new<K: Into<KeyPress>>(keys: Vec<K>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            help: Help::default(),
            disabled: false,
        }
    }

    /// Sets the help label and description (builder pattern).
    pub fn with_help(mut self, key: impl Into<String>, desc: impl Into<String>) -> Self {
        self.help = Help {
            key: key.into(),
            desc: desc.into(),
        };
        self
    }

    /// Enables or disables the binding. Disabled bindings never match.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.disabled = !enabled;
    }

    /// Whether the binding is active.
    pub fn enabled(&self) -> bool {
        !self.disabled && !self.keys.is_empty()
    }

    /// Help text for hint lines.
    pub fn help(&self) -> &Help {
        &self.help
    }

    /// The key presses this binding responds to.
    pub fn keys(&self) -> &[KeyPress] {
        &self.keys
    }

    /// Returns true if `msg` is one of this binding's key presses.
    pub fn matches(&self, msg: &KeyMsg) -> bool {
        self.enabled() && self.keys.iter().any(|k| k.matches(msg))
    }
}

/// Implemented by component keymaps so hosts can render hint lines.
pub trait KeyMap {
    /// Bindings for the compact, single-line hint view.
    fn short_help(&self) -> Vec<&Binding>;

    /// Renders the enabled short-help bindings as `key desc • key desc`.
    fn hint_line(&self) -> String {
        self.short_help()
            .into_iter()
            .filter(|b| b.enabled())
            .map(|b| format!("{} {}", b.help().key, b.help().desc))
            .collect::<Vec<_>>()
            .join(" • ")
    }
}
