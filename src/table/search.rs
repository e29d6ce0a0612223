//! Single-line search input shown above a searchable table.

use crate::key::{Binding, KeyMap};
use bubbletea_rs::KeyMsg;
use crossterm::event::{KeyCode, KeyModifiers};
use lipgloss_extras::prelude::*;
use unicode_segmentation::UnicodeSegmentation;

/// What a key press did to the search bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// The key was not for the search bar.
    Ignored,
    /// The text changed or focus moved.
    Edited,
    /// The user asked to run the search.
    Submitted(String),
}

/// Key bindings for the search bar.
#[derive(Debug, Clone)]
pub struct SearchKeyMap {
    /// Focuses the input.
    pub focus: Binding,
    /// Runs the search.
    pub submit: Binding,
    /// Leaves the input, keeping its text.
    pub blur: Binding,
    /// Clears the input.
    pub clear: Binding,
}

impl Default for SearchKeyMap {
    fn default() -> Self {
        Self {
            focus: Binding::new(vec![KeyCode::Char('/')]).with_help("/", "search"),
            submit: Binding::new(vec![KeyCode::Enter]).with_help("enter", "run search"),
            blur: Binding::new(vec![KeyCode::Esc]).with_help("esc", "done"),
            clear: Binding::new(vec![(KeyCode::Char('u'), KeyModifiers::CONTROL)])
                .with_help("ctrl+u", "clear"),
        }
    }
}

impl KeyMap for SearchKeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.submit, &self.blur, &self.clear]
    }
}

/// The search input.
#[derive(Debug, Clone)]
pub struct SearchBar {
    /// Current text.
    pub value: String,
    /// Shown while empty and unfocused.
    pub placeholder: String,
    /// Key bindings.
    pub keymap: SearchKeyMap,
    /// Prompt style.
    pub prompt_style: Style,
    /// Placeholder style.
    pub placeholder_style: Style,
    focus: bool,
}

impl Default for SearchBar {
    fn default() -> Self {
        Self {
            value: String::new(),
            placeholder: "Search...".to_string(),
            keymap: SearchKeyMap::default(),
            prompt_style: Style::new().foreground(AdaptiveColor {
                Light: "#04B575",
                Dark: "#ECFD65",
            }),
            placeholder_style: Style::new().foreground(AdaptiveColor {
                Light: "#909090",
                Dark: "#626262",
            }),
            focus: false,
        }
    }
}

impl SearchBar {
    /// An empty, unfocused search bar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether keys go to the input.
    pub fn focused(&self) -> bool {
        self.focus
    }

    /// Sends keys to the input.
    pub fn focus(&mut self) {
        self.focus = true;
    }

    /// Stops sending keys to the input.
    pub fn blur(&mut self) {
        self.focus = false;
    }

    fn pop_grapheme(&mut self) {
        if let Some((idx, _)) = self.value.grapheme_indices(true).next_back() {
            self.value.truncate(idx);
        }
    }

    /// Handles a key press.
    pub fn update(&mut self, key: &KeyMsg) -> SearchEvent {
        if !self.focus {
            if self.keymap.focus.matches(key) {
                self.focus = true;
                return SearchEvent::Edited;
            }
            return SearchEvent::Ignored;
        }

        if self.keymap.submit.matches(key) {
            return SearchEvent::Submitted(self.value.clone());
        }
        if self.keymap.blur.matches(key) {
            self.focus = false;
            return SearchEvent::Edited;
        }
        if self.keymap.clear.matches(key) {
            self.value.clear();
            return SearchEvent::Edited;
        }

        match key.key {
            KeyCode::Backspace => {
                self.pop_grapheme();
                SearchEvent::Edited
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.value.push(c);
                SearchEvent::Edited
            }
            // Swallow everything else while typing.
            _ => SearchEvent::Edited,
        }
    }

    /// Renders the input.
    pub fn view(&self) -> String {
        let prompt = self.prompt_style.render("/");
        if self.value.is_empty() && !self.focus {
            return format!("{} {}", prompt, self.placeholder_style.render(&self.placeholder));
        }
        let cursor = if self.focus { "▏" } else { "" };
        format!("{} {}{}", prompt, self.value, cursor)
    }
}
