//! Anchored dropdown menu.
//!
//! The dropdown renders a trigger inline and, when opened, a floating panel of
//! options attached to the trigger's on-screen rectangle. The panel is not part
//! of the normal layout: hosts render their frame first and then call
//! [`Model::overlay`] so that surrounding containers can neither clip nor cover
//! it.
//!
//! While the panel is open the dropdown owns a [`PanelListeners`] set taken
//! from the shared [`Registry`]. Layout changes, resizes and scrolls re-measure
//! the anchor; a pointer press outside both the trigger and the panel closes
//! it. Closing drops the listeners.
//!
//! # Basic Usage
//!
//! ```rust
//! use bubbletea_panels::dropdown::{DropdownOption, Model};
//! use bubbletea_panels::geometry::{Direction, Rect};
//! use bubbletea_panels::subscription::Registry;
//!
//! let registry = Registry::new();
//! let mut dropdown = Model::new("gpt-4o", &registry)
//!     .with_options(vec![
//!         DropdownOption::new("gpt-4o"),
//!         DropdownOption::new("o1").unavailable(true),
//!     ])
//!     .with_direction(Direction::Up);
//!
//! dropdown.set_trigger_rect(Rect::new(2, 20, 6, 1));
//! dropdown.open();
//! assert!(dropdown.is_open());
//! dropdown.close();
//! assert_eq!(registry.total_active(), 0);
//! ```

use crate::geometry::{self, Direction, Placement, Rect};
use crate::key::{Binding, KeyMap};
use crate::subscription::{PanelListeners, Registry, Topic};
use crate::Component;
use bubbletea_rs::{Cmd, KeyMsg, Msg, WindowSizeMsg};
use crossterm::event::KeyCode;
use lipgloss_extras::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// Sent by the host whenever the arrangement of its view changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutChangedMsg;

/// Sent by the host whenever a scrollable region moved.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollMsg;

/// A pointer press at a screen cell, translated by the host from its mouse
/// events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerDownMsg {
    /// Column of the press.
    pub x: i32,
    /// Row of the press.
    pub y: i32,
}

/// Reports the current rectangle of a trigger.
///
/// Implemented for closures so hosts can close over their layout state.
pub trait AnchorProbe: Send + Sync {
    /// The trigger's rectangle, or `None` if it is not on screen.
    fn measure(&self) -> Option<Rect>;
}

impl<F> AnchorProbe for F
where
    F: Fn() -> Option<Rect> + Send + Sync,
{
    fn measure(&self) -> Option<Rect> {
        self()
    }
}

/// Invoked when an option is chosen. A returned message is delivered to the
/// application as a command.
pub type Action = Arc<dyn Fn() -> Option<Msg> + Send + Sync>;

/// Invoked when the panel opens or closes.
pub type Hook = Arc<dyn Fn() + Send + Sync>;

/// One entry of the panel.
#[derive(Clone)]
pub struct DropdownOption {
    /// Text shown for the entry.
    pub label: String,
    /// What selecting the entry does.
    pub action: Option<Action>,
    /// Unavailable entries are shown but cannot be chosen.
    pub unavailable: bool,
}

impl fmt::Debug for DropdownOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropdownOption")
            .field("label", &self.label)
            .field("action", &self.action.is_some())
            .field("unavailable", &self.unavailable)
            .finish()
    }
}

impl DropdownOption {
    /// An entry without an action.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: None,
            unavailable: false,
        }
    }

    /// Sets the action (builder pattern).
    pub fn on_select<F>(mut self, action: F) -> Self
    where
        F: Fn() -> Option<Msg> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// Marks the entry unavailable (builder pattern).
    pub fn unavailable(mut self, unavailable: bool) -> Self {
        self.unavailable = unavailable;
        self
    }
}

/// Key bindings for the dropdown.
#[derive(Debug, Clone)]
pub struct DropdownKeyMap {
    /// Opens or closes the panel while the trigger is focused.
    pub toggle: Binding,
    /// Moves the option cursor up.
    pub up: Binding,
    /// Moves the option cursor down.
    pub down: Binding,
    /// Chooses the option under the cursor.
    pub select: Binding,
    /// Closes the panel.
    pub close: Binding,
}

impl Default for DropdownKeyMap {
    fn default() -> Self {
        Self {
            toggle: Binding::new(vec![KeyCode::Enter, KeyCode::Char(' ')]).with_help("enter", "open"),
            up: Binding::new(vec![KeyCode::Up, KeyCode::Char('k')]).with_help("↑/k", "up"),
            down: Binding::new(vec![KeyCode::Down, KeyCode::Char('j')]).with_help("↓/j", "down"),
            select: Binding::new(vec![KeyCode::Enter]).with_help("enter", "choose"),
            close: Binding::new(vec![KeyCode::Esc]).with_help("esc", "close"),
        }
    }
}

impl KeyMap for DropdownKeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.up, &self.down, &self.select, &self.close]
    }
}

/// Styles for the trigger and the panel.
#[derive(Debug, Clone)]
pub struct Styles {
    /// Trigger while closed.
    pub trigger: Style,
    /// Trigger while open.
    pub trigger_open: Style,
    /// Selectable option.
    pub option: Style,
    /// Option under the cursor.
    pub option_cursor: Style,
    /// Unavailable option.
    pub unavailable: Style,
    /// Panel border.
    pub border: Style,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            trigger: Style::new(),
            trigger_open: Style::new().bold(true),
            option: Style::new(),
            option_cursor: Style::new().foreground(AdaptiveColor {
                Light: "#1a1a1a",
                Dark: "#dddddd",
            }),
            unavailable: Style::new().foreground(AdaptiveColor {
                Light: "#A49FA5",
                Dark: "#777777",
            }),
            border: Style::new().foreground(AdaptiveColor {
                Light: "#DDDADA",
                Dark: "#3C3C3C",
            }),
        }
    }
}

#[derive(Debug)]
struct OpenState {
    anchor: Rect,
    cursor: usize,
    listeners: PanelListeners,
}

/// The anchored dropdown model.
pub struct Model {
    /// Text of the trigger.
    pub value: String,
    /// Entries of the panel.
    pub options: Vec<DropdownOption>,
    /// Which way the panel opens.
    pub direction: Direction,
    /// Attach the panel's right edge to the trigger's right edge.
    pub right_align: bool,
    /// Close after an available option was chosen.
    pub close_on_select: bool,
    /// Key bindings.
    pub keymap: DropdownKeyMap,
    /// Styles.
    pub styles: Styles,
    id: i64,
    focus: bool,
    registry: Registry,
    probe: Option<Arc<dyn AnchorProbe>>,
    trigger_rect: Rect,
    open: Option<OpenState>,
    on_open: Option<Hook>,
    on_close: Option<Hook>,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("value", &self.value)
            .field("options", &self.options)
            .field("direction", &self.direction)
            .field("right_align", &self.right_align)
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Creates a closed dropdown whose listeners come from `registry`.
    pub fn new(value: impl Into<String>, registry: &Registry) -> Self {
        Self {
            value: value.into(),
            options: Vec::new(),
            direction: Direction::Down,
            right_align: false,
            close_on_select: true,
            keymap: DropdownKeyMap::default(),
            styles: Styles::default(),
            id: next_id(),
            focus: false,
            registry: registry.clone(),
            probe: None,
            trigger_rect: Rect::default(),
            open: None,
            on_open: None,
            on_close: None,
        }
    }

    /// Sets the entries (builder pattern).
    pub fn with_options(mut self, options: Vec<DropdownOption>) -> Self {
        self.options = options;
        self
    }

    /// Sets the opening direction (builder pattern).
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Right-aligns the panel (builder pattern).
    pub fn with_right_align(mut self, right_align: bool) -> Self {
        self.right_align = right_align;
        self
    }

    /// Keeps the panel open after a choice when `false` (builder pattern).
    pub fn with_close_on_select(mut self, close_on_select: bool) -> Self {
        self.close_on_select = close_on_select;
        self
    }

    /// Measures the trigger through `probe` instead of the last reported rect.
    pub fn with_anchor_probe(mut self, probe: impl AnchorProbe + 'static) -> Self {
        self.probe = Some(Arc::new(probe));
        self
    }

    /// Called after the panel opened.
    pub fn with_open_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Arc::new(hook));
        self
    }

    /// Called after the panel closed.
    pub fn with_close_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(hook));
        self
    }

    /// Unique id of this instance.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Records where the host drew the trigger during its last render.
    pub fn set_trigger_rect(&mut self, rect: Rect) {
        self.trigger_rect = rect;
    }

    /// Whether the panel is showing.
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// The anchor captured at open time or by the latest re-measure.
    pub fn anchor(&self) -> Option<Rect> {
        self.open.as_ref().map(|o| o.anchor)
    }

    /// Index of the option under the cursor while open.
    pub fn cursor(&self) -> Option<usize> {
        self.open.as_ref().map(|o| o.cursor)
    }

    fn measure(&self) -> Rect {
        self.probe
            .as_ref()
            .and_then(|p| p.measure())
            .unwrap_or(self.trigger_rect)
    }

    /// Captures the trigger rectangle, attaches listeners and shows the panel.
    ///
    /// Opening an already open dropdown only re-measures the anchor.
    pub fn open(&mut self) {
        let anchor = self.measure();
        if let Some(state) = self.open.as_mut() {
            state.anchor = anchor;
            return;
        }
        let cursor = self.first_available().unwrap_or(0);
        self.open = Some(OpenState {
            anchor,
            cursor,
            listeners: PanelListeners::attach(&self.registry),
        });
        if let Some(hook) = &self.on_open {
            hook();
        }
    }

    /// Hides the panel, forgets the anchor and releases listeners.
    pub fn close(&mut self) {
        if self.open.take().is_some() {
            if let Some(hook) = &self.on_close {
                hook();
            }
        }
    }

    /// Closes an open panel or opens a closed one.
    pub fn toggle(&mut self) {
        if self.is_open() {
            self.close();
        } else {
            self.open();
        }
    }

    /// Re-reads the trigger geometry while open.
    pub fn remeasure(&mut self) {
        let anchor = self.measure();
        if let Some(state) = self.open.as_mut() {
            state.anchor = anchor;
        }
    }

    /// Chooses the option at `index`.
    ///
    /// Unavailable options and options without an action are ignored and
    /// leave the panel open. Otherwise the action runs, the panel closes
    /// unless `close_on_select` is off, and any message the action produced
    /// is returned as a command.
    pub fn select(&mut self, index: usize) -> Option<Cmd> {
        let option = self.options.get(index)?;
        if option.unavailable {
            return None;
        }
        let action = option.action.clone()?;
        let msg = action();
        if self.close_on_select {
            self.close();
        }
        msg.map(crate::emit)
    }

    fn first_available(&self) -> Option<usize> {
        self.options.iter().position(|o| !o.unavailable)
    }

    fn move_cursor(&mut self, forward: bool) {
        let len = self.options.len();
        let Some(state) = self.open.as_mut() else {
            return;
        };
        if len == 0 {
            return;
        }
        let mut idx = state.cursor;
        for _ in 0..len {
            idx = if forward {
                (idx + 1) % len
            } else {
                (idx + len - 1) % len
            };
            if !self.options[idx].unavailable {
                state.cursor = idx;
                return;
            }
        }
    }

    /// Where the panel is attached while open.
    pub fn placement(&self) -> Option<Placement> {
        self.anchor()
            .map(|a| Placement::for_anchor(a, self.direction, self.right_align))
    }

    fn panel_size(&self) -> (u16, u16) {
        let inner = self
            .options
            .iter()
            .map(|o| geometry::display_width(&o.label))
            .max()
            .unwrap_or(0);
        // Border plus one column of padding each side plus the cursor marker.
        let width = inner + 6;
        let height = self.options.len() + 2;
        (
            u16::try_from(width).unwrap_or(u16::MAX),
            u16::try_from(height).unwrap_or(u16::MAX),
        )
    }

    /// Screen rectangle covered by the panel while open.
    pub fn panel_rect(&self) -> Option<Rect> {
        let (w, h) = self.panel_size();
        self.placement().map(|p| p.panel_rect(w, h))
    }

    /// Handles pointer, layout and key messages.
    pub fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        if let Some(press) = msg.downcast_ref::<PointerDownMsg>() {
            return self.handle_pointer(*press);
        }

        if msg.downcast_ref::<LayoutChangedMsg>().is_some()
            || msg.downcast_ref::<ScrollMsg>().is_some()
            || msg.downcast_ref::<WindowSizeMsg>().is_some()
        {
            if self.is_open() {
                self.remeasure();
            }
            return None;
        }

        if let Some(key) = msg.downcast_ref::<KeyMsg>() {
            return self.handle_key(key);
        }

        None
    }

    fn handle_pointer(&mut self, press: PointerDownMsg) -> Option<Cmd> {
        if self.measure().contains(press.x, press.y) {
            self.toggle();
            return None;
        }
        let listening = self
            .open
            .as_ref()
            .is_some_and(|o| o.listeners.listens_to(Topic::PointerDown));
        if !listening {
            return None;
        }
        let panel = self.panel_rect()?;
        if panel.contains(press.x, press.y) {
            // First and last panel rows are the border.
            let row = press.y - panel.y - 1;
            if row >= 0 && (row as usize) < self.options.len() {
                return self.select(row as usize);
            }
            return None;
        }
        self.close();
        None
    }

    fn handle_key(&mut self, key: &KeyMsg) -> Option<Cmd> {
        if !self.focus {
            return None;
        }
        if !self.is_open() {
            if self.keymap.toggle.matches(key) {
                self.open();
            }
            return None;
        }
        if self.keymap.close.matches(key) {
            self.close();
        } else if self.keymap.up.matches(key) {
            self.move_cursor(false);
        } else if self.keymap.down.matches(key) {
            self.move_cursor(true);
        } else if self.keymap.select.matches(key) {
            let cursor = self.cursor()?;
            return self.select(cursor);
        }
        None
    }

    /// Renders the inline trigger.
    pub fn view(&self) -> String {
        let arrow = match (self.is_open(), self.direction) {
            (false, Direction::Down) | (true, Direction::Up) => "▾",
            (false, Direction::Up) | (true, Direction::Down) => "▴",
        };
        let text = format!("{} {}", self.value, arrow);
        if self.is_open() {
            self.styles.trigger_open.render(&text)
        } else {
            self.styles.trigger.render(&text)
        }
    }

    /// Renders the floating panel, or an empty string while closed.
    pub fn panel_view(&self) -> String {
        let Some(state) = self.open.as_ref() else {
            return String::new();
        };
        let (w, _) = self.panel_size();
        let inner = usize::from(w).saturating_sub(2);
        let border = &self.styles.border;

        let mut lines = Vec::with_capacity(self.options.len() + 2);
        lines.push(border.render(&format!("╭{}╮", "─".repeat(inner))));
        for (i, option) in self.options.iter().enumerate() {
            let marker = if i == state.cursor && !option.unavailable {
                ">"
            } else {
                " "
            };
            let pad = inner.saturating_sub(geometry::display_width(&option.label) + 3);
            let body = format!("{} {}{}", marker, option.label, " ".repeat(pad));
            let styled = if option.unavailable {
                self.styles.unavailable.render(&body)
            } else if i == state.cursor {
                self.styles.option_cursor.render(&body)
            } else {
                self.styles.option.render(&body)
            };
            lines.push(format!("{} {}{}", border.render("│"), styled, border.render("│")));
        }
        lines.push(border.render(&format!("╰{}╯", "─".repeat(inner))));
        lines.join("\n")
    }

    /// Draws the panel on top of a finished frame.
    pub fn overlay(&self, frame: &str) -> String {
        match self.panel_rect() {
            Some(rect) => geometry::overlay(frame, &self.panel_view(), rect.x, rect.y),
            None => frame.to_string(),
        }
    }
}

impl Component for Model {
    fn focus(&mut self) -> Option<Cmd> {
        self.focus = true;
        None
    }

    fn blur(&mut self) {
        self.focus = false;
        self.close();
    }

    fn focused(&self) -> bool {
        self.focus
    }
}
