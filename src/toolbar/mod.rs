//! Chat message toolbar.
//!
//! The toolbar composes small controls around one chat item: a model
//! selector, web search, "suggest question", image attachment, an overflow
//! menu and delete. Which controls show is decided by the rule table in
//! [`layout`]; the toolbar only renders them and routes input.
//!
//! Domain state stays with the host. The toolbar reads it from
//! [`ToolbarFlags`], the selected model and the model list, and reports user
//! intent through [`ToolbarCallbacks`]. A callback may return a message,
//! which the toolbar hands back as a command.
//!
//! The one piece of asynchronous state the toolbar owns is image attachment:
//! [`Model::attach_image`] opens an image picker, the chosen file is read in
//! the background and passed to `set_images` as a data URL.
//!
//! ```rust
//! use bubbletea_panels::subscription::Registry;
//! use bubbletea_panels::toolbar::{
//!     layout::Control, Model, SelectedModel, ToolbarCallbacks, ToolbarFlags,
//! };
//!
//! let registry = Registry::new();
//! let callbacks = ToolbarCallbacks::default().on_remove_chat(|| None);
//! let mut toolbar = Model::new(&registry, callbacks).with_selected_model(SelectedModel {
//!     name: "gpt-4o".into(),
//!     accepts_images: true,
//! });
//!
//! toolbar.set_flags(ToolbarFlags { can_edit: true, ..ToolbarFlags::default() });
//! assert!(toolbar.visible_controls().contains(&Control::Delete));
//!
//! toolbar.set_flags(ToolbarFlags { can_edit: true, is_answering: true, ..ToolbarFlags::default() });
//! assert!(!toolbar.visible_controls().contains(&Control::Delete));
//! ```

pub mod attach;
pub mod layout;
pub mod slider;

pub use attach::{ImageAttachFailedMsg, ImageAttachedMsg};
pub use slider::Slider;

use crate::dropdown::{self, DropdownOption, LayoutChangedMsg, PointerDownMsg, ScrollMsg};
use crate::filepicker::{self, FileSelectedMsg, ReadDirMsg};
use crate::geometry::{self, Direction, Rect};
use crate::key::{Binding, KeyMap};
use crate::spinner::Model as Spinner;
use crate::subscription::Registry;
use crate::Component;
use bubbletea_rs::{Cmd, KeyMsg, Msg, WindowSizeMsg};
use crossterm::event::{KeyCode, KeyModifiers};
use layout::{Control, LayoutInputs, OverflowItem};
use lipgloss_extras::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// A user-intent callback.
pub type Callback = dropdown::Action;
/// Receives the attached images.
pub type ImagesSetter = Arc<dyn Fn(Vec<String>) -> Option<Msg> + Send + Sync>;
/// Receives the randomness, 0 to 100.
pub type RandomnessSetter = Arc<dyn Fn(u8) -> Option<Msg> + Send + Sync>;
/// Receives the chosen model.
pub type ModelSetter = Arc<dyn Fn(&UserModel) -> Option<Msg> + Send + Sync>;

/// State of the chat item the toolbar belongs to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolbarFlags {
    /// The chat ignores its source document.
    pub detached: bool,
    /// The user may edit the chat.
    pub can_edit: bool,
    /// The chat is loading.
    pub is_loading: bool,
    /// An answer is streaming.
    pub is_answering: bool,
    /// Web search is on.
    pub use_web: bool,
    /// The item already has images.
    pub has_images: bool,
    /// Sampling temperature in `[0, 1]`, if set.
    pub temperature: Option<f32>,
    /// Show the web-search shortcut next to the toggle.
    pub show_use_web_hint: bool,
    /// Open menus upwards.
    pub dropdown_goes_up: bool,
    /// A question suggestion is being fetched.
    pub suggest_loading: bool,
}

/// The model the chat currently uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedModel {
    /// Display name.
    pub name: String,
    /// Accepts image input.
    pub accepts_images: bool,
}

/// A model the user can switch to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserModel {
    /// Display name.
    pub name: String,
    /// Usable on the user's plan.
    pub available: bool,
    /// Accepts image input.
    pub accepts_images: bool,
}

/// Loading state of the user's model list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelListState {
    /// Still loading.
    #[default]
    Loading,
    /// Loaded.
    Loaded,
    /// Could not be loaded.
    Failed,
}

/// Host callbacks. Controls whose callback is missing do nothing, and delete
/// is hidden without `remove_chat`.
#[derive(Clone, Default)]
pub struct ToolbarCallbacks {
    /// Flip web search.
    pub toggle_use_web: Option<Callback>,
    /// Ask for a suggested question.
    pub suggest_question: Option<Callback>,
    /// Delete the chat.
    pub remove_chat: Option<Callback>,
    /// Flip detached.
    pub toggle_detached: Option<Callback>,
    /// Replace the item's images.
    pub set_images: Option<ImagesSetter>,
    /// Set the randomness.
    pub set_randomness: Option<RandomnessSetter>,
    /// Switch model.
    pub set_user_model: Option<ModelSetter>,
}

impl fmt::Debug for ToolbarCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolbarCallbacks")
            .field("toggle_use_web", &self.toggle_use_web.is_some())
            .field("suggest_question", &self.suggest_question.is_some())
            .field("remove_chat", &self.remove_chat.is_some())
            .field("toggle_detached", &self.toggle_detached.is_some())
            .field("set_images", &self.set_images.is_some())
            .field("set_randomness", &self.set_randomness.is_some())
            .field("set_user_model", &self.set_user_model.is_some())
            .finish()
    }
}

impl ToolbarCallbacks {
    /// Sets `toggle_use_web` (builder pattern).
    pub fn on_toggle_use_web(mut self, f: impl Fn() -> Option<Msg> + Send + Sync + 'static) -> Self {
        self.toggle_use_web = Some(Arc::new(f));
        self
    }

    /// Sets `suggest_question` (builder pattern).
    pub fn on_suggest_question(
        mut self,
        f: impl Fn() -> Option<Msg> + Send + Sync + 'static,
    ) -> Self {
        self.suggest_question = Some(Arc::new(f));
        self
    }

    /// Sets `remove_chat` (builder pattern).
    pub fn on_remove_chat(mut self, f: impl Fn() -> Option<Msg> + Send + Sync + 'static) -> Self {
        self.remove_chat = Some(Arc::new(f));
        self
    }

    /// Sets `toggle_detached` (builder pattern).
    pub fn on_toggle_detached(
        mut self,
        f: impl Fn() -> Option<Msg> + Send + Sync + 'static,
    ) -> Self {
        self.toggle_detached = Some(Arc::new(f));
        self
    }

    /// Sets `set_images` (builder pattern).
    pub fn on_set_images(
        mut self,
        f: impl Fn(Vec<String>) -> Option<Msg> + Send + Sync + 'static,
    ) -> Self {
        self.set_images = Some(Arc::new(f));
        self
    }

    /// Sets `set_randomness` (builder pattern).
    pub fn on_set_randomness(mut self, f: impl Fn(u8) -> Option<Msg> + Send + Sync + 'static) -> Self {
        self.set_randomness = Some(Arc::new(f));
        self
    }

    /// Sets `set_user_model` (builder pattern).
    pub fn on_set_user_model(
        mut self,
        f: impl Fn(&UserModel) -> Option<Msg> + Send + Sync + 'static,
    ) -> Self {
        self.set_user_model = Some(Arc::new(f));
        self
    }
}

fn run(callback: &Option<Callback>) -> Option<Cmd> {
    callback.as_ref().and_then(|f| f()).map(crate::emit)
}

/// Deployment switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolbarConfig {
    /// Hide every web-search control.
    pub disable_web: bool,
}

impl ToolbarConfig {
    /// Reads `DISABLE_WEB` from the environment.
    pub fn from_env() -> Self {
        Self {
            disable_web: env_flag(std::env::var("DISABLE_WEB").ok().as_deref()),
        }
    }
}

/// Unset, empty, `0`, `false` and `no` are off; anything else is on.
fn env_flag(value: Option<&str>) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => false,
        Some(v) => !matches!(v.as_str(), "" | "0" | "false" | "no"),
    }
}

/// Key bindings for the toolbar.
#[derive(Debug, Clone)]
pub struct ToolbarKeyMap {
    /// Focus the next control.
    pub next: Binding,
    /// Focus the previous control.
    pub prev: Binding,
    /// Activate the focused control.
    pub activate: Binding,
    /// Flip web search from anywhere in the toolbar.
    pub use_web: Binding,
    /// Close the image picker.
    pub cancel: Binding,
    /// Raise the randomness while its menu row is under the cursor.
    pub more_random: Binding,
    /// Lower the randomness while its menu row is under the cursor.
    pub less_random: Binding,
}

impl Default for ToolbarKeyMap {
    fn default() -> Self {
        Self {
            next: Binding::new(vec![KeyCode::Tab, KeyCode::Right]).with_help("tab", "next"),
            prev: Binding::new(vec![KeyCode::BackTab, KeyCode::Left]).with_help("shift+tab", "prev"),
            activate: Binding::new(vec![KeyCode::Enter, KeyCode::Char(' ')])
                .with_help("enter", "select"),
            use_web: Binding::new(vec![(KeyCode::Char('i'), KeyModifiers::CONTROL)])
                .with_help("ctrl+i", "use web"),
            cancel: Binding::new(vec![KeyCode::Esc]).with_help("esc", "cancel"),
            more_random: Binding::new(vec![KeyCode::Right, KeyCode::Char('l')])
                .with_help("→/l", "more random"),
            less_random: Binding::new(vec![KeyCode::Left, KeyCode::Char('h')])
                .with_help("←/h", "less random"),
        }
    }
}

impl KeyMap for ToolbarKeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.next, &self.activate, &self.use_web]
    }
}

/// Toolbar styles.
#[derive(Debug, Clone)]
pub struct Styles {
    /// Idle controls.
    pub control: Style,
    /// The focused control.
    pub focused: Style,
    /// Indicator dots.
    pub indicator: Style,
    /// Model list failure text.
    pub error: Style,
    /// Shortcut hint.
    pub hint: Style,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            control: Style::new().foreground(AdaptiveColor {
                Light: "#767676",
                Dark: "#8E8E8E",
            }),
            focused: Style::new().bold(true).foreground(AdaptiveColor {
                Light: "#1a1a1a",
                Dark: "#dddddd",
            }),
            indicator: Style::new().foreground(AdaptiveColor {
                Light: "#04B575",
                Dark: "#04B575",
            }),
            error: Style::new().foreground(AdaptiveColor {
                Light: "#D70000",
                Dark: "#FF5F5F",
            }),
            hint: Style::new().foreground(AdaptiveColor {
                Light: "#B2B2B2",
                Dark: "#4A4A4A",
            }),
        }
    }
}

const GAP: &str = "  ";
const DOT: &str = "•";

/// The toolbar model.
pub struct Model {
    /// Deployment switches.
    pub config: ToolbarConfig,
    /// Key bindings.
    pub keymap: ToolbarKeyMap,
    /// Styles.
    pub styles: Styles,
    /// Cells available for the toolbar row.
    pub width: usize,
    id: i64,
    flags: ToolbarFlags,
    callbacks: ToolbarCallbacks,
    selected_model: Option<SelectedModel>,
    models: Vec<UserModel>,
    model_state: ModelListState,
    model_dropdown: dropdown::Model,
    overflow: dropdown::Model,
    overflow_items: Vec<OverflowItem>,
    slider: Slider,
    spinner: Spinner,
    picker: filepicker::Model,
    picking: bool,
    attach_in_flight: bool,
    focus: bool,
    focus_index: usize,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("flags", &self.flags)
            .field("config", &self.config)
            .field("selected_model", &self.selected_model)
            .field("model_state", &self.model_state)
            .field("picking", &self.picking)
            .field("attach_in_flight", &self.attach_in_flight)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Creates a toolbar whose menus take listeners from `registry`.
    pub fn new(registry: &Registry, callbacks: ToolbarCallbacks) -> Self {
        let mut toolbar = Self {
            config: ToolbarConfig::default(),
            keymap: ToolbarKeyMap::default(),
            styles: Styles::default(),
            width: 80,
            id: next_id(),
            flags: ToolbarFlags::default(),
            callbacks,
            selected_model: None,
            models: Vec::new(),
            model_state: ModelListState::Loading,
            model_dropdown: dropdown::Model::new("", registry),
            overflow: dropdown::Model::new("Menu", registry)
                .with_right_align(true)
                .with_close_on_select(false),
            overflow_items: Vec::new(),
            slider: Slider::default(),
            spinner: Spinner::new(),
            picker: filepicker::Model::new(),
            picking: false,
            attach_in_flight: false,
            focus: false,
            focus_index: 0,
        };
        toolbar.refresh_menus();
        toolbar
    }

    /// Sets the deployment switches (builder pattern).
    pub fn with_config(mut self, config: ToolbarConfig) -> Self {
        self.config = config;
        self.refresh_menus();
        self
    }

    /// Sets the selected model (builder pattern).
    pub fn with_selected_model(mut self, model: SelectedModel) -> Self {
        self.set_selected_model(Some(model));
        self
    }

    /// Starts the image picker in `directory` (builder pattern).
    pub fn with_picker_directory(mut self, directory: impl Into<std::path::PathBuf>) -> Self {
        self.picker.current_directory = directory.into();
        self
    }

    /// Starts the loading animation.
    pub fn init(&self) -> Cmd {
        self.spinner.tick()
    }

    /// Unique id of this toolbar.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Current item state.
    pub fn flags(&self) -> &ToolbarFlags {
        &self.flags
    }

    /// Replaces the item state.
    pub fn set_flags(&mut self, flags: ToolbarFlags) {
        self.slider.set_temperature(flags.temperature);
        self.flags = flags;
        self.refresh_menus();
    }

    /// Replaces the selected model.
    pub fn set_selected_model(&mut self, model: Option<SelectedModel>) {
        self.selected_model = model;
        self.refresh_menus();
    }

    /// Replaces the model list and its loading state.
    pub fn set_models(&mut self, state: ModelListState, models: Vec<UserModel>) {
        self.model_state = state;
        self.models = models;
        self.refresh_menus();
    }

    /// Tells the toolbar where a control was drawn so its menu can anchor.
    pub fn set_control_rect(&mut self, control: Control, rect: Rect) {
        match control {
            Control::ModelSelector => self.model_dropdown.set_trigger_rect(rect),
            Control::Overflow => self.overflow.set_trigger_rect(rect),
            _ => {}
        }
    }

    /// The randomness slider.
    pub fn slider(&self) -> &Slider {
        &self.slider
    }

    /// The model selector dropdown.
    pub fn model_dropdown(&self) -> &dropdown::Model {
        &self.model_dropdown
    }

    /// The overflow menu.
    pub fn overflow(&self) -> &dropdown::Model {
        &self.overflow
    }

    /// The image picker.
    pub fn picker(&self) -> &filepicker::Model {
        &self.picker
    }

    /// Whether the image picker is showing.
    pub fn is_picking(&self) -> bool {
        self.picking
    }

    /// Whether an image is being read.
    pub fn attach_in_flight(&self) -> bool {
        self.attach_in_flight
    }

    fn layout_inputs(&self) -> LayoutInputs {
        let model = self.selected_model.as_ref();
        let f = &self.flags;
        LayoutInputs {
            detached: f.detached,
            web_enabled: !self.config.disable_web,
            has_model: model.is_some_and(|m| !m.name.is_empty()),
            accepts_images: model.is_some_and(|m| m.accepts_images),
            can_delete: f.can_edit
                && !f.is_loading
                && !f.is_answering
                && self.callbacks.remove_chat.is_some(),
        }
    }

    /// Controls shown for the current state, left to right.
    pub fn visible_controls(&self) -> Vec<Control> {
        layout::visible_controls(&self.layout_inputs())
    }

    fn focusable_controls(&self) -> Vec<Control> {
        self.visible_controls()
            .into_iter()
            .filter(|c| c.focusable())
            .collect()
    }

    /// The control keyboard focus is on.
    pub fn focused_control(&self) -> Option<Control> {
        if !self.focus {
            return None;
        }
        self.focusable_controls().get(self.focus_index).copied()
    }

    fn direction(&self) -> Direction {
        if self.flags.dropdown_goes_up {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    fn web_label(&self) -> String {
        let mark = if self.flags.use_web { "x" } else { " " };
        let mut label = format!("Use Web [{}]", mark);
        if self.flags.show_use_web_hint {
            label.push(' ');
            label.push_str(&self.styles.hint.render(&self.keymap.use_web.help().key));
        }
        label
    }

    fn refresh_menus(&mut self) {
        let direction = self.direction();

        self.model_dropdown.direction = direction;
        self.model_dropdown.value = self
            .selected_model
            .as_ref()
            .map(|m| m.name.clone())
            .unwrap_or_default();
        self.model_dropdown.options = self
            .models
            .iter()
            .map(|model| {
                let option = DropdownOption::new(model.name.clone()).unavailable(!model.available);
                match self.callbacks.set_user_model.clone() {
                    Some(setter) => {
                        let model = model.clone();
                        option.on_select(move || setter(&model))
                    }
                    None => option,
                }
            })
            .collect();

        self.overflow_items = layout::overflow_items(&self.layout_inputs());
        self.overflow.direction = direction;
        self.overflow.value = if layout::overflow_indicator(self.flags.use_web, self.flags.detached)
        {
            format!("Menu{}", self.styles.indicator.render(DOT))
        } else {
            "Menu".to_string()
        };
        let web_label = self.web_label();
        let detached_mark = if self.flags.detached { "x" } else { " " };
        self.overflow.options = self
            .overflow_items
            .iter()
            .map(|item| match item {
                OverflowItem::Randomness => DropdownOption::new(self.slider.view()),
                OverflowItem::WebToggle => DropdownOption {
                    action: self.callbacks.toggle_use_web.clone(),
                    ..DropdownOption::new(web_label.clone())
                },
                OverflowItem::DetachedToggle => DropdownOption {
                    action: self.callbacks.toggle_detached.clone(),
                    ..DropdownOption::new(format!("Detached [{}]", detached_mark))
                },
            })
            .collect();

        let count = self.focusable_controls().len();
        self.focus_index = self.focus_index.min(count.saturating_sub(1));
    }

    /// Opens the image picker. `None` when the selected model takes no images.
    pub fn attach_image(&mut self) -> Option<Cmd> {
        if !self.visible_controls().contains(&Control::AttachImage) {
            return None;
        }
        self.picking = true;
        self.picker.reset();
        Some(self.picker.read_dir_cmd())
    }

    fn start_read(&mut self, selected: &FileSelectedMsg) -> Option<Cmd> {
        if self.attach_in_flight {
            debug!(toolbar_id = self.id, path = %selected.path.display(), "image read already in flight");
            return None;
        }
        self.picking = false;
        self.attach_in_flight = true;
        Some(attach::read_cmd(self.id, selected.path.clone()))
    }

    fn activate(&mut self, control: Control) -> Option<Cmd> {
        match control {
            Control::WebToggle => run(&self.callbacks.toggle_use_web),
            Control::ModelSelector => {
                if self.model_state == ModelListState::Loaded {
                    self.model_dropdown.focus();
                    self.model_dropdown.open();
                }
                None
            }
            Control::SuggestQuestion => {
                if self.flags.suggest_loading {
                    return None;
                }
                run(&self.callbacks.suggest_question)
            }
            Control::AttachImage => self.attach_image(),
            Control::Overflow => {
                self.overflow.focus();
                self.overflow.open();
                None
            }
            Control::Delete => run(&self.callbacks.remove_chat),
            Control::Spacer => None,
        }
    }

    fn randomness_under_cursor(&self) -> bool {
        self.overflow
            .cursor()
            .and_then(|i| self.overflow_items.get(i))
            .is_some_and(|item| *item == OverflowItem::Randomness)
    }

    fn adjust_randomness(&mut self, more: bool) -> Option<Cmd> {
        let value = if more {
            self.slider.increase()
        } else {
            self.slider.decrease()
        }?;
        self.refresh_menus();
        self.callbacks
            .set_randomness
            .as_ref()
            .and_then(|f| f(value))
            .map(crate::emit)
    }

    fn handle_key(&mut self, key: &KeyMsg, msg: &Msg) -> Option<Cmd> {
        if self.picking {
            if self.keymap.cancel.matches(key) {
                self.picking = false;
                return None;
            }
            return self.picker.update(msg);
        }

        if self.model_dropdown.is_open() {
            // Menus opened by pointer have not taken focus yet.
            if !self.model_dropdown.focused() {
                self.model_dropdown.focus();
            }
            let cmd = self.model_dropdown.update(msg);
            if !self.model_dropdown.is_open() {
                self.model_dropdown.blur();
            }
            return cmd;
        }

        if self.overflow.is_open() {
            if !self.overflow.focused() {
                self.overflow.focus();
            }
            if self.randomness_under_cursor() {
                if self.keymap.more_random.matches(key) {
                    return self.adjust_randomness(true);
                }
                if self.keymap.less_random.matches(key) {
                    return self.adjust_randomness(false);
                }
            }
            let cmd = self.overflow.update(msg);
            if !self.overflow.is_open() {
                self.overflow.blur();
            }
            return cmd;
        }

        if !self.focus {
            return None;
        }

        if self.keymap.use_web.matches(key) && !self.config.disable_web {
            return run(&self.callbacks.toggle_use_web);
        }

        let count = self.focusable_controls().len();
        if count == 0 {
            return None;
        }
        if self.keymap.next.matches(key) {
            self.focus_index = (self.focus_index + 1) % count;
        } else if self.keymap.prev.matches(key) {
            self.focus_index = (self.focus_index + count - 1) % count;
        } else if self.keymap.activate.matches(key) {
            let control = self.focused_control()?;
            return self.activate(control);
        }
        None
    }

    /// Handles attachment results, menu input, ticks and keys.
    pub fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        if let Some(attached) = msg.downcast_ref::<ImageAttachedMsg>() {
            if attached.toolbar_id != self.id {
                return None;
            }
            self.attach_in_flight = false;
            self.picker.reset();
            let setter = self.callbacks.set_images.as_ref()?;
            return setter(vec![attached.data_url.clone()]).map(crate::emit);
        }

        if let Some(failed) = msg.downcast_ref::<ImageAttachFailedMsg>() {
            if failed.toolbar_id != self.id {
                return None;
            }
            warn!(toolbar_id = self.id, path = %failed.path.display(), error = %failed.error, "could not attach image");
            self.attach_in_flight = false;
            self.picker.reset();
            return None;
        }

        if let Some(selected) = msg.downcast_ref::<FileSelectedMsg>() {
            if selected.id != self.picker.id() {
                return None;
            }
            return self.start_read(selected);
        }

        if msg.downcast_ref::<ReadDirMsg>().is_some() {
            return self.picker.update(msg);
        }

        if let Some(cmd) = self.spinner.update(msg) {
            return Some(cmd);
        }

        if let Some(size) = msg.downcast_ref::<WindowSizeMsg>() {
            self.width = usize::from(size.width);
            self.picker.update(msg);
        }

        if msg.downcast_ref::<PointerDownMsg>().is_some()
            || msg.downcast_ref::<LayoutChangedMsg>().is_some()
            || msg.downcast_ref::<ScrollMsg>().is_some()
            || msg.downcast_ref::<WindowSizeMsg>().is_some()
        {
            let from_models = self.model_dropdown.update(msg);
            let from_overflow = self.overflow.update(msg);
            return from_models.or(from_overflow);
        }

        let key = msg.downcast_ref::<KeyMsg>()?;
        self.handle_key(key, msg)
    }

    fn control_view(&self, control: Control) -> String {
        let text = match control {
            Control::WebToggle => self.web_label(),
            Control::ModelSelector => match self.model_state {
                ModelListState::Loading => self.spinner.view(),
                ModelListState::Failed => self.styles.error.render("Can't use chat"),
                ModelListState::Loaded => self.model_dropdown.view(),
            },
            Control::Spacer => String::new(),
            Control::SuggestQuestion => {
                if self.flags.suggest_loading {
                    self.spinner.view()
                } else {
                    "⚄ Suggest Question".to_string()
                }
            }
            Control::AttachImage => {
                if layout::attach_indicator(self.flags.has_images) {
                    format!("[img]{}", self.styles.indicator.render(DOT))
                } else {
                    "[img]".to_string()
                }
            }
            Control::Overflow => self.overflow.view(),
            Control::Delete => "✕".to_string(),
        };
        if self.focused_control() == Some(control) {
            self.styles.focused.render(&text)
        } else {
            self.styles.control.render(&text)
        }
    }

    /// Renders the toolbar row, and the image picker below it while picking.
    pub fn view(&self) -> String {
        let controls = self.visible_controls();
        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut past_spacer = false;
        for control in controls {
            if control == Control::Spacer {
                past_spacer = true;
                continue;
            }
            let rendered = self.control_view(control);
            if past_spacer {
                right.push(rendered);
            } else {
                left.push(rendered);
            }
        }

        let left = left.join(GAP);
        let mut row = left.clone();
        if past_spacer {
            let right = right.join(GAP);
            let used = geometry::display_width(&left) + geometry::display_width(&right);
            let pad = self.width.saturating_sub(used).max(GAP.len());
            row = format!("{}{}{}", left, " ".repeat(pad), right);
        }

        if self.picking {
            format!("{}\n{}", row, self.picker.view())
        } else {
            row
        }
    }

    /// Draws open menus on top of a finished frame.
    pub fn overlay(&self, frame: &str) -> String {
        self.overflow.overlay(&self.model_dropdown.overlay(frame))
    }
}

impl Component for Model {
    fn focus(&mut self) -> Option<Cmd> {
        self.focus = true;
        None
    }

    fn blur(&mut self) {
        self.focus = false;
        self.picking = false;
        self.model_dropdown.blur();
        self.overflow.blur();
    }

    fn focused(&self) -> bool {
        self.focus
    }
}

#[cfg(test)]
mod tests;
