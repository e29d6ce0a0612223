#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/bubbletea-panels/")]

//! # bubbletea-panels
//!
//! Floating menus, remote data tables and a chat toolbar for
//! [bubbletea-rs](https://github.com/joshka/bubbletea-rs) applications.
//!
//! ## Overview
//!
//! Each component follows the Elm Architecture: it is a `Model` with an
//! `update()` that consumes messages and may return a command, and a `view()`
//! that renders a string. Components own only transient UI state; the host
//! application owns domain state and hands components callbacks to report
//! user intent.
//!
//! ## Components
//!
//! - [`dropdown`]: a menu anchored to its trigger's screen rectangle and
//!   drawn on top of the finished frame.
//! - [`table`]: rows fetched page by page from an authenticated JSON
//!   endpoint, with search, page numbers and "load more".
//! - [`toolbar`]: the controls shown under a chat message, composed from a
//!   declarative rule table.
//!
//! Supporting modules:
//!
//! - [`key`]: key bindings and hint lines.
//! - [`geometry`]: rectangles, dropdown placement and overlay compositing.
//! - [`subscription`]: listener registry with guards released on drop.
//! - [`paginator`], [`spinner`], [`filepicker`]: building blocks of the
//!   table and toolbar.
//! - [`remote`]: page sources and response decoding.
//! - [`error`]: error types.
//!
//! ## Focus Management
//!
//! Interactive components implement [`Component`]:
//!
//! ```rust
//! use bubbletea_panels::prelude::*;
//!
//! fn cycle<T: Component>(component: &mut T) {
//!     let _ = component.focus();
//!     assert!(component.focused());
//!     component.blur();
//!     assert!(!component.focused());
//! }
//!
//! let registry = Registry::new();
//! cycle(&mut Dropdown::new("Sort", &registry));
//! ```
//!
//! ## Integration with bubbletea-rs
//!
//! Commands returned by components resolve to messages that must be fed back
//! into the same component's `update`:
//!
//! ```rust
//! use bubbletea_panels::prelude::*;
//! use bubbletea_panels::remote::{HttpSource, StaticToken};
//! use bubbletea_rs::{Cmd, Model, Msg};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Doc {
//!     title: String,
//! }
//!
//! struct App {
//!     docs: Table<Doc>,
//! }
//!
//! impl Model for App {
//!     fn init() -> (Self, Option<Cmd>) {
//!         let mut docs = Table::new(
//!             HttpSource::new(StaticToken("token".into())),
//!             |page, text: &str| format!("https://example.com/docs?page={page}&text={text}"),
//!             |doc: &Doc, _| doc.title.clone(),
//!         );
//!         let fetch = docs.set_signed_in(Some(true));
//!         (Self { docs }, fetch)
//!     }
//!
//!     fn update(&mut self, msg: Msg) -> Option<Cmd> {
//!         self.docs.update(msg)
//!     }
//!
//!     fn view(&self) -> String {
//!         self.docs.view()
//!     }
//! }
//! ```
//!
//! ## Logging
//!
//! Requests, discarded responses and failed image reads are reported through
//! [`tracing`]. The crate installs no subscriber.

pub mod dropdown;
pub mod error;
pub mod filepicker;
pub mod geometry;
pub mod key;
pub mod paginator;
pub mod remote;
pub mod spinner;
pub mod subscription;
pub mod table;
pub mod toolbar;

use bubbletea_rs::{Cmd, Msg};

/// Core trait for components that take keyboard focus.
///
/// - `focus()` marks the component focused and may return a command.
/// - `blur()` unmarks it and drops focus-related state, such as open menus.
/// - `focused()` reports the current state.
pub trait Component {
    /// Sets the component to focused state.
    fn focus(&mut self) -> Option<Cmd>;

    /// Sets the component to blurred state.
    fn blur(&mut self);

    /// Returns the current focus state.
    fn focused(&self) -> bool;
}

/// Wraps an already available message in a command.
pub(crate) fn emit(msg: Msg) -> Cmd {
    Box::pin(async move { Some(msg) })
}

pub use dropdown::{DropdownOption, Model as Dropdown};
pub use error::{AttachError, FetchError};
pub use filepicker::Model as FilePicker;
pub use geometry::{Direction, Rect};
pub use key::{Binding, Help as KeyHelp, KeyMap, KeyPress};
pub use paginator::Model as Paginator;
pub use remote::{HttpSource, PageSource, TokenProvider};
pub use spinner::{Model as Spinner, Skeleton, TickMsg as SpinnerTickMsg};
pub use subscription::{Registry, Subscription, Topic};
pub use table::{Model as Table, TableConfig};
pub use toolbar::Model as Toolbar;

/// Prelude module for convenient imports.
///
/// ```rust
/// use bubbletea_panels::prelude::*;
///
/// let registry = Registry::new();
/// let menu = Dropdown::new("Menu", &registry).with_options(vec![DropdownOption::new("Rename")]);
/// assert!(!menu.is_open());
/// ```
pub mod prelude {
    pub use crate::dropdown::{DropdownOption, Model as Dropdown, PointerDownMsg};
    pub use crate::geometry::{Direction, Rect};
    pub use crate::key::{Binding, Help as KeyHelp, KeyMap, KeyPress};
    pub use crate::paginator::Model as Paginator;
    pub use crate::spinner::{Model as Spinner, Skeleton};
    pub use crate::subscription::Registry;
    pub use crate::table::{LoadPhase, Model as Table, PaginationMode, TableConfig};
    pub use crate::toolbar::{
        Model as Toolbar, ModelListState, SelectedModel, ToolbarCallbacks, ToolbarConfig,
        ToolbarFlags, UserModel,
    };
    pub use crate::Component;
}
