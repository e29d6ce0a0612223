//! Remote, paginated and searchable table.
//!
//! The table fetches rows from a [`PageSource`], decodes them into `T` and
//! renders each one through a caller-supplied row renderer. It owns only the
//! transient state of that process: the rows currently shown, the page, the
//! server-reported total and the phase of the last request.
//!
//! ## Request lifecycle
//!
//! Every request ([`Model::fetch_page`], [`Model::load_more`],
//! [`Model::search`]) is returned as a `Cmd`. When it completes, the command
//! yields a [`PageLoadedMsg`] which must be passed back to [`Model::update`].
//! Requests carry a generation number. Page and search requests replace the
//! rows and are tracked together; only the latest one is applied. Load-more
//! requests are tracked on their own, are refused while rows are being
//! replaced, and are abandoned when a replacing request starts. A slow
//! response therefore never overwrites a newer one or leaves a phase stuck
//! in `Loading`.
//!
//! The first request waits until the host knows whether the user is signed
//! in, see [`Model::set_signed_in`].
//!
//! ## Rendering
//!
//! - While idle or loading: a spinner, or placeholder rows when a skeleton is
//!   configured.
//! - Settled with no rows: the empty text and a `Refresh` hint (`r`).
//! - Otherwise: the rows in server order.
//!
//! Page numbers render below the rows (and also above with
//! `double_paginated`) when the total exceeds one page. A load-more hint
//! renders while the last page came back full.
//!
//! ```rust
//! use bubbletea_panels::table::{Model, TableConfig};
//! use bubbletea_panels::remote::{HttpSource, StaticToken};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Group {
//!     title: String,
//! }
//!
//! let table: Model<Group> = Model::new(
//!     HttpSource::new(StaticToken("token".into())),
//!     |page, search: &str| format!("https://example.com/groups?page={page}&text={search}"),
//!     |group: &Group, _| group.title.clone(),
//! )
//! .with_config(TableConfig { limit: 20, searchable: true, ..TableConfig::default() });
//! assert!(table.items().is_empty());
//! ```

mod config;
mod search;

pub use config::{LoadingStyle, PaginationMode, TableConfig};
pub use search::{SearchBar, SearchEvent, SearchKeyMap};

use crate::key::{Binding, KeyMap};
use crate::paginator::Model as Paginator;
use crate::remote::{decode_page, Page, PageSource};
use crate::error::FetchError;
use crate::spinner::Model as Spinner;
use bubbletea_rs::{Cmd, KeyMsg, Msg, WindowSizeMsg};
use crossterm::event::KeyCode;
use lipgloss_extras::prelude::*;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// Builds the request URL from a 1-based page number and the search text.
pub type UrlBuilder = Arc<dyn Fn(usize, &str) -> String + Send + Sync>;

/// Renders one row given the item and its position.
pub type RowRenderer<T> = Box<dyn Fn(&T, usize) -> String + Send + Sync>;

/// Observes the rows after every change.
pub type ItemsCallback<T> = Box<dyn FnMut(&[T]) + Send>;

/// Progress of a request kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// The last request succeeded.
    Loaded,
    /// The last request failed.
    Error,
}

impl LoadPhase {
    /// Loaded or failed.
    pub fn settled(self) -> bool {
        matches!(self, LoadPhase::Loaded | LoadPhase::Error)
    }
}

/// What a request was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Replace rows with a page.
    Page,
    /// Append the next page.
    Append,
    /// Replace rows with search results.
    Search,
}

/// Result of a table request.
pub struct PageLoadedMsg<T> {
    /// Table that issued the request.
    pub table_id: i64,
    /// Generation stamped on the request.
    pub generation: u64,
    /// What the request was for.
    pub kind: RequestKind,
    /// Page requested.
    pub page: usize,
    /// Decoded page or the failure.
    pub result: Result<Page<T>, FetchError>,
}

impl<T> fmt::Debug for PageLoadedMsg<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageLoadedMsg")
            .field("table_id", &self.table_id)
            .field("generation", &self.generation)
            .field("kind", &self.kind)
            .field("page", &self.page)
            .field("ok", &self.result.is_ok())
            .finish()
    }
}

/// Key bindings for the table.
#[derive(Debug, Clone)]
pub struct TableKeyMap {
    /// Re-requests page 1 from the empty state.
    pub refresh: Binding,
    /// Appends the next page.
    pub load_more: Binding,
}

impl Default for TableKeyMap {
    fn default() -> Self {
        Self {
            refresh: Binding::new(vec![KeyCode::Char('r')]).with_help("r", "refresh"),
            load_more: Binding::new(vec![KeyCode::Char('m')]).with_help("m", "load more"),
        }
    }
}

impl KeyMap for TableKeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.refresh, &self.load_more]
    }
}

/// Styles for the table chrome. Rows are styled by the row renderer.
#[derive(Debug, Clone)]
pub struct Styles {
    /// Empty-state text.
    pub empty: Style,
    /// Refresh and load-more hints.
    pub hint: Style,
    /// Page-number control.
    pub pagination: Style,
    /// Loading placeholders.
    pub skeleton: Style,
}

impl Default for Styles {
    fn default() -> Self {
        let subdued = AdaptiveColor {
            Light: "#9B9B9B",
            Dark: "#5C5C5C",
        };
        Self {
            empty: Style::new().foreground(AdaptiveColor {
                Light: "#909090",
                Dark: "#626262",
            }),
            hint: Style::new().foreground(subdued.clone()),
            pagination: Style::new().foreground(subdued.clone()),
            skeleton: Style::new().foreground(subdued),
        }
    }
}

/// The table model.
pub struct Model<T> {
    /// Behaviour switches.
    pub config: TableConfig,
    /// Key bindings.
    pub keymap: TableKeyMap,
    /// Styles.
    pub styles: Styles,
    /// Search input, shown when `config.searchable`.
    pub search_bar: SearchBar,
    id: i64,
    source: Arc<dyn PageSource>,
    url: UrlBuilder,
    render_row: RowRenderer<T>,
    on_items: Option<ItemsCallback<T>>,
    items: Vec<T>,
    current_page: usize,
    total_count: usize,
    load_phase: LoadPhase,
    append_phase: LoadPhase,
    search_text: String,
    signed_in: Option<bool>,
    generation: u64,
    pending_page: u64,
    pending_append: u64,
    paginator: Paginator,
    spinner: Spinner,
    width: usize,
}

impl<T> fmt::Debug for Model<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("items", &self.items.len())
            .field("current_page", &self.current_page)
            .field("total_count", &self.total_count)
            .field("load_phase", &self.load_phase)
            .field("append_phase", &self.append_phase)
            .field("search_text", &self.search_text)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<T> Model<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Creates an idle table.
    pub fn new<S, U, R>(source: S, url: U, render_row: R) -> Self
    where
        S: PageSource + 'static,
        U: Fn(usize, &str) -> String + Send + Sync + 'static,
        R: Fn(&T, usize) -> String + Send + Sync + 'static,
    {
        let config = TableConfig::default();
        let paginator = Paginator::new().with_per_page(config.limit);
        Self {
            config,
            keymap: TableKeyMap::default(),
            styles: Styles::default(),
            search_bar: SearchBar::new(),
            id: next_id(),
            source: Arc::new(source),
            url: Arc::new(url),
            render_row: Box::new(render_row),
            on_items: None,
            items: Vec::new(),
            current_page: 1,
            total_count: 0,
            load_phase: LoadPhase::Idle,
            append_phase: LoadPhase::Idle,
            search_text: String::new(),
            signed_in: None,
            generation: 0,
            pending_page: 0,
            pending_append: 0,
            paginator,
            spinner: Spinner::new(),
            width: 40,
        }
    }

    /// Replaces the configuration (builder pattern).
    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.paginator.set_per_page(config.limit);
        self.config = config;
        self
    }

    /// Calls `callback` with the rows after every successful request,
    /// including when the rows become empty.
    pub fn with_items_callback(mut self, callback: impl FnMut(&[T]) + Send + 'static) -> Self {
        self.on_items = Some(Box::new(callback));
        self
    }

    /// Starts the loading animation.
    pub fn init(&self) -> Cmd {
        self.spinner.tick()
    }

    /// Unique id of this table.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Rows in server order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Page the rows belong to (the last appended page after load more).
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Total reported by the server.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Phase of the last page or search request.
    pub fn load_phase(&self) -> LoadPhase {
        self.load_phase
    }

    /// Phase of the last load-more request.
    pub fn append_phase(&self) -> LoadPhase {
        self.append_phase
    }

    /// Text the rows were searched with.
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// Generation of the most recent request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reports the sign-in state. `None` means still unknown.
    ///
    /// Page 1 is requested whenever the state becomes known or changes.
    pub fn set_signed_in(&mut self, signed_in: Option<bool>) -> Option<Cmd> {
        if signed_in == self.signed_in {
            return None;
        }
        self.signed_in = signed_in;
        signed_in.map(|_| self.fetch_page(1))
    }

    /// Requests `page` with the current search text, replacing rows on
    /// success and keeping them on failure.
    pub fn fetch_page(&mut self, page: usize) -> Cmd {
        let page = page.max(1);
        let url = (self.url)(page, &self.search_text);
        self.replace(RequestKind::Page, page, url)
    }

    /// Requests page 1 again.
    pub fn refresh(&mut self) -> Cmd {
        self.fetch_page(1)
    }

    /// Whether the last page came back full, so more rows may exist.
    pub fn can_load_more(&self) -> bool {
        self.items.len() >= self.config.limit * self.current_page
    }

    /// Appends the next page. `None` unless [`Model::can_load_more`] holds
    /// and neither a load-more nor a page or search request is in flight.
    pub fn load_more(&mut self) -> Option<Cmd> {
        if !self.can_load_more()
            || self.append_phase == LoadPhase::Loading
            || self.load_phase == LoadPhase::Loading
        {
            return None;
        }
        self.append_phase = LoadPhase::Loading;
        let page = self.current_page + 1;
        let url = (self.url)(page, &self.search_text);
        let cmd = self.request(RequestKind::Append, page, url);
        self.pending_append = self.generation;
        Some(cmd)
    }

    /// Searches from page 1. Empty text searches for `""`.
    pub fn search(&mut self, text: &str) -> Cmd {
        self.search_text = text.to_string();
        self.search_bar.value = self.search_text.clone();
        let url = (self.url)(1, &self.search_text);
        self.replace(RequestKind::Search, 1, url)
    }

    /// Starts a request that replaces the rows and abandons any append in
    /// flight.
    fn replace(&mut self, kind: RequestKind, page: usize, url: String) -> Cmd {
        self.load_phase = LoadPhase::Loading;
        if self.append_phase == LoadPhase::Loading {
            self.append_phase = LoadPhase::Idle;
        }
        self.pending_append = 0;
        let cmd = self.request(kind, page, url);
        self.pending_page = self.generation;
        cmd
    }

    fn request(&mut self, kind: RequestKind, page: usize, url: String) -> Cmd {
        self.generation += 1;
        let generation = self.generation;
        let table_id = self.id;
        let source = Arc::clone(&self.source);
        let results_key = self.config.results_key.clone();
        let total_key = self.config.total_key.clone();
        debug!(table_id, generation, ?kind, page, %url, "table request");

        Box::pin(async move {
            let result = match source.get(&url).await {
                Ok(body) => decode_page::<T>(body, &results_key, total_key.as_deref()),
                Err(err) => Err(err),
            };
            Some(Box::new(PageLoadedMsg {
                table_id,
                generation,
                kind,
                page,
                result,
            }) as Msg)
        })
    }

    fn notify(&mut self) {
        if let Some(callback) = self.on_items.as_mut() {
            callback(&self.items);
        }
    }

    fn set_total(&mut self, total: Option<usize>) {
        if let Some(total) = total {
            self.total_count = total;
        }
        self.paginator.set_per_page(self.config.limit);
        self.paginator.set_total_items(self.total_count);
        self.paginator.set_page(self.current_page);
    }

    fn apply(&mut self, loaded: PageLoadedMsg<T>) {
        let expected = match loaded.kind {
            RequestKind::Append => self.pending_append,
            RequestKind::Page | RequestKind::Search => self.pending_page,
        };
        if loaded.generation != expected {
            debug!(
                table_id = self.id,
                kind = ?loaded.kind,
                stale = loaded.generation,
                expected,
                "discarding stale table response"
            );
            return;
        }

        match (loaded.kind, loaded.result) {
            (RequestKind::Page, Ok(page)) => {
                self.items = page.items;
                self.current_page = loaded.page;
                self.set_total(page.total);
                self.load_phase = LoadPhase::Loaded;
                self.notify();
            }
            (RequestKind::Page, Err(err)) => {
                warn!(table_id = self.id, page = loaded.page, error = %err, "page request failed");
                self.load_phase = LoadPhase::Error;
            }
            (RequestKind::Append, Ok(page)) => {
                self.items.extend(page.items);
                self.current_page = loaded.page;
                self.set_total(page.total);
                self.append_phase = LoadPhase::Loaded;
                self.notify();
            }
            (RequestKind::Append, Err(err)) => {
                warn!(table_id = self.id, page = loaded.page, error = %err, "load more failed");
                self.append_phase = LoadPhase::Error;
            }
            (RequestKind::Search, Ok(page)) => {
                self.items = page.items;
                self.current_page = 1;
                self.set_total(page.total);
                self.load_phase = LoadPhase::Loaded;
                self.notify();
            }
            (RequestKind::Search, Err(err)) => {
                warn!(table_id = self.id, search = %self.search_text, error = %err, "search failed");
                self.items.clear();
                self.current_page = 1;
                self.set_total(None);
                self.load_phase = LoadPhase::Loaded;
                self.notify();
            }
        }
    }

    /// Whether the page-number control is shown.
    pub fn pagination_visible(&self) -> bool {
        self.config.pagination.paged() && self.total_count > self.config.limit
    }

    /// Whether the load-more control is shown.
    pub fn load_more_visible(&self) -> bool {
        self.config.pagination.load_more() && self.can_load_more()
    }

    fn showing_empty_state(&self) -> bool {
        self.load_phase.settled() && self.items.is_empty()
    }

    /// Applies request results and handles keys, ticks and resizes.
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        let msg = match msg.downcast::<PageLoadedMsg<T>>() {
            Ok(loaded) => {
                if loaded.table_id == self.id {
                    self.apply(*loaded);
                }
                return None;
            }
            Err(msg) => msg,
        };

        if let Some(size) = msg.downcast_ref::<WindowSizeMsg>() {
            self.width = usize::from(size.width).max(1);
            return None;
        }

        if let Some(cmd) = self.spinner.update(&msg) {
            return Some(cmd);
        }

        let key = msg.downcast_ref::<KeyMsg>()?;

        if self.config.searchable {
            match self.search_bar.update(key) {
                SearchEvent::Submitted(text) => {
                    self.search_bar.blur();
                    return Some(self.search(&text));
                }
                SearchEvent::Edited => return None,
                SearchEvent::Ignored => {}
            }
        }

        if self.showing_empty_state() && self.keymap.refresh.matches(key) {
            return Some(self.refresh());
        }

        if self.load_more_visible() && self.keymap.load_more.matches(key) {
            return self.load_more();
        }

        if self.pagination_visible() && self.load_phase != LoadPhase::Loading {
            if let Some(page) = self.paginator.update(&msg) {
                return Some(self.fetch_page(page));
            }
        }

        None
    }

    fn loading_view(&self) -> String {
        match self.config.loading {
            LoadingStyle::Spinner => self.spinner.view(),
            LoadingStyle::Skeleton(kind) => self
                .styles
                .skeleton
                .render(&kind.view(self.config.limit, self.width)),
        }
    }

    fn body_view(&self) -> String {
        if !self.load_phase.settled() {
            return self.loading_view();
        }
        if self.items.is_empty() {
            return format!(
                "{}\n{}",
                self.styles.empty.render(&self.config.empty_text),
                self.styles.hint.render("[r] Refresh")
            );
        }
        let gap = "\n".repeat(self.config.row_gap + 1);
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (self.render_row)(item, i))
            .collect::<Vec<_>>()
            .join(&gap)
    }

    /// Renders search bar, rows and pagination controls.
    pub fn view(&self) -> String {
        let mut sections = Vec::new();
        if self.config.searchable {
            sections.push(self.search_bar.view());
        }
        let pagination = self.styles.pagination.render(&self.paginator.view());
        if self.pagination_visible() && self.config.double_paginated {
            sections.push(pagination.clone());
        }
        sections.push(self.body_view());
        if self.pagination_visible() {
            sections.push(pagination);
        }
        if self.load_more_visible() {
            if self.append_phase == LoadPhase::Loading {
                sections.push(self.spinner.view());
            } else {
                sections.push(self.styles.hint.render("[m] Load more"));
            }
        }
        sections.join("\n")
    }
}

#[cfg(test)]
mod tests;
