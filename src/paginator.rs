//! Page-number pagination control for server-side paging.
//!
//! The paginator does not hold the items it paginates. It knows the page the
//! table currently shows, the page size and the total reported by the server,
//! and it turns navigation keys into page requests. The page only changes once
//! the owner confirms the request succeeded via [`Model::set_page`].
//!
//! Pages are 1-based, matching the page numbers sent to the server.
//!
//! ```rust
//! use bubbletea_panels::paginator::{Model, Type};
//!
//! let mut paginator = Model::new().with_per_page(10).with_total_items(37);
//! assert_eq!(paginator.total_pages, 4);
//! assert_eq!(paginator.next_page_request(), Some(2));
//!
//! paginator.set_page(4);
//! assert_eq!(paginator.next_page_request(), None);
//!
//! paginator.paginator_type = Type::Arabic;
//! assert_eq!(paginator.view(), "4/4");
//! ```

use crate::key::{Binding, KeyMap};
use bubbletea_rs::{KeyMsg, Msg};
use crossterm::event::KeyCode;

/// How the control is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Type {
    /// A window of page numbers around the current page, e.g. `‹ 1 [2] 3 4 ›`.
    #[default]
    Numbers,
    /// Current and total, e.g. `2/4`.
    Arabic,
    /// One dot per page, e.g. `○ • ○ ○`.
    Dots,
}

/// Key bindings for page navigation.
#[derive(Debug, Clone)]
pub struct PaginatorKeyMap {
    /// Requests the previous page.
    pub prev_page: Binding,
    /// Requests the next page.
    pub next_page: Binding,
}

impl Default for PaginatorKeyMap {
    fn default() -> Self {
        Self {
            prev_page: Binding::new(vec![KeyCode::PageUp, KeyCode::Left, KeyCode::Char('h')])
                .with_help("←/h", "prev page"),
            next_page: Binding::new(vec![KeyCode::PageDown, KeyCode::Right, KeyCode::Char('l')])
                .with_help("→/l", "next page"),
        }
    }
}

impl KeyMap for PaginatorKeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.prev_page, &self.next_page]
    }
}

/// Pagination state and rendering.
#[derive(Debug, Clone)]
pub struct Model {
    /// How the control is drawn.
    pub paginator_type: Type,
    /// The page currently shown, starting at 1.
    pub page: usize,
    /// Items per page.
    pub per_page: usize,
    /// Number of pages, at least 1.
    pub total_pages: usize,
    /// How many page numbers `Type::Numbers` shows at most.
    pub window: usize,
    /// Active page marker for `Type::Dots`.
    pub active_dot: String,
    /// Inactive page marker for `Type::Dots`.
    pub inactive_dot: String,
    /// Format for `Type::Arabic`; the first `%d` is the page, the second the total.
    pub arabic_format: String,
    /// Key bindings.
    pub keymap: PaginatorKeyMap,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            paginator_type: Type::default(),
            page: 1,
            per_page: 1,
            total_pages: 1,
            window: 5,
            active_dot: "•".to_string(),
            inactive_dot: "○".to_string(),
            arabic_format: "%d/%d".to_string(),
            keymap: PaginatorKeyMap::default(),
        }
    }
}

impl Model {
    /// Creates a paginator on page 1 of 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets items per page, clamped to at least 1 (builder pattern).
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.set_per_page(per_page);
        self
    }

    /// Sets the total item count (builder pattern).
    pub fn with_total_items(mut self, items: usize) -> Self {
        self.set_total_items(items);
        self
    }

    /// Sets the display type (builder pattern).
    pub fn with_type(mut self, paginator_type: Type) -> Self {
        self.paginator_type = paginator_type;
        self
    }

    /// Sets items per page, clamped to at least 1.
    pub fn set_per_page(&mut self, per_page: usize) {
        self.per_page = per_page.max(1);
    }

    /// Recomputes the page count from a server-reported total.
    ///
    /// The current page is kept even if it now lies past the end; the table
    /// decides when to move.
    pub fn set_total_items(&mut self, items: usize) {
        self.total_pages = items.div_ceil(self.per_page).max(1);
    }

    /// Records the page the table now shows.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// True on page 1.
    pub fn on_first_page(&self) -> bool {
        self.page <= 1
    }

    /// True on or past the last page.
    pub fn on_last_page(&self) -> bool {
        self.page >= self.total_pages
    }

    /// The page to request for "previous", if any.
    pub fn prev_page_request(&self) -> Option<usize> {
        (!self.on_first_page()).then(|| self.page - 1)
    }

    /// The page to request for "next", if any.
    pub fn next_page_request(&self) -> Option<usize> {
        (!self.on_last_page()).then(|| self.page + 1)
    }

    /// Maps navigation keys to a page request.
    pub fn update(&self, msg: &Msg) -> Option<usize> {
        let key = msg.downcast_ref::<KeyMsg>()?;
        if self.keymap.next_page.matches(key) {
            self.next_page_request()
        } else if self.keymap.prev_page.matches(key) {
            self.prev_page_request()
        } else {
            None
        }
    }

    /// Renders the control.
    pub fn view(&self) -> String {
        match self.paginator_type {
            Type::Numbers => self.numbers_view(),
            Type::Arabic => self.arabic_view(),
            Type::Dots => self.dots_view(),
        }
    }

    fn arabic_view(&self) -> String {
        self.arabic_format
            .replacen("%d", &self.page.to_string(), 1)
            .replacen("%d", &self.total_pages.to_string(), 1)
    }

    fn dots_view(&self) -> String {
        (1..=self.total_pages)
            .map(|p| {
                if p == self.page {
                    self.active_dot.as_str()
                } else {
                    self.inactive_dot.as_str()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// First and last page number shown by `Type::Numbers`.
    pub fn visible_range(&self) -> (usize, usize) {
        let window = self.window.max(1).min(self.total_pages);
        let half = window / 2;
        let mut start = self.page.saturating_sub(half).max(1);
        if start + window - 1 > self.total_pages {
            start = self.total_pages + 1 - window;
        }
        (start, start + window - 1)
    }

    fn numbers_view(&self) -> String {
        let (start, end) = self.visible_range();
        let mut parts = Vec::new();
        parts.push(if self.on_first_page() { " " } else { "‹" }.to_string());
        if start > 1 {
            parts.push("…".to_string());
        }
        for p in start..=end {
            if p == self.page {
                parts.push(format!("[{}]", p));
            } else {
                parts.push(p.to_string());
            }
        }
        if end < self.total_pages {
            parts.push("…".to_string());
        }
        parts.push(if self.on_last_page() { " " } else { "›" }.to_string());
        parts.join(" ")
    }
}
