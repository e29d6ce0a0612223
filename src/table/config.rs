//! Per-table configuration.
//!
//! Everything here can be built in code or deserialised from a host's config
//! file:
//!
//! ```rust
//! use bubbletea_panels::table::{LoadingStyle, PaginationMode, TableConfig};
//! use bubbletea_panels::spinner::Skeleton;
//!
//! let config: TableConfig = serde_json::from_str(
//!     r#"{ "results_key": "groups", "limit": 20, "pagination": "load_more",
//!          "loading": { "skeleton": "cards" } }"#,
//! ).unwrap();
//! assert_eq!(config.results_key, "groups");
//! assert_eq!(config.total_key.as_deref(), Some("total"));
//! assert_eq!(config.pagination, PaginationMode::LoadMore);
//! assert_eq!(config.loading, LoadingStyle::Skeleton(Skeleton::Cards));
//! ```

use crate::spinner::Skeleton;
use serde::Deserialize;

/// Which pagination controls the table offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Page numbers; each page replaces the rows.
    #[default]
    Paged,
    /// A "load more" control appending the next page.
    LoadMore,
    /// Both controls.
    Both,
    /// Neither control.
    None,
}

impl PaginationMode {
    /// Page-number control enabled.
    pub fn paged(self) -> bool {
        matches!(self, PaginationMode::Paged | PaginationMode::Both)
    }

    /// Load-more control enabled.
    pub fn load_more(self) -> bool {
        matches!(self, PaginationMode::LoadMore | PaginationMode::Both)
    }
}

/// What is shown while a request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingStyle {
    /// An animated spinner.
    #[default]
    Spinner,
    /// `limit` placeholder rows.
    Skeleton(Skeleton),
}

/// Configuration of one table instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Body key holding the rows.
    pub results_key: String,
    /// Body key holding the total count; `None` disables totals.
    pub total_key: Option<String>,
    /// Page size used for pagination arithmetic.
    pub limit: usize,
    /// Pagination controls.
    pub pagination: PaginationMode,
    /// Repeat the page-number control above the rows.
    pub double_paginated: bool,
    /// Show the search bar.
    pub searchable: bool,
    /// Loading indicator.
    pub loading: LoadingStyle,
    /// Text of the empty state.
    pub empty_text: String,
    /// Blank lines between rows.
    pub row_gap: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            results_key: "results".to_string(),
            total_key: Some("total".to_string()),
            limit: 10,
            pagination: PaginationMode::default(),
            double_paginated: false,
            searchable: false,
            loading: LoadingStyle::default(),
            empty_text: "No results.".to_string(),
            row_gap: 0,
        }
    }
}
