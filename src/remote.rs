//! Remote page sources.
//!
//! A table asks a [`PageSource`] for the JSON body behind a URL and decodes
//! it with [`decode_page`]. The production source is [`HttpSource`], which
//! issues an authenticated `GET` with an `x-access-token` header. Tests and
//! offline hosts can use any `Fn(&str) -> Result<Value>` closure instead.
//!
//! Bodies follow a fixed envelope:
//!
//! ```json
//! { "response": "success", "results": [ ... ], "total": 37 }
//! ```
//!
//! The results and total keys are configurable per table.

use crate::error::{FetchError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

/// Header carrying the access token.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Value of the `response` field on success.
pub const SUCCESS_MARKER: &str = "success";

/// Supplies the access token sent with every request.
pub trait TokenProvider: Send + Sync {
    /// Current token, or `None` when signed out.
    fn access_token(&self) -> Option<String>;
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn access_token(&self) -> Option<String> {
        self()
    }
}

/// A fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn access_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Future returned by [`PageSource::get`].
pub type SourceFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// Fetches the JSON body behind a URL.
pub trait PageSource: Send + Sync {
    /// Starts the request. The future owns everything it needs.
    fn get(&self, url: &str) -> SourceFuture;
}

impl<F> PageSource for F
where
    F: Fn(&str) -> Result<Value> + Send + Sync,
{
    fn get(&self, url: &str) -> SourceFuture {
        let result = self(url);
        Box::pin(async move { result })
    }
}

/// Authenticated HTTP source backed by `reqwest`.
#[derive(Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
}

impl fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSource").finish_non_exhaustive()
    }
}

impl HttpSource {
    /// Creates a source with a default client.
    pub fn new(tokens: impl TokenProvider + 'static) -> Self {
        Self::with_client(reqwest::Client::new(), tokens)
    }

    /// Creates a source sharing an existing client.
    pub fn with_client(client: reqwest::Client, tokens: impl TokenProvider + 'static) -> Self {
        Self {
            client,
            tokens: Arc::new(tokens),
        }
    }
}

impl PageSource for HttpSource {
    fn get(&self, url: &str) -> SourceFuture {
        let client = self.client.clone();
        let tokens = Arc::clone(&self.tokens);
        let url = url.to_string();
        Box::pin(async move {
            debug!(%url, "requesting page");
            let mut request = client
                .get(&url)
                .header(reqwest::header::CONTENT_TYPE, "application/json");
            if let Some(token) = tokens.access_token() {
                request = request.header(ACCESS_TOKEN_HEADER, token);
            }
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                warn!(%url, status = status.as_u16(), "page request was not OK");
                return Err(FetchError::Transport {
                    status: status.as_u16(),
                });
            }
            Ok(response.json::<Value>().await?)
        })
    }
}

/// One decoded page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Rows in server order.
    pub items: Vec<T>,
    /// Total reported under the total key, if configured and present.
    pub total: Option<usize>,
}

/// Checks the success marker and extracts rows and total from a body.
pub fn decode_page<T: DeserializeOwned>(
    body: Value,
    results_key: &str,
    total_key: Option<&str>,
) -> Result<Page<T>> {
    let marker = body.get("response").and_then(Value::as_str);
    if marker != Some(SUCCESS_MARKER) {
        return Err(FetchError::Protocol {
            response: marker.map(str::to_string),
        });
    }

    let total = total_key
        .and_then(|key| body.get(key))
        .and_then(Value::as_u64)
        .map(|t| t as usize);

    let rows = match body {
        Value::Object(mut map) => map.remove(results_key),
        _ => None,
    };
    let rows = match rows {
        Some(rows @ Value::Array(_)) => rows,
        _ => {
            return Err(FetchError::MissingResults {
                key: results_key.to_string(),
            })
        }
    };

    Ok(Page {
        items: serde_json::from_value(rows)?,
        total,
    })
}
