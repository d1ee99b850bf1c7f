//! Cursor-based listing driven to completion.

use crate::error::ApiError;
use crate::utils::retry::RetryExecutor;
use std::fmt;
use std::future::Future;

/// Opaque continuation cursor. Empty means "start" when sent and
/// "no more pages" when received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageToken(String);

impl PageToken {
    pub fn start() -> Self {
        Self::default()
    }

    pub fn is_end(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PageToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<Option<String>> for PageToken {
    fn from(token: Option<String>) -> Self {
        Self(token.unwrap_or_default())
    }
}

impl From<&str> for PageToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: PageToken,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: impl Into<PageToken>) -> Self {
        Self {
            items,
            next_token: next_token.into(),
        }
    }

    /// A final page.
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, PageToken::start())
    }
}

/// Wire list responses that can be viewed as a page.
pub trait ListResponse {
    type Item;

    fn into_page(self) -> Page<Self::Item>;
}

/// Fetch every page, starting from the empty token, and concatenate the
/// items in the order the server returned them.
///
/// The first failing page aborts the listing; no partial result is kept.
pub async fn list_all<T, E, F, Fut>(mut fetch: F) -> Result<Vec<T>, E>
where
    F: FnMut(PageToken) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut items = Vec::new();
    let mut token = PageToken::start();
    let mut pages = 0usize;

    loop {
        let page = fetch(token).await?;
        pages += 1;
        items.extend(page.items);

        if page.next_token.is_end() {
            log::debug!("Listing finished after {} page(s), {} item(s)", pages, items.len());
            return Ok(items);
        }
        token = page.next_token;
    }
}

/// Like [`list_all`], but each page fetch goes through `retry`.
pub async fn list_all_with_retry<T, F, Fut>(
    fetch: F,
    retry: &RetryExecutor,
) -> Result<Vec<T>, ApiError>
where
    F: Fn(PageToken) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
{
    list_all(|token: PageToken| {
        let fetch = &fetch;
        async move { retry.execute(|| fetch(token.clone())).await }
    })
    .await
}
