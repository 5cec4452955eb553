//! Cursor-based pagination over list endpoints.
//!
//! A listing operation is any `FnMut(Option<String>) -> Future<Output = Result<Page<T>>>`.
//! The first call receives no cursor; every following call receives the
//! token returned by the previous page. Enumeration ends only when a page
//! comes back without a token. Empty pages do not end it.

use std::future::Future;
use std::marker::PhantomData;

use anyhow::Result;
use tracing::debug;

/// One page of results from a list call.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    items: Vec<T>,
    next_page_token: Option<String>,
}

impl<T> Page<T> {
    /// An absent items field and an empty one are the same thing. An empty
    /// token is treated as no token.
    pub fn new(items: Option<Vec<T>>, next_page_token: Option<String>) -> Self {
        Self {
            items: items.unwrap_or_default(),
            next_page_token: next_page_token.filter(|t| !t.is_empty()),
        }
    }

    pub fn empty() -> Self {
        Self::new(None, None)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn next_page_token(&self) -> Option<&str> {
        self.next_page_token.as_deref()
    }

    pub fn is_last(&self) -> bool {
        self.next_page_token.is_none()
    }

    pub fn into_parts(self) -> (Vec<T>, Option<String>) {
        (self.items, self.next_page_token)
    }
}

/// Lazy walk over every page of a listing operation.
///
/// Calls are issued one at a time, only when `next_page` is awaited. A failed
/// call leaves the cursor untouched, so awaiting `next_page` again re-requests
/// the same page.
pub struct Paginator<F, T> {
    fetch: F,
    cursor: Option<String>,
    exhausted: bool,
    pages_fetched: usize,
    _item: PhantomData<fn() -> T>,
}

impl<F, Fut, T> Paginator<F, T>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            cursor: None,
            exhausted: false,
            pages_fetched: 0,
            _item: PhantomData,
        }
    }

    /// Fetches the next page. Returns `Ok(None)` once the last page was seen.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        if self.exhausted {
            return Ok(None);
        }
        let page = (self.fetch)(self.cursor.clone()).await?;
        self.pages_fetched += 1;
        let (items, next) = page.into_parts();
        debug!(
            page = self.pages_fetched,
            items = items.len(),
            more = next.is_some(),
            "fetched page"
        );
        match next {
            Some(token) => self.cursor = Some(token),
            None => {
                self.cursor = None;
                self.exhausted = true;
            }
        }
        Ok(Some(items))
    }

    /// Starts over from the first page.
    pub fn restart(&mut self) {
        self.cursor = None;
        self.exhausted = false;
        self.pages_fetched = 0;
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Concatenates the items of every page, in page order.
pub async fn collect_all<F, Fut, T>(fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut pages = Paginator::new(fetch);
    let mut items = Vec::new();
    while let Some(page) = pages.next_page().await? {
        items.extend(page);
    }
    Ok(items)
}

/// Hands every item to `on_item` as its page arrives. Returns the item count.
pub async fn for_each_item<F, Fut, T>(fetch: F, mut on_item: impl FnMut(T)) -> Result<usize>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut pages = Paginator::new(fetch);
    let mut seen = 0;
    while let Some(page) = pages.next_page().await? {
        seen += page.len();
        page.into_iter().for_each(&mut on_item);
    }
    Ok(seen)
}
