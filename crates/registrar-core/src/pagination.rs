//! Offset-paginated listing collector
//!
//! The registrar's listing endpoints number pages from 1 and do not promise
//! that a short page is the last one, so collection only stops at the first
//! empty page.

use std::future::Future;

use crate::error::{Error, Result};

/// First page number of the registrar's listing endpoints
pub const FIRST_PAGE: u32 = 1;

/// Which page to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub offset: u32,
    /// Requested page size
    pub limit: u32,
}

/// One fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Wrap fetched items
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    /// An empty page ends the listing
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> From<Vec<T>> for Page<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

/// Fetch pages until one comes back empty and concatenate their items
///
/// Any error from `fetch_page` aborts collection; items gathered so far are
/// discarded.
pub async fn collect_all<T, F, Fut>(page_size: u32, fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    collect_from(FIRST_PAGE, page_size, fetch_page).await
}

async fn collect_from<T, F, Fut>(first: u32, page_size: u32, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut offset = first;

    loop {
        let page = fetch_page(PageRequest {
            offset,
            limit: page_size,
        })
        .await?;

        if page.is_empty() {
            tracing::debug!("Page {} empty, collected {} item(s)", offset, items.len());
            break;
        }

        tracing::debug!("Page {} returned {} item(s)", offset, page.items.len());
        items.extend(page.items);
        offset = offset.checked_add(1).ok_or_else(|| {
            Error::malformed(format!(
                "Listing never returned an empty page (stopped after page {})",
                offset
            ))
        })?;
    }

    Ok(items)
}
