//! Paginator
//!
//! Follows `@odata.nextLink` continuation links until the server stops
//! sending them. Pages are requested strictly one after another; the next
//! page is only requested once the previous page's link is known.
//!
//! There is no guard against a server that keeps returning links (cyclic or
//! unbounded chains); the traversal simply keeps going.

use super::error::{GraphError, GraphResult};
use super::transport::Transport;
use futures::stream::{self, Stream, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// One page of an OData collection response.
#[derive(Debug, Deserialize)]
pub struct ODataPage<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink", alias = "nextLink", default)]
    pub next_link: Option<String>,
}

/// Progress snapshot handed to the observer after each page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    /// 1-based page number
    pub page: usize,
    /// Items on this page
    pub page_items: usize,
    /// Items accumulated so far, this page included
    pub total_items: usize,
    /// Whether a continuation link follows
    pub has_more: bool,
}

/// Fetch and decode a single page.
pub async fn fetch_page<T, Tr>(transport: &Tr, url: &str) -> GraphResult<ODataPage<T>>
where
    T: DeserializeOwned,
    Tr: Transport + ?Sized,
{
    let body = transport.get(url).await?;
    Ok(serde_json::from_value(body)?)
}

/// Fetch the whole collection starting at `url` (auto-paginate).
pub async fn fetch_all<T, Tr>(transport: &Tr, url: &str) -> GraphResult<Vec<T>>
where
    T: DeserializeOwned,
    Tr: Transport + ?Sized,
{
    fetch_all_with_progress(transport, url, |_| {}).await
}

/// Fetch the whole collection, reporting progress after every page.
///
/// Any failing page fails the whole call; items gathered so far are dropped.
pub async fn fetch_all_with_progress<T, Tr, F>(
    transport: &Tr,
    url: &str,
    mut on_page: F,
) -> GraphResult<Vec<T>>
where
    T: DeserializeOwned,
    Tr: Transport + ?Sized,
    F: FnMut(&PageProgress),
{
    let mut all_items = Vec::new();
    let mut next_url = url.to_string();
    let mut page = 0;

    loop {
        tracing::debug!("Fetching page {}: {}", page + 1, next_url);
        let result: ODataPage<T> = fetch_page(transport, &next_url).await?;
        page += 1;

        let page_items = result.value.len();
        all_items.extend(result.value);

        on_page(&PageProgress {
            page,
            page_items,
            total_items: all_items.len(),
            has_more: result.next_link.is_some(),
        });

        match result.next_link {
            Some(link) => next_url = link,
            None => break,
        }
    }

    tracing::debug!("Fetched {} items in {} pages", all_items.len(), page);
    Ok(all_items)
}

/// Lazily stream the collection starting at `url`, item by item.
///
/// A page is only requested once the consumer has drained the previous one.
/// The stream ends after the last page or right after yielding an error.
pub fn stream_items<'a, T, Tr>(
    transport: &'a Tr,
    url: &str,
) -> impl Stream<Item = GraphResult<T>> + 'a
where
    T: DeserializeOwned + 'a,
    Tr: Transport + ?Sized,
{
    let pages = stream::try_unfold(Some(url.to_string()), move |next| async move {
        let Some(url) = next else {
            return Ok(None);
        };
        tracing::debug!("Streaming page: {}", url);
        let page: ODataPage<T> = fetch_page(transport, &url).await?;
        Ok::<_, GraphError>(Some((page.value, page.next_link)))
    });

    pages
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<T, GraphError>)))
        .try_flatten()
}
