//! Caller-supplied fetch and search callbacks.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::id::DocumentId;

/// Page-fetch callbacks a pagination coordinator drives.
///
/// Both calls must return pages of the coordinator's page limit, since a
/// short page is the only end-of-list signal. A source that knows its page
/// size reports it through [`PageSource::page_limit`] and the coordinator
/// adopts it.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    /// Fetch the first page.
    async fn fetch_initial(&self) -> Result<Vec<T>, StoreError>;

    /// Fetch the page after the item identified by `cursor`.
    async fn fetch_after(&self, cursor: &DocumentId) -> Result<Vec<T>, StoreError>;

    /// Size of a full page, when the source decides it.
    fn page_limit(&self) -> Option<usize> {
        None
    }
}

/// Free-text search callback.
#[async_trait]
pub trait SearchSource<R>: Send + Sync {
    /// Run a search for `text`.
    async fn search(&self, text: &str) -> Result<Vec<R>, StoreError>;
}
