//! Cursor pagination over an injected [`PageSource`].

use std::sync::Arc;

use deckstore_types::{DocumentId, Identifiable, PageSource, StoreError};

/// Page size used when none is configured.
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Configuration for a [`Paginator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatorConfig {
    /// Expected page size. A page shorter than this ends the list.
    pub page_limit: usize,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self { page_limit: DEFAULT_PAGE_LIMIT }
    }
}

impl PaginatorConfig {
    /// Override the page limit.
    #[must_use]
    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit;
        self
    }
}

/// Pagination state machine over `{items, cursor, end_of_list}`.
///
/// A failed fetch leaves every field as it was. The coordinator expects at
/// most one load in flight; callers enforce that (see
/// [`LoadGate`](crate::LoadGate)).
pub struct Paginator<T> {
    source: Arc<dyn PageSource<T>>,
    config: PaginatorConfig,
    items: Vec<T>,
    cursor: Option<DocumentId>,
    end_of_list: bool,
}

impl<T: Identifiable + Send + 'static> Paginator<T> {
    /// Create a paginator over `source` with the default page limit.
    pub fn new(source: Arc<dyn PageSource<T>>) -> Self {
        Self::with_config(source, PaginatorConfig::default())
    }

    /// Create a paginator with an explicit configuration. A page limit the
    /// source reports takes precedence over `config.page_limit`.
    pub fn with_config(source: Arc<dyn PageSource<T>>, mut config: PaginatorConfig) -> Self {
        if let Some(limit) = source.page_limit() {
            config.page_limit = limit;
        }
        Self { source, config, items: Vec::new(), cursor: None, end_of_list: false }
    }

    /// Fetch the first page, replacing all items. Returns the loaded page.
    pub async fn load_initial_items(&mut self) -> Result<&[T], StoreError> {
        let page = self.source.fetch_initial().await?;
        self.end_of_list = page.len() < self.config.page_limit;
        self.cursor = page.last().map(|item| item.id().clone());
        self.items = page;
        tracing::trace!(
            count = self.items.len(),
            end_of_list = self.end_of_list,
            "initial page loaded"
        );
        Ok(&self.items)
    }

    /// Fetch the page after the cursor and append it. Returns the newly
    /// loaded page, empty when the list has ended or nothing was loaded yet.
    pub async fn load_more_items(&mut self) -> Result<&[T], StoreError> {
        let cursor = match (&self.cursor, self.end_of_list) {
            (Some(cursor), false) => cursor.clone(),
            _ => return Ok(&[]),
        };
        let page = self.source.fetch_after(&cursor).await?;

        self.end_of_list = page.len() < self.config.page_limit;
        if let Some(last) = page.last() {
            self.cursor = Some(last.id().clone());
        }
        let start = self.items.len();
        self.items.extend(page);
        tracing::trace!(
            loaded = self.items.len() - start,
            total = self.items.len(),
            end_of_list = self.end_of_list,
            "next page loaded"
        );
        Ok(&self.items[start..])
    }

    /// Forget all state. Call when the filter scope changes.
    pub fn reset(&mut self) {
        self.items.clear();
        self.cursor = None;
        self.end_of_list = false;
        tracing::trace!("paginator reset");
    }

    /// Replace the source and reset. The cursor is only valid in one scope.
    /// Adopts the new source's page limit when it reports one.
    pub fn set_source(&mut self, source: Arc<dyn PageSource<T>>) {
        if let Some(limit) = source.page_limit() {
            self.config.page_limit = limit;
        }
        self.source = source;
        self.reset();
    }

    /// Items loaded so far, in page order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Identifier of the last item of the most recent non-empty page.
    pub fn cursor(&self) -> Option<&DocumentId> {
        self.cursor.as_ref()
    }

    /// Whether a short page has been seen since the last reset.
    pub fn is_end_of_list(&self) -> bool {
        self.end_of_list
    }

    /// Expected page size.
    pub fn page_limit(&self) -> usize {
        self.config.page_limit
    }
}
