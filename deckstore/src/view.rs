//! A list screen's state: paginated items mirrored into a bounded cache,
//! overridden by search results while a search is in effect.

use std::sync::Arc;

use deckstore_list::{BoundedCache, CacheConfig, LoadGate, LoadTicket, Paginator, PaginatorConfig};
use deckstore_query::{DocumentService, PrefixSearch, QueryPageSource};
use deckstore_search::{Observable, SearchConfig, SearchSnapshot, SearchState, SearchSynchronizer};
use deckstore_types::{
    Document, DocumentId, FieldPath, Identifiable, OwnerId, PageSource, Predicate, SearchSource,
    StoreError,
};
use tokio::sync::Mutex;

/// Configuration for a [`ListViewModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListConfig {
    /// Bounded cache settings.
    pub cache: CacheConfig,
    /// Page size the page source is expected to return, unless the source
    /// reports its own.
    pub paginator: PaginatorConfig,
    /// Search debounce.
    pub search: SearchConfig,
    /// How close to the end of the visible list an appearing item must be to
    /// trigger the next page.
    pub prefetch_distance: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            paginator: PaginatorConfig::default(),
            search: SearchConfig::default(),
            prefetch_distance: 3,
        }
    }
}

impl ListConfig {
    /// Override the cache capacity.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = self.cache.with_capacity(capacity);
        self
    }

    /// Override the page size.
    #[must_use]
    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.paginator = self.paginator.with_page_limit(page_limit);
        self
    }

    /// Override the search configuration.
    #[must_use]
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }
}

/// A dismissible, screen-level error notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// What failed.
    pub error: StoreError,
}

impl Notice {
    /// Text to show the user.
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

/// Result of a load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page of this many items was loaded.
    Loaded(usize),
    /// Another load was in flight; this one was skipped.
    AlreadyLoading,
    /// The list has ended, nothing is loaded yet, or the cache is full.
    NothingToLoad,
    /// The load failed; see [`ListViewModel::notice`].
    Failed,
}

struct ListState<T> {
    paginator: Paginator<T>,
    cache: BoundedCache<T>,
    notice: Option<Notice>,
}

/// The state behind one list screen.
///
/// Pages come from a [`Paginator`] and are mirrored into a [`BoundedCache`],
/// which is what the screen shows. While search text is non-empty, search
/// results replace the cached items. Load failures never propagate; they
/// become a [`Notice`].
///
/// Once the cache is full no further pages are fetched, since none of
/// their items could be shown.
///
/// Loads are gated so at most one runs at a time. A second "near the end"
/// trigger while a page is loading is skipped, and a scope change waits for
/// the in-flight load to finish before resetting.
pub struct ListViewModel<T> {
    state: Mutex<ListState<T>>,
    search: SearchSynchronizer<T>,
    gate: LoadGate,
    prefetch_distance: usize,
}

impl<T> ListViewModel<T>
where
    T: Identifiable + Clone + PartialEq + Send + Sync + 'static,
{
    /// Compose a view model. `search_text` may be shared with other screens.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        pages: Arc<dyn PageSource<T>>,
        search: Arc<dyn SearchSource<T>>,
        search_text: Observable<String>,
        config: ListConfig,
    ) -> Self {
        Self {
            state: Mutex::new(ListState {
                paginator: Paginator::with_config(pages, config.paginator),
                cache: BoundedCache::with_config(config.cache),
                notice: None,
            }),
            search: SearchSynchronizer::spawn(search, search_text, config.search),
            gate: LoadGate::new(),
            prefetch_distance: config.prefetch_distance,
        }
    }

    /// Load the first page, replacing everything shown.
    pub async fn load_initial(&self) -> LoadOutcome {
        let Some(ticket) = self.gate.try_begin() else {
            return LoadOutcome::AlreadyLoading;
        };
        self.load_initial_with(ticket).await
    }

    async fn load_initial_with(&self, _ticket: LoadTicket) -> LoadOutcome {
        let mut state = self.state.lock().await;
        let ListState { paginator, cache, notice } = &mut *state;
        match paginator.load_initial_items().await {
            Ok(page) => {
                cache.store_initial_data(page.iter().cloned());
                *notice = None;
                tracing::debug!(count = page.len(), "list loaded");
                LoadOutcome::Loaded(page.len())
            }
            Err(error) => {
                tracing::debug!(%error, "initial list load failed");
                *notice = Some(Notice { error });
                LoadOutcome::Failed
            }
        }
    }

    /// Load the next page and append it behind the cached items.
    pub async fn load_more(&self) -> LoadOutcome {
        let Some(_ticket) = self.gate.try_begin() else {
            tracing::trace!("load more skipped, load in flight");
            return LoadOutcome::AlreadyLoading;
        };
        let mut state = self.state.lock().await;
        let ListState { paginator, cache, notice } = &mut *state;
        if paginator.is_end_of_list() || paginator.cursor().is_none() {
            return LoadOutcome::NothingToLoad;
        }
        // Older items are only appended into headroom; a full cache would
        // drop the whole page.
        if cache.len() >= cache.capacity() {
            tracing::trace!(capacity = cache.capacity(), "load more skipped, cache full");
            return LoadOutcome::NothingToLoad;
        }
        match paginator.load_more_items().await {
            Ok(page) => {
                cache.store_old_items(page.iter().cloned());
                tracing::debug!(count = page.len(), "list page appended");
                LoadOutcome::Loaded(page.len())
            }
            Err(error) => {
                tracing::debug!(%error, "list page load failed");
                *notice = Some(Notice { error });
                LoadOutcome::Failed
            }
        }
    }

    /// Call when an item scrolls into view. Loads the next page when the
    /// item is within the prefetch distance of the end and no search is on.
    pub async fn item_appeared(&self, id: &DocumentId) -> LoadOutcome {
        if self.search.is_active() {
            return LoadOutcome::NothingToLoad;
        }
        let near_end = {
            let state = self.state.lock().await;
            let len = state.cache.len();
            state
                .cache
                .keys()
                .position(|key| key == id)
                .is_some_and(|at| at + self.prefetch_distance >= len)
        };
        if !near_end {
            return LoadOutcome::NothingToLoad;
        }
        self.load_more().await
    }

    /// Switch to a new filter scope: wait out any in-flight load, reset the
    /// paginator and cache, and load the first page of `pages`. The page
    /// limit follows `pages` when it reports one.
    pub async fn change_scope(&self, pages: Arc<dyn PageSource<T>>) -> LoadOutcome {
        let ticket = self.gate.begin().await;
        {
            let mut state = self.state.lock().await;
            state.paginator.set_source(pages);
            state.cache.clear_cache();
            state.notice = None;
        }
        tracing::debug!("list scope changed");
        self.load_initial_with(ticket).await
    }

    /// Reset paging, cache and notice without loading.
    pub async fn reset(&self) {
        let _ticket = self.gate.begin().await;
        let mut state = self.state.lock().await;
        state.paginator.reset();
        state.cache.clear_cache();
        state.notice = None;
    }

    /// Whether the cache is full, so no further page can be shown.
    pub async fn is_window_full(&self) -> bool {
        let state = self.state.lock().await;
        state.cache.len() >= state.cache.capacity()
    }

    /// What the screen shows: search results while searching, else the
    /// cached items.
    pub async fn visible_items(&self) -> Vec<T> {
        let snapshot = self.search.snapshot();
        if snapshot.is_active() {
            return snapshot.results;
        }
        self.state.lock().await.cache.retrieve_items()
    }

    /// Show a newly created item at the head of the list.
    pub async fn insert_created(&self, item: T) {
        self.state.lock().await.cache.store_new_items([item]);
    }

    /// Refresh an item already shown. Items not shown are ignored.
    pub async fn replace(&self, item: T) {
        let mut state = self.state.lock().await;
        if state.cache.contains(item.id()) {
            state.cache.store_old_items([item]);
        }
    }

    /// Stop showing `ids`.
    pub async fn remove(&self, ids: &[DocumentId]) {
        self.state.lock().await.cache.delete_items(ids);
    }

    /// Whether the paginated list has ended.
    pub async fn is_end_of_list(&self) -> bool {
        self.state.lock().await.paginator.is_end_of_list()
    }

    /// The current notification: a load failure, else a search failure.
    pub async fn notice(&self) -> Option<Notice> {
        if let Some(notice) = self.state.lock().await.notice.clone() {
            return Some(notice);
        }
        let snapshot = self.search.snapshot();
        match (snapshot.state, snapshot.error) {
            (SearchState::Error, Some(error)) => Some(Notice { error }),
            _ => None,
        }
    }

    /// Dismiss the load-failure notice.
    pub async fn dismiss_notice(&self) {
        self.state.lock().await.notice = None;
    }

    /// Change the shared search text. Empty text ends the search at once.
    pub fn set_search_text(&self, text: impl Into<String>) {
        self.search.set_text(text);
    }

    /// The current search snapshot.
    pub fn search_snapshot(&self) -> SearchSnapshot<T> {
        self.search.snapshot()
    }

    /// The shared search text.
    pub fn search_text(&self) -> &Observable<String> {
        self.search.text()
    }

    /// The load gate, for callers that trigger loads from elsewhere.
    pub fn gate(&self) -> &LoadGate {
        &self.gate
    }
}

impl<D: Document + PartialEq> ListViewModel<D> {
    /// A view model over `service`: pages of the owner's documents matching
    /// `predicates`, and prefix search on `search_field`.
    pub fn for_service(
        service: Arc<DocumentService<D>>,
        owner: OwnerId,
        predicates: Vec<Predicate>,
        search_field: impl Into<FieldPath>,
        search_text: Observable<String>,
        config: ListConfig,
    ) -> Self {
        let pages = QueryPageSource::new(Arc::clone(&service), owner.clone())
            .with_predicates(predicates);
        let search = PrefixSearch::new(service, owner, search_field);
        Self::new(Arc::new(pages), Arc::new(search), search_text, config)
    }
}
