//! Debounced free-text search with a small published state machine.

use std::sync::Arc;
use std::time::Duration;

use deckstore_types::{SearchSource, StoreError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::observable::Observable;

/// Debounce interval used when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Configuration for a [`SearchSynchronizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a search runs.
    pub debounce: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { debounce: DEFAULT_DEBOUNCE }
    }
}

impl SearchConfig {
    /// Override the debounce interval.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Where the search currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchState {
    /// No search text.
    #[default]
    Idle,
    /// A search for the current text is running.
    Loading,
    /// The last search returned results.
    FoundResults,
    /// The last search returned nothing.
    NoResults,
    /// The last search failed.
    Error,
}

/// State, query, results and error, always published together.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSnapshot<R> {
    /// Current state.
    pub state: SearchState,
    /// The text the state refers to. Empty when idle.
    pub query: String,
    /// Results. Non-empty only in [`SearchState::FoundResults`].
    pub results: Vec<R>,
    /// The failure. Set only in [`SearchState::Error`].
    pub error: Option<StoreError>,
}

impl<R> SearchSnapshot<R> {
    /// The idle snapshot.
    pub fn idle() -> Self {
        Self { state: SearchState::Idle, query: String::new(), results: Vec::new(), error: None }
    }

    fn loading(query: &str) -> Self {
        Self { state: SearchState::Loading, query: query.to_owned(), results: Vec::new(), error: None }
    }

    fn finished(query: &str, outcome: Result<Vec<R>, StoreError>) -> Self {
        let query = query.to_owned();
        match outcome {
            Ok(results) if results.is_empty() => {
                Self { state: SearchState::NoResults, query, results, error: None }
            }
            Ok(results) => Self { state: SearchState::FoundResults, query, results, error: None },
            Err(err) => {
                Self { state: SearchState::Error, query, results: Vec::new(), error: Some(err) }
            }
        }
    }

    /// Whether a search is in effect. A list view shows search results
    /// instead of its paginated items while this holds.
    pub fn is_active(&self) -> bool {
        self.state != SearchState::Idle
    }
}

/// Runs a [`SearchSource`] against a shared text value.
///
/// The text lives in an [`Observable`] that list views may also write to.
/// Non-empty text is debounced, then searched; results for text that has
/// since changed are discarded. Empty text publishes the idle snapshot at
/// once. Search failures become [`SearchState::Error`], never a panic or a
/// returned error.
///
/// The debounce task is spawned on the current tokio runtime and aborted
/// when the synchronizer is dropped.
pub struct SearchSynchronizer<R> {
    text: Observable<String>,
    snapshot: Arc<watch::Sender<SearchSnapshot<R>>>,
    task: JoinHandle<()>,
}

impl<R> SearchSynchronizer<R>
where
    R: Clone + PartialEq + Send + Sync + 'static,
{
    /// Start a synchronizer with its own text value and default config.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(source: Arc<dyn SearchSource<R>>) -> Self {
        Self::spawn(source, Observable::default(), SearchConfig::default())
    }

    /// Start a synchronizer driven by a shared `text` value.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        source: Arc<dyn SearchSource<R>>,
        text: Observable<String>,
        config: SearchConfig,
    ) -> Self {
        let (snapshot, _) = watch::channel(SearchSnapshot::idle());
        let snapshot = Arc::new(snapshot);
        let driver = Driver {
            source,
            text: text.clone(),
            snapshot: Arc::clone(&snapshot),
            debounce: config.debounce,
        };
        let task = tokio::spawn(driver.run(text.subscribe()));
        Self { text, snapshot, task }
    }

    /// The shared text value.
    pub fn text(&self) -> &Observable<String> {
        &self.text
    }

    /// Change the search text. Empty text resets to idle before returning.
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        let cleared = text.is_empty();
        self.text.set(text);
        if cleared {
            publish(&self.snapshot, SearchSnapshot::idle());
        }
    }

    /// Clear the text and results.
    pub fn clear(&self) {
        self.set_text(String::new());
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> SearchSnapshot<R> {
        self.snapshot.borrow().clone()
    }

    /// The current state.
    pub fn state(&self) -> SearchState {
        self.snapshot.borrow().state
    }

    /// The current results.
    pub fn results(&self) -> Vec<R> {
        self.snapshot.borrow().results.clone()
    }

    /// Whether a search is in effect.
    pub fn is_active(&self) -> bool {
        self.snapshot.borrow().is_active()
    }

    /// A receiver woken on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot<R>> {
        self.snapshot.subscribe()
    }
}

impl<R> Drop for SearchSynchronizer<R> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Publish `next` unless it equals the current snapshot.
fn publish<R: PartialEq>(snapshot: &watch::Sender<SearchSnapshot<R>>, next: SearchSnapshot<R>) {
    snapshot.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        tracing::debug!(from = ?current.state, to = ?next.state, query = %next.query, "search state");
        *current = next;
        true
    });
}

struct Driver<R> {
    source: Arc<dyn SearchSource<R>>,
    text: Observable<String>,
    snapshot: Arc<watch::Sender<SearchSnapshot<R>>>,
    debounce: Duration,
}

impl<R> Driver<R>
where
    R: Clone + PartialEq + Send + Sync + 'static,
{
    async fn run(self, mut changes: watch::Receiver<String>) {
        loop {
            let query = changes.borrow_and_update().clone();
            if query.is_empty() {
                publish(&self.snapshot, SearchSnapshot::idle());
                if changes.changed().await.is_err() {
                    return;
                }
                continue;
            }

            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    continue;
                }
                () = tokio::time::sleep(self.debounce) => {}
            }

            self.publish_current(&query, SearchSnapshot::loading(&query));
            let outcome = tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    tracing::debug!(query = %query, "search superseded");
                    continue;
                }
                outcome = self.source.search(&query) => outcome,
            };
            self.publish_current(&query, SearchSnapshot::finished(&query, outcome));

            if changes.changed().await.is_err() {
                return;
            }
        }
    }

    /// Publish only while `query` is still the text, so a result can never
    /// land after the text moved on.
    fn publish_current(&self, query: &str, next: SearchSnapshot<R>) {
        self.snapshot.send_if_modified(|current| {
            if !self.text.with(|text| text == query) || *current == next {
                return false;
            }
            tracing::debug!(from = ?current.state, to = ?next.state, query = %query, "search state");
            *current = next;
            true
        });
    }
}
