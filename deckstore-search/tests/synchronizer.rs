use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use deckstore_search::{Observable, SearchConfig, SearchState, SearchSynchronizer};
use deckstore_types::{SearchSource, StoreError};

/// Answers with every word in `corpus` starting with the query,
/// after `delay`. Fails for the query "boom".
struct Words {
    corpus: Vec<&'static str>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
}

impl Words {
    fn new(corpus: &[&'static str]) -> Arc<Self> {
        Self::slow(corpus, Duration::ZERO)
    }

    fn slow(corpus: &[&'static str], delay: Duration) -> Arc<Self> {
        Arc::new(Self { corpus: corpus.to_vec(), delay, calls: Mutex::default() })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchSource<String> for Words {
    async fn search(&self, text: &str) -> Result<Vec<String>, StoreError> {
        self.calls.lock().unwrap().push(text.to_owned());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if text == "boom" {
            return Err(StoreError::SystemError("index offline".into()));
        }
        Ok(self
            .corpus
            .iter()
            .filter(|w| w.starts_with(text))
            .map(|w| (*w).to_owned())
            .collect())
    }
}

fn synchronizer(source: Arc<Words>) -> SearchSynchronizer<String> {
    SearchSynchronizer::new(source)
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// --- State machine ---

#[tokio::test(start_paused = true)]
async fn starts_idle() {
    let search = synchronizer(Words::new(&["hola"]));
    advance(2_000).await;
    let snapshot = search.snapshot();
    assert_eq!(snapshot.state, SearchState::Idle);
    assert!(snapshot.results.is_empty());
    assert!(snapshot.query.is_empty());
}

#[tokio::test(start_paused = true)]
async fn debounced_text_finds_results() {
    let source = Words::new(&["hola", "hombre", "casa"]);
    let search = synchronizer(source.clone());

    search.set_text("ho");
    advance(999).await;
    assert_eq!(search.state(), SearchState::Idle);
    assert!(source.calls().is_empty());

    advance(2).await;
    assert_eq!(search.state(), SearchState::FoundResults);
    assert_eq!(search.results(), ["hola", "hombre"]);
    assert_eq!(search.snapshot().query, "ho");
}

#[tokio::test(start_paused = true)]
async fn empty_result_is_no_results() {
    let search = synchronizer(Words::new(&["hola"]));
    search.set_text("zz");
    advance(1_100).await;
    assert_eq!(search.state(), SearchState::NoResults);
    assert!(search.results().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failure_becomes_error_state() {
    let search = synchronizer(Words::new(&["hola"]));
    search.set_text("boom");
    advance(1_100).await;

    let snapshot = search.snapshot();
    assert_eq!(snapshot.state, SearchState::Error);
    assert_eq!(snapshot.error, Some(StoreError::SystemError("index offline".into())));
    assert!(snapshot.results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn loading_is_published_while_search_runs() {
    let search = synchronizer(Words::slow(&["hola"], Duration::from_secs(3)));
    search.set_text("h");
    advance(1_500).await;
    assert_eq!(search.state(), SearchState::Loading);
    assert!(search.is_active());

    advance(3_000).await;
    assert_eq!(search.state(), SearchState::FoundResults);
}

// --- Debounce and staleness ---

#[tokio::test(start_paused = true)]
async fn bursts_of_typing_search_once() {
    let source = Words::new(&["hola", "hombre"]);
    let search = synchronizer(source.clone());

    search.set_text("h");
    advance(400).await;
    search.set_text("ho");
    advance(400).await;
    search.set_text("hom");
    advance(1_100).await;

    assert_eq!(source.calls(), ["hom"]);
    assert_eq!(search.results(), ["hombre"]);
}

#[tokio::test(start_paused = true)]
async fn results_for_superseded_text_are_discarded() {
    let source = Words::slow(&["hola", "casa"], Duration::from_secs(5));
    let search = synchronizer(source.clone());

    search.set_text("h");
    advance(2_000).await;
    assert_eq!(search.state(), SearchState::Loading);

    search.set_text("c");
    advance(10_000).await;

    assert_eq!(source.calls(), ["h", "c"]);
    let snapshot = search.snapshot();
    assert_eq!(snapshot.query, "c");
    assert_eq!(snapshot.results, ["casa"]);
}

#[tokio::test(start_paused = true)]
async fn clearing_is_immediate() {
    let search = synchronizer(Words::new(&["hola"]));
    search.set_text("ho");
    advance(1_100).await;
    assert_eq!(search.state(), SearchState::FoundResults);

    search.clear();
    let snapshot = search.snapshot();
    assert_eq!(snapshot.state, SearchState::Idle);
    assert!(snapshot.results.is_empty());
    assert!(snapshot.query.is_empty());
    assert!(search.text().get().is_empty());
}

// --- Shared text ---

#[tokio::test(start_paused = true)]
async fn shared_text_drives_the_search() {
    let text = Observable::new(String::new());
    let search: SearchSynchronizer<String> = SearchSynchronizer::spawn(
        Words::new(&["hola", "casa"]),
        text.clone(),
        SearchConfig::default().with_debounce(Duration::from_millis(200)),
    );

    // Written by a list view, not the synchronizer.
    text.set("ca".into());
    advance(250).await;
    assert_eq!(search.results(), ["casa"]);
    assert_eq!(search.text().get(), "ca");
}

#[tokio::test(start_paused = true)]
async fn subscribers_observe_each_transition() {
    let search = synchronizer(Words::slow(&["hola"], Duration::from_millis(500)));
    let mut rx = search.subscribe();

    search.set_text("h");
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().state, SearchState::Loading);
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().state, SearchState::FoundResults);
}
