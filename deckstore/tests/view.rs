use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use deckstore::deckstore_search::{Observable, SearchConfig, SearchState};
use deckstore::deckstore_types::{DocumentId, Identifiable, PageSource, SearchSource, StoreError};
use deckstore::view::{ListConfig, ListViewModel, LoadOutcome};

#[derive(Debug, Clone, PartialEq)]
struct Row {
    id: DocumentId,
    label: String,
}

fn row(id: &str) -> Row {
    Row { id: DocumentId::new(id), label: id.to_owned() }
}

impl Identifiable for Row {
    fn id(&self) -> &DocumentId {
        &self.id
    }
}

/// Serves scripted pages, optionally after a delay.
struct Pages {
    pages: Mutex<VecDeque<Result<Vec<Row>, StoreError>>>,
    delay: Duration,
    calls: Mutex<usize>,
}

impl Pages {
    fn sized(prefix: &str, sizes: &[usize]) -> Arc<Self> {
        Self::slow(prefix, sizes, Duration::ZERO)
    }

    fn slow(prefix: &str, sizes: &[usize], delay: Duration) -> Arc<Self> {
        let mut next = 0;
        let pages = sizes
            .iter()
            .map(|&size| {
                let page = (next..next + size).map(|i| row(&format!("{prefix}{i}"))).collect();
                next += size;
                Ok(page)
            })
            .collect();
        Arc::new(Self { pages: Mutex::new(pages), delay, calls: Mutex::new(0) })
    }

    fn push(&self, page: Result<Vec<Row>, StoreError>) {
        self.pages.lock().unwrap().push_back(page);
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    async fn next(&self) -> Result<Vec<Row>, StoreError> {
        *self.calls.lock().unwrap() += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.pages.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()))
    }
}

#[async_trait]
impl PageSource<Row> for Pages {
    async fn fetch_initial(&self) -> Result<Vec<Row>, StoreError> {
        self.next().await
    }

    async fn fetch_after(&self, _cursor: &DocumentId) -> Result<Vec<Row>, StoreError> {
        self.next().await
    }
}

/// Matches labels by prefix. Fails for "boom".
struct Labels(Vec<&'static str>);

#[async_trait]
impl SearchSource<Row> for Labels {
    async fn search(&self, text: &str) -> Result<Vec<Row>, StoreError> {
        if text == "boom" {
            return Err(StoreError::SystemError("index offline".into()));
        }
        Ok(self.0.iter().filter(|l| l.starts_with(text)).map(|l| row(l)).collect())
    }
}

fn config() -> ListConfig {
    ListConfig::default()
        .with_page_limit(10)
        .with_cache_capacity(25)
        .with_search(SearchConfig::default().with_debounce(Duration::from_millis(300)))
}

fn view(pages: Arc<Pages>) -> ListViewModel<Row> {
    ListViewModel::new(
        pages,
        Arc::new(Labels(vec!["apple", "apricot", "banana"])),
        Observable::default(),
        config(),
    )
}

fn ids(rows: &[Row]) -> Vec<String> {
    rows.iter().map(|r| r.id.as_str().to_owned()).collect()
}

// --- Loading ---

#[tokio::test]
async fn pages_fill_the_cache_in_order() {
    let pages = Pages::sized("r", &[10, 10, 4]);
    let list = view(pages.clone());

    assert_eq!(list.load_initial().await, LoadOutcome::Loaded(10));
    assert_eq!(list.load_more().await, LoadOutcome::Loaded(10));
    assert_eq!(list.load_more().await, LoadOutcome::Loaded(4));
    assert!(list.is_end_of_list().await);
    assert_eq!(list.load_more().await, LoadOutcome::NothingToLoad);
    assert_eq!(pages.calls(), 3);

    let shown = list.visible_items().await;
    assert_eq!(shown.len(), 24);
    assert_eq!(shown[0].id.as_str(), "r0");
    assert_eq!(shown[23].id.as_str(), "r23");
}

#[tokio::test]
async fn older_pages_stop_at_cache_capacity() {
    let list = view(Pages::sized("r", &[10, 10, 10]));
    list.load_initial().await;
    list.load_more().await;
    list.load_more().await;

    let shown = list.visible_items().await;
    assert_eq!(shown.len(), 25);
    assert_eq!(shown[24].id.as_str(), "r24");
    assert!(list.is_window_full().await);
}

#[tokio::test]
async fn full_cache_stops_fetching_pages_it_cannot_show() {
    let pages = Pages::sized("r", &[10, 10, 10, 10, 10]);
    let list = view(pages.clone());
    list.load_initial().await;
    list.load_more().await;
    list.load_more().await;
    assert_eq!(pages.calls(), 3);

    let last = DocumentId::new("r24");
    assert_eq!(list.item_appeared(&last).await, LoadOutcome::NothingToLoad);
    assert_eq!(list.item_appeared(&last).await, LoadOutcome::NothingToLoad);
    assert_eq!(list.load_more().await, LoadOutcome::NothingToLoad);
    assert_eq!(pages.calls(), 3);
    assert_eq!(list.visible_items().await.last().unwrap().id.as_str(), "r24");

    // Removing shown rows makes room for the next page again.
    list.remove(&[DocumentId::new("r0"), DocumentId::new("r1")]).await;
    assert!(!list.is_window_full().await);
    assert_eq!(list.load_more().await, LoadOutcome::Loaded(10));
    assert_eq!(pages.calls(), 4);
    assert_eq!(list.visible_items().await.len(), 25);
}

#[tokio::test]
async fn load_more_before_initial_does_nothing() {
    let pages = Pages::sized("r", &[10]);
    let list = view(pages.clone());
    assert_eq!(list.load_more().await, LoadOutcome::NothingToLoad);
    assert_eq!(pages.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn duplicate_load_more_is_skipped() {
    let pages = Pages::slow("r", &[10, 10, 10], Duration::from_millis(100));
    let list = Arc::new(view(pages.clone()));
    list.load_initial().await;

    let first = {
        let list = Arc::clone(&list);
        tokio::spawn(async move { list.load_more().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(list.gate().is_busy());
    assert_eq!(list.load_more().await, LoadOutcome::AlreadyLoading);

    assert_eq!(first.await.unwrap(), LoadOutcome::Loaded(10));
    assert_eq!(pages.calls(), 2);
    assert_eq!(list.visible_items().await.len(), 20);
}

#[tokio::test]
async fn items_near_the_end_trigger_the_next_page() {
    let pages = Pages::sized("r", &[10, 10]);
    let list = view(pages.clone());
    list.load_initial().await;

    assert_eq!(list.item_appeared(&DocumentId::new("r2")).await, LoadOutcome::NothingToLoad);
    assert_eq!(pages.calls(), 1);

    assert_eq!(list.item_appeared(&DocumentId::new("r7")).await, LoadOutcome::Loaded(10));
    assert_eq!(pages.calls(), 2);
}

// --- Failures ---

#[tokio::test]
async fn failed_load_becomes_a_dismissible_notice() {
    let pages = Pages::sized("r", &[10]);
    pages.push(Err(StoreError::FetchFailed("timeout".into())));
    let list = view(pages);

    list.load_initial().await;
    assert_eq!(list.load_more().await, LoadOutcome::Failed);

    let notice = list.notice().await.unwrap();
    assert_eq!(notice.error, StoreError::FetchFailed("timeout".into()));
    assert!(notice.message().contains("timeout"));
    assert_eq!(list.visible_items().await.len(), 10);
    assert!(!list.is_end_of_list().await);

    list.dismiss_notice().await;
    assert!(list.notice().await.is_none());
}

#[tokio::test]
async fn successful_reload_clears_the_notice() {
    let pages = Pages::sized("r", &[]);
    pages.push(Err(StoreError::PermissionDenied("rules".into())));
    pages.push(Ok(vec![row("a")]));
    let list = view(pages);

    assert_eq!(list.load_initial().await, LoadOutcome::Failed);
    assert!(list.notice().await.is_some());
    assert_eq!(list.load_initial().await, LoadOutcome::Loaded(1));
    assert!(list.notice().await.is_none());
}

// --- Scope changes ---

#[tokio::test]
async fn changing_scope_replaces_the_list() {
    let list = view(Pages::sized("r", &[10, 10]));
    list.load_initial().await;
    list.load_more().await;

    let filtered = Pages::sized("f", &[3]);
    assert_eq!(list.change_scope(filtered.clone()).await, LoadOutcome::Loaded(3));
    assert_eq!(ids(&list.visible_items().await), ["f0", "f1", "f2"]);
    assert!(list.is_end_of_list().await);
    assert_eq!(filtered.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn scope_change_waits_for_the_load_in_flight() {
    let old = Pages::slow("r", &[10, 10], Duration::from_millis(100));
    let list = Arc::new(view(old.clone()));
    list.load_initial().await;

    let loading = {
        let list = Arc::clone(&list);
        tokio::spawn(async move { list.load_more().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let filtered = Pages::sized("f", &[2]);
    assert_eq!(list.change_scope(filtered).await, LoadOutcome::Loaded(2));
    assert_eq!(loading.await.unwrap(), LoadOutcome::Loaded(10));

    // The old page landed first and was then wiped by the reset.
    assert_eq!(ids(&list.visible_items().await), ["f0", "f1"]);
}

#[tokio::test]
async fn reset_empties_without_loading() {
    let pages = Pages::sized("r", &[10, 10]);
    let list = view(pages.clone());
    list.load_initial().await;

    list.reset().await;
    assert!(list.visible_items().await.is_empty());
    assert_eq!(list.load_more().await, LoadOutcome::NothingToLoad);
    assert_eq!(pages.calls(), 1);
}

#[tokio::test]
async fn reset_dismisses_the_load_notice() {
    let pages = Pages::sized("r", &[]);
    pages.push(Err(StoreError::FetchFailed("timeout".into())));
    let list = view(pages);

    assert_eq!(list.load_initial().await, LoadOutcome::Failed);
    assert!(list.notice().await.is_some());
    list.reset().await;
    assert!(list.notice().await.is_none());
}

/// Delegates to a scripted source and reports a fixed page size.
struct Reporting(Arc<Pages>, usize);

#[async_trait]
impl PageSource<Row> for Reporting {
    async fn fetch_initial(&self) -> Result<Vec<Row>, StoreError> {
        self.0.next().await
    }

    async fn fetch_after(&self, _cursor: &DocumentId) -> Result<Vec<Row>, StoreError> {
        self.0.next().await
    }

    fn page_limit(&self) -> Option<usize> {
        Some(self.1)
    }
}

#[tokio::test]
async fn scope_change_follows_the_new_page_size() {
    let list = view(Pages::sized("r", &[10, 10]));
    list.load_initial().await;

    let small = Pages::sized("s", &[4, 4, 2]);
    let scoped = Arc::new(Reporting(small.clone(), 4));
    assert_eq!(list.change_scope(scoped).await, LoadOutcome::Loaded(4));
    assert!(!list.is_end_of_list().await);
    assert_eq!(list.load_more().await, LoadOutcome::Loaded(4));
    assert_eq!(list.load_more().await, LoadOutcome::Loaded(2));
    assert!(list.is_end_of_list().await);
    assert_eq!(small.calls(), 3);
}

// --- Local edits ---

#[tokio::test]
async fn created_items_go_first_and_deleted_items_disappear() {
    let list = view(Pages::sized("r", &[3]));
    list.load_initial().await;

    list.insert_created(row("new")).await;
    assert_eq!(ids(&list.visible_items().await), ["new", "r0", "r1", "r2"]);

    list.remove(&[DocumentId::new("r1"), DocumentId::new("missing")]).await;
    assert_eq!(ids(&list.visible_items().await), ["new", "r0", "r2"]);
}

#[tokio::test]
async fn replace_refreshes_in_place_and_ignores_unknown_items() {
    let list = view(Pages::sized("r", &[3]));
    list.load_initial().await;

    list.replace(Row { id: DocumentId::new("r1"), label: "edited".into() }).await;
    list.replace(row("stranger")).await;

    let shown = list.visible_items().await;
    assert_eq!(ids(&shown), ["r0", "r1", "r2"]);
    assert_eq!(shown[1].label, "edited");
}

// --- Search ---

#[tokio::test(start_paused = true)]
async fn search_results_replace_the_list_until_cleared() {
    let list = view(Pages::sized("r", &[5]));
    list.load_initial().await;

    list.set_search_text("ap");
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(list.search_snapshot().state, SearchState::FoundResults);
    assert_eq!(ids(&list.visible_items().await), ["apple", "apricot"]);

    // Scrolling search results never pages the underlying list.
    assert_eq!(list.item_appeared(&DocumentId::new("apricot")).await, LoadOutcome::NothingToLoad);

    list.set_search_text("");
    assert_eq!(list.search_snapshot().state, SearchState::Idle);
    assert_eq!(list.visible_items().await.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn search_failure_surfaces_as_notice() {
    let list = view(Pages::sized("r", &[5]));
    list.load_initial().await;

    list.set_search_text("boom");
    tokio::time::sleep(Duration::from_millis(400)).await;
    let notice = list.notice().await.unwrap();
    assert_eq!(notice.error, StoreError::SystemError("index offline".into()));
    assert!(list.visible_items().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn shared_search_text_drives_every_view() {
    let text = Observable::new(String::new());
    let first = ListViewModel::new(
        Pages::sized("r", &[1]),
        Arc::new(Labels(vec!["banana"])),
        text.clone(),
        config(),
    );
    let second = ListViewModel::new(
        Pages::sized("s", &[1]),
        Arc::new(Labels(vec!["bandana"])),
        text.clone(),
        config(),
    );

    text.set("ban".to_owned());
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(ids(&first.visible_items().await), ["banana"]);
    assert_eq!(ids(&second.visible_items().await), ["bandana"]);
    assert!(first.search_text().same_as(second.search_text()));
}
