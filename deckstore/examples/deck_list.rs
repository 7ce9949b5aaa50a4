//! A deck list screen over the in-memory store: paging, a theme filter,
//! prefix search and a local edit.
//!
//! Run with: RUST_LOG=debug cargo run --example deck_list -p deckstore --features full

use std::sync::Arc;
use std::time::Duration;

use deckstore::deckstore_model::{DeckField, DeckTheme};
use deckstore::deckstore_search::SearchConfig;
use deckstore::deckstore_types::FieldKey;
use deckstore::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber (respects RUST_LOG env var).
    tracing_subscriber::fmt::init();

    let owner = OwnerId::new("demo-user");
    let store = Arc::new(MemoryStore::new());
    let decks = Arc::new(DocumentService::<Deck>::new(store.clone()));

    for (i, name) in ["Spanish verbs", "Spanish nouns", "French", "Rust traits", "Go"]
        .into_iter()
        .enumerate()
    {
        let theme = if i % 2 == 0 { DeckTheme::Forest } else { DeckTheme::Ocean };
        decks.create(&Deck::new(owner.clone(), name).with_theme(theme)).await?;
    }

    let config = ListConfig::default()
        .with_page_limit(2)
        .with_search(SearchConfig::default().with_debounce(Duration::from_millis(200)));
    let list = ListViewModel::for_service(
        Arc::clone(&decks),
        owner.clone(),
        vec![Predicate::Limit(2)],
        DeckField::Name.path(),
        Observable::default(),
        config,
    );

    // Page through everything.
    list.load_initial().await;
    while !list.is_end_of_list().await {
        if list.load_more().await == LoadOutcome::Failed {
            break;
        }
    }
    print_decks("all decks", &list.visible_items().await);

    // Narrow to one theme.
    let forest = QueryPageSource::new(Arc::clone(&decks), owner.clone())
        .with_predicates(vec![Deck::themed(DeckTheme::Forest)]);
    list.change_scope(Arc::new(forest)).await;
    print_decks("forest decks", &list.visible_items().await);

    // Search overrides the list until cleared.
    list.set_search_text("Spanish");
    tokio::time::sleep(Duration::from_millis(400)).await;
    println!("search state: {:?}", list.search_snapshot().state);
    print_decks("search results", &list.visible_items().await);
    list.set_search_text("");

    // Rename one deck and refresh it in place.
    if let Some(first) = list.visible_items().await.first() {
        decks.update_document(&first.id, &Deck::rename("Renamed")).await?;
        if let Some(renamed) = decks.fetch(&first.id).await? {
            list.replace(renamed).await;
        }
    }
    print_decks("after rename", &list.visible_items().await);

    if let Some(notice) = list.notice().await {
        println!("notice: {}", notice.message());
    }
    Ok(())
}

fn print_decks(title: &str, decks: &[Deck]) {
    println!("{title}:");
    for deck in decks {
        println!("  {} ({:?})", deck.name, deck.theme);
    }
}
