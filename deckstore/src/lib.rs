#![deny(missing_docs)]
//! # deckstore: umbrella crate
//!
//! A single import surface for paginated, cached, owner-scoped access to a
//! remote document store. Re-exports the building blocks behind feature
//! flags, the composed [`view::ListViewModel`] under `view`, and a
//! `prelude` for the happy path.

#[cfg(feature = "list")]
pub use deckstore_list;
#[cfg(feature = "memory")]
pub use deckstore_memory;
#[cfg(feature = "model")]
pub use deckstore_model;
#[cfg(feature = "core")]
pub use deckstore_query;
#[cfg(feature = "search")]
pub use deckstore_search;
#[cfg(feature = "core")]
pub use deckstore_types;

#[cfg(feature = "view")]
pub mod view;

/// Happy-path imports for building list screens.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use deckstore_types::{
        Document, DocumentId, FieldPath, Identifiable, OwnerId, PageSource, Predicate,
        RemoteStore, SearchSource, StoreError, UpdateOperation,
    };

    #[cfg(feature = "core")]
    pub use deckstore_query::{DocumentService, PrefixSearch, QueryConfig, QueryPageSource};

    #[cfg(feature = "list")]
    pub use deckstore_list::{BoundedCache, LoadGate, Paginator};

    #[cfg(feature = "search")]
    pub use deckstore_search::{Observable, SearchState, SearchSynchronizer};

    #[cfg(feature = "view")]
    pub use crate::view::{ListConfig, ListViewModel, LoadOutcome, Notice};

    #[cfg(feature = "memory")]
    pub use deckstore_memory::MemoryStore;

    #[cfg(feature = "model")]
    pub use deckstore_model::{Deck, Flashcard, ReviewSession};
}
