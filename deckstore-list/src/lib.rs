#![deny(missing_docs)]
//! List-view building blocks for deckstore.
//!
//! | Type | Role |
//! |------|------|
//! | [`BoundedCache`] | capacity-limited, insertion-ordered window of documents |
//! | [`Paginator`] | initial/next page state machine over a [`PageSource`](deckstore_types::PageSource) |
//! | [`LoadGate`] | at most one load in flight, with a completion signal |
//!
//! None of these perform I/O themselves, and none are internally
//! synchronized beyond what their `&mut self` signatures require.

pub mod cache;
pub mod gate;
pub mod paginator;

pub use cache::{BoundedCache, CacheConfig, DEFAULT_CACHE_CAPACITY};
pub use gate::{LoadGate, LoadTicket};
pub use paginator::{DEFAULT_PAGE_LIMIT, Paginator, PaginatorConfig};
