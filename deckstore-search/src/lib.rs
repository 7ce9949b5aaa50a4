#![deny(missing_docs)]
//! Debounced search for deckstore list views.
//!
//! An [`Observable`] holds the search text; list views and the
//! [`SearchSynchronizer`] share one instance instead of mirroring two
//! fields. The synchronizer debounces changes, runs a
//! [`SearchSource`](deckstore_types::SearchSource), and publishes a
//! [`SearchSnapshot`] whose state, results and error always change together.

pub mod observable;
pub mod synchronizer;

pub use observable::Observable;
pub use synchronizer::{
    DEFAULT_DEBOUNCE, SearchConfig, SearchSnapshot, SearchState, SearchSynchronizer,
};
