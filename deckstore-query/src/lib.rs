#![deny(missing_docs)]
//! Owner-scoped queries over a [`RemoteStore`](deckstore_types::RemoteStore).
//!
//! - [`QueryBuilder`] turns predicate lists into backend queries, always
//!   filtered by the owner and always ordered and bounded.
//! - [`translate`] turns typed [`UpdateOperation`](deckstore_types::UpdateOperation)s
//!   into one atomic partial-update payload.
//! - [`DocumentService`] runs reads, paging loops, batched id lookups and
//!   writes, and classifies backend failures into
//!   [`StoreError`](deckstore_types::StoreError).
//! - [`QueryPageSource`] and [`PrefixSearch`] adapt the service to the
//!   page and search callbacks used by the list and search layers.

pub mod builder;
pub mod config;
pub mod service;
pub mod sources;
pub mod translate;

pub use builder::{DEFAULT_PAGE_SIZE, QueryBuilder};
pub use config::{MEMBERSHIP_BATCH_SIZE, QueryConfig, WRITE_BATCH_LIMIT};
pub use service::DocumentService;
pub use sources::{PrefixSearch, QueryPageSource};
pub use translate::translate;
