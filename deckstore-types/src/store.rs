//! The remote document store boundary.

use async_trait::async_trait;

use crate::document::Record;
use crate::error::BackendError;
use crate::id::DocumentId;
use crate::query::Query;
use crate::update::Patch;

/// The ordered remote document database the access layer sits in front of.
///
/// Implementations:
/// - `MemoryStore`: in-process maps (testing, development)
/// - network clients for a hosted document database
///
/// A query returns one finite ordered page. Fewer records than the query's
/// limit is the only end-of-data signal; there is no "has more" flag.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Point read. `None` when the document does not exist.
    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Record>, BackendError>;

    /// Run one query and return one page of records.
    async fn run_query(&self, query: &Query) -> Result<Vec<Record>, BackendError>;

    /// Count the records a query matches, honoring its limit if set.
    async fn count(&self, query: &Query) -> Result<usize, BackendError>;

    /// Create a document. Fails with `AlreadyExists` if the id is taken.
    async fn create(&self, collection: &str, record: Record) -> Result<(), BackendError>;

    /// Write a document. With `merge`, fields absent from `record` are kept.
    async fn set(&self, collection: &str, record: Record, merge: bool) -> Result<(), BackendError>;

    /// Apply a partial update. Fails with `NotFound` if the document is absent.
    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: Patch,
    ) -> Result<(), BackendError>;

    /// Delete a document. No-op if it does not exist.
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), BackendError>;

    /// Commit a batch of writes atomically.
    async fn commit(&self, batch: WriteBatch) -> Result<(), BackendError>;
}

/// One write inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum BatchWrite {
    /// Delete a document.
    Delete {
        /// Collection name.
        collection: String,
        /// Document to delete.
        id: DocumentId,
    },
    /// Full or merged write.
    Set {
        /// Collection name.
        collection: String,
        /// Record to write.
        record: Record,
        /// Keep fields absent from `record`.
        merge: bool,
    },
}

/// A group of writes the backend commits all-or-nothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WriteBatch {
    writes: Vec<BatchWrite>,
}

impl WriteBatch {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a deletion.
    pub fn delete(&mut self, collection: impl Into<String>, id: DocumentId) -> &mut Self {
        self.writes.push(BatchWrite::Delete { collection: collection.into(), id });
        self
    }

    /// Queue a write.
    pub fn set(&mut self, collection: impl Into<String>, record: Record, merge: bool) -> &mut Self {
        self.writes.push(BatchWrite::Set { collection: collection.into(), record, merge });
        self
    }

    /// Queued writes in order.
    pub fn writes(&self) -> &[BatchWrite] {
        &self.writes
    }

    /// Number of queued writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

impl IntoIterator for WriteBatch {
    type Item = BatchWrite;
    type IntoIter = std::vec::IntoIter<BatchWrite>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}
