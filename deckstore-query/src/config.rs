//! Configuration for the remote query service.

use deckstore_types::{Document, FieldKey, OrderSpec};

use crate::builder::DEFAULT_PAGE_SIZE;

/// Backend maximum number of values in one membership (`In`) query.
pub const MEMBERSHIP_BATCH_SIZE: usize = 10;

/// Backend maximum number of writes in one atomic batch.
pub const WRITE_BATCH_LIMIT: usize = 500;

/// Configuration for a [`DocumentService`](crate::DocumentService).
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    /// Documents per page for looping and single-page queries.
    pub page_size: usize,
    /// Ids per membership query in batched lookups.
    pub membership_batch_size: usize,
    /// Deletions per committed batch.
    pub write_batch_limit: usize,
    /// Default order, also used to re-sort batched lookups.
    pub order: OrderSpec,
}

impl QueryConfig {
    /// Defaults for a document type: backend limits plus its declared order.
    pub fn for_document<D: Document>() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            membership_batch_size: MEMBERSHIP_BATCH_SIZE,
            write_batch_limit: WRITE_BATCH_LIMIT,
            order: OrderSpec { field: D::ORDER_FIELD.path(), descending: D::ORDER_DESCENDING },
        }
    }

    /// Override the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Override the default order.
    #[must_use]
    pub fn with_order(mut self, order: OrderSpec) -> Self {
        self.order = order;
        self
    }

    /// Override the write batch size. Clamped to the backend limit.
    #[must_use]
    pub fn with_write_batch_limit(mut self, limit: usize) -> Self {
        self.write_batch_limit = limit.clamp(1, WRITE_BATCH_LIMIT);
        self
    }
}
