//! Adapters exposing [`DocumentService`] calls as the page and search
//! callbacks the list and search layers drive.

use std::sync::Arc;

use async_trait::async_trait;
use deckstore_types::{
    Document, DocumentId, FieldPath, OwnerId, PageSource, Predicate, SearchSource, StoreError,
};

use crate::service::DocumentService;

/// Single-page fetches for one owner and a fixed predicate list.
///
/// Each call is one [`DocumentService::query_paginated_documents`] request,
/// so the page size is whatever the service injects for these predicates.
pub struct QueryPageSource<D> {
    service: Arc<DocumentService<D>>,
    owner: OwnerId,
    predicates: Vec<Predicate>,
}

impl<D: Document> QueryPageSource<D> {
    /// Page through every document the owner has.
    pub fn new(service: Arc<DocumentService<D>>, owner: OwnerId) -> Self {
        Self { service, owner, predicates: Vec::new() }
    }

    /// Page through the owner's documents matching `predicates`.
    #[must_use]
    pub fn with_predicates(mut self, predicates: Vec<Predicate>) -> Self {
        self.predicates = predicates;
        self
    }

    /// Page size the underlying queries use. A short page means the end.
    pub fn page_size(&self) -> usize {
        let query = self.service.builder().build(&self.owner, &self.predicates);
        query.page_size().unwrap_or_else(|| self.service.config().page_size)
    }
}

#[async_trait]
impl<D: Document> PageSource<D> for QueryPageSource<D> {
    async fn fetch_initial(&self) -> Result<Vec<D>, StoreError> {
        self.service.query_paginated_documents(&self.predicates, &self.owner, None).await
    }

    async fn fetch_after(&self, cursor: &DocumentId) -> Result<Vec<D>, StoreError> {
        self.service
            .query_paginated_documents(&self.predicates, &self.owner, Some(cursor))
            .await
    }

    fn page_limit(&self) -> Option<usize> {
        Some(self.page_size())
    }
}

/// Prefix search over one text field of the owner's documents.
pub struct PrefixSearch<D> {
    service: Arc<DocumentService<D>>,
    owner: OwnerId,
    field: FieldPath,
    limit: usize,
}

impl<D: Document> PrefixSearch<D> {
    /// Search `field`, returning at most the service's page size.
    pub fn new(service: Arc<DocumentService<D>>, owner: OwnerId, field: impl Into<FieldPath>) -> Self {
        let limit = service.config().page_size;
        Self { service, owner, field: field.into(), limit }
    }

    /// Cap the number of results.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[async_trait]
impl<D: Document> SearchSource<D> for PrefixSearch<D> {
    async fn search(&self, text: &str) -> Result<Vec<D>, StoreError> {
        self.service
            .search_prefix(self.field.clone(), text, &self.owner, self.limit)
            .await
    }
}
