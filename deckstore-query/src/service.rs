//! The remote query service: owner-scoped reads, paging loops, batched
//! lookups, and writes against a [`RemoteStore`].

use std::cmp::Ordering;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use deckstore_types::wire::compare;
use deckstore_types::{
    BackendError, Document, DocumentId, FieldKey, FieldPath, Limit, Operation,
    OrderSpec, OwnerId, Predicate, Query, Record, RemoteStore, StoreError, UpdateOperation,
    WireValue, WriteBatch,
};
use tokio_util::sync::CancellationToken;

use crate::builder::QueryBuilder;
use crate::config::QueryConfig;
use crate::translate::translate;

/// Upper bound of the prefix range; sorts after every other code point
/// the backend indexes.
const PREFIX_RANGE_END: char = '\u{f8ff}';

/// Remote query service for one document type.
///
/// Every query is owner-scoped through [`QueryBuilder`]. Backend errors are
/// classified into [`StoreError`] here and nowhere else. Nothing is retried.
///
/// Looping reads (`fetch_all`, `query`, `delete_all`) check the service's
/// [`CancellationToken`] before every page request. Dropping the returned
/// future also stops further requests.
///
/// # Example
///
/// ```ignore
/// let service = DocumentService::<Flashcard>::new(store);
/// let first_page = service
///     .query_paginated_documents(&[Predicate::equal_to("deckId", "d1")], &owner, None)
///     .await?;
/// ```
pub struct DocumentService<D> {
    store: Arc<dyn RemoteStore>,
    config: QueryConfig,
    builder: QueryBuilder,
    cancel: CancellationToken,
    _document: PhantomData<fn() -> D>,
}

impl<D: Document> DocumentService<D> {
    /// Create a service with the document type's default configuration.
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        let config = QueryConfig::for_document::<D>();
        Self {
            store,
            builder: Self::builder_for(&config),
            config,
            cancel: CancellationToken::new(),
            _document: PhantomData,
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.builder = Self::builder_for(&config);
        self.config = config;
        self
    }

    /// Use `token` to stop multi-page loops between requests.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    fn builder_for(config: &QueryConfig) -> QueryBuilder {
        QueryBuilder::for_document::<D>()
            .default_limit(config.page_size)
            .default_order(config.order.clone())
    }

    /// Active configuration.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// The builder composing this service's queries.
    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// The token checked between page requests.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    // ---- Reads --------------------------------------------------------------

    /// Every document the owner has, in the default order, at most `limit`.
    pub async fn fetch_all(
        &self,
        owner: &OwnerId,
        limit: Option<usize>,
    ) -> Result<Vec<D>, StoreError> {
        self.query(&[], owner, limit).await
    }

    /// Point lookup. `Ok(None)` when the document does not exist.
    pub async fn fetch(&self, id: &DocumentId) -> Result<Option<D>, StoreError> {
        tracing::debug!(collection = D::COLLECTION, id = %id, "fetching document");
        let record = self
            .store
            .get(D::COLLECTION, id)
            .await
            .map_err(|e| self.classify(Operation::Fetch, e))?;
        record.as_ref().map(decode::<D>).transpose()
    }

    /// Look up many documents by id.
    ///
    /// Ids are split into membership batches of the backend's maximum size,
    /// one query per batch. Batched membership queries do not preserve a
    /// global order, so the result is re-sorted by the configured order.
    pub async fn fetch_documents(
        &self,
        owner: &OwnerId,
        ids: &[DocumentId],
    ) -> Result<Vec<D>, StoreError> {
        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<&DocumentId> = ids.iter().filter(|id| seen.insert(*id)).collect();

        let mut records = Vec::with_capacity(unique.len());
        for (batch, chunk) in unique.chunks(self.config.membership_batch_size).enumerate() {
            self.check_cancelled()?;
            let predicates = [
                Predicate::is_in(FieldPath::document_id(), chunk.iter().copied()),
                Predicate::Limit(chunk.len()),
            ];
            let query = self.builder.build(owner, &predicates);
            tracing::debug!(
                collection = D::COLLECTION,
                owner = %owner,
                batch,
                ids = chunk.len(),
                "fetching documents by id"
            );
            let page = self
                .store
                .run_query(&query)
                .await
                .map_err(|e| self.classify(Operation::Fetch, e))?;
            records.extend(page);
        }

        let order = self.config.order.clone();
        records.sort_by(|a, b| record_order(a, b, &order));
        records.iter().map(decode::<D>).collect()
    }

    /// Run `predicates` page after page until a short page or `limit`.
    pub async fn query(
        &self,
        predicates: &[Predicate],
        owner: &OwnerId,
        limit: Option<usize>,
    ) -> Result<Vec<D>, StoreError> {
        let query = self.builder.build(owner, predicates);
        let records = self.collect_pages(query, limit).await?;
        records.iter().map(decode::<D>).collect()
    }

    /// Union of two independent queries, duplicates collapsed by id.
    ///
    /// Use this where one query cannot express an OR. The result lists the
    /// first query's documents, then the second's unseen ones; it is NOT in
    /// the service order. Re-sort with [`DocumentService::sort_documents`]
    /// when a merged order matters.
    pub async fn query_union(
        &self,
        first: &[Predicate],
        second: &[Predicate],
        owner: &OwnerId,
    ) -> Result<Vec<D>, StoreError> {
        let left = self.query(first, owner, None).await?;
        let right = self.query(second, owner, None).await?;

        let mut seen: HashSet<DocumentId> = HashSet::with_capacity(left.len() + right.len());
        Ok(left
            .into_iter()
            .chain(right)
            .filter(|doc| seen.insert(doc.id().clone()))
            .collect())
    }

    /// Exactly one page, resuming after `last_document_id` if given.
    ///
    /// The pagination coordinator is built on this call; it never loops.
    pub async fn query_paginated_documents(
        &self,
        predicates: &[Predicate],
        owner: &OwnerId,
        last_document_id: Option<&DocumentId>,
    ) -> Result<Vec<D>, StoreError> {
        let mut query = self.builder.build(owner, predicates);
        if let Some(last_id) = last_document_id {
            let snapshot = self
                .store
                .get(D::COLLECTION, last_id)
                .await
                .map_err(|e| self.classify(Operation::Fetch, e))?
                .ok_or_else(|| {
                    StoreError::FetchFailed(format!(
                        "cursor document {}/{last_id} no longer exists",
                        D::COLLECTION
                    ))
                })?;
            query = query.start_after(snapshot);
        }
        tracing::debug!(
            collection = D::COLLECTION,
            owner = %owner,
            after = ?last_document_id.map(DocumentId::as_str),
            "fetching single page"
        );
        let page = self
            .store
            .run_query(&query)
            .await
            .map_err(|e| self.classify(Operation::Fetch, e))?;
        page.iter().map(decode::<D>).collect()
    }

    /// Number of matches. The default page size is not applied.
    pub async fn query_count(
        &self,
        predicates: &[Predicate],
        owner: &OwnerId,
    ) -> Result<usize, StoreError> {
        let query = self.builder.build_unbounded(owner, predicates);
        tracing::debug!(collection = D::COLLECTION, owner = %owner, "counting documents");
        self.store
            .count(&query)
            .await
            .map_err(|e| self.classify(Operation::Fetch, e))
    }

    /// Whether the owner has any document at all.
    pub async fn has_document(&self, owner: &OwnerId) -> Result<bool, StoreError> {
        self.has_document_matching(&[], owner).await
    }

    /// Whether any owner document matches `predicates`.
    pub async fn has_document_matching(
        &self,
        predicates: &[Predicate],
        owner: &OwnerId,
    ) -> Result<bool, StoreError> {
        let mut scoped = predicates.to_vec();
        scoped.push(Predicate::Limit(1));
        let query = self.builder.build(owner, &scoped);
        let page = self
            .store
            .run_query(&query)
            .await
            .map_err(|e| self.classify(Operation::Fetch, e))?;
        Ok(!page.is_empty())
    }

    /// Up to `count` distinct owner documents in random order.
    pub async fn fetch_random(&self, owner: &OwnerId, count: usize) -> Result<Vec<D>, StoreError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let query = self.builder.build(owner, &[]);
        let records = self.collect_pages(query, None).await?;

        let mut keyed: Vec<(u128, Record)> = records
            .into_iter()
            .map(|record| (uuid::Uuid::new_v4().as_u128(), record))
            .collect();
        keyed.sort_by_key(|(key, _)| *key);
        keyed.truncate(count);
        keyed.iter().map(|(_, record)| decode::<D>(record)).collect()
    }

    /// Documents whose `field` starts with `text`, ordered by `field`.
    /// Empty text matches nothing.
    pub async fn search_prefix(
        &self,
        field: impl Into<FieldPath>,
        text: &str,
        owner: &OwnerId,
        limit: usize,
    ) -> Result<Vec<D>, StoreError> {
        if text.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let field = field.into();
        let upper = format!("{text}{PREFIX_RANGE_END}");
        let predicates = [
            Predicate::greater_or_equal(field.clone(), text),
            Predicate::less_than(field.clone(), upper),
            Predicate::order_by(field),
        ];
        self.query(&predicates, owner, Some(limit)).await
    }

    /// Sort documents by the configured order, id as tie-breaker.
    pub fn sort_documents(&self, documents: &mut [D]) {
        let order = &self.config.order;
        let field = D::Field::ALL.iter().copied().find(|f| f.wire_key() == order.field.as_str());
        documents.sort_by(|a, b| {
            let ord = match field {
                Some(field) => compare(&a.field_value(field), &b.field_value(field)),
                None => Ordering::Equal,
            };
            let ord = ord.then_with(|| a.id().cmp(b.id()));
            if order.descending { ord.reverse() } else { ord }
        });
    }

    // ---- Writes -------------------------------------------------------------

    /// Create a new document. Fails with a validation conflict if the id exists.
    pub async fn create(&self, document: &D) -> Result<(), StoreError> {
        tracing::debug!(collection = D::COLLECTION, id = %document.id(), "creating document");
        self.store
            .create(D::COLLECTION, document.to_record())
            .await
            .map_err(|e| self.classify(Operation::Create, e))
    }

    /// Upsert with merge semantics: fields outside the type's field table
    /// are left untouched server-side.
    pub async fn update(&self, document: &D) -> Result<(), StoreError> {
        tracing::debug!(collection = D::COLLECTION, id = %document.id(), "upserting document");
        self.store
            .set(D::COLLECTION, document.to_record(), true)
            .await
            .map_err(|e| self.classify(Operation::Update, e))
    }

    /// Apply typed field updates as one atomic partial update.
    /// An empty operation list sends nothing.
    pub async fn update_document(
        &self,
        id: &DocumentId,
        operations: &[UpdateOperation],
    ) -> Result<(), StoreError> {
        if operations.is_empty() {
            return Ok(());
        }
        let patch = translate(operations);
        tracing::debug!(
            collection = D::COLLECTION,
            id = %id,
            fields = patch.len(),
            "applying partial update"
        );
        self.store
            .update(D::COLLECTION, id, patch)
            .await
            .map_err(|e| self.classify(Operation::Update, e))
    }

    /// Delete one document.
    pub async fn delete(&self, id: &DocumentId) -> Result<(), StoreError> {
        tracing::debug!(collection = D::COLLECTION, id = %id, "deleting document");
        self.store
            .delete(D::COLLECTION, id)
            .await
            .map_err(|e| self.classify(Operation::Delete, e))
    }

    /// Delete every document the owner has. Returns the number deleted.
    ///
    /// Deletions commit in atomic chunks of at most `write_batch_limit`.
    /// A failure leaves earlier chunks committed and later ones untouched.
    pub async fn delete_all(&self, owner: &OwnerId) -> Result<usize, StoreError> {
        let query = self.builder.build(owner, &[]);
        let ids: Vec<DocumentId> = self
            .collect_pages(query, None)
            .await?
            .into_iter()
            .map(|record| record.id)
            .collect();
        self.delete_documents(&ids).await
    }

    /// Delete the given documents in atomic chunks. Returns the number deleted.
    pub async fn delete_documents(&self, ids: &[DocumentId]) -> Result<usize, StoreError> {
        let mut deleted = 0;
        for (chunk_index, chunk) in ids.chunks(self.config.write_batch_limit).enumerate() {
            self.check_cancelled()?;
            let mut batch = WriteBatch::new();
            for id in chunk {
                batch.delete(D::COLLECTION, id.clone());
            }
            tracing::debug!(
                collection = D::COLLECTION,
                chunk = chunk_index,
                writes = batch.len(),
                "committing delete batch"
            );
            self.store
                .commit(batch)
                .await
                .map_err(|e| self.classify(Operation::Delete, e))?;
            deleted += chunk.len();
        }
        Ok(deleted)
    }

    // ---- Internals ----------------------------------------------------------

    /// Page through `query` until a short page or `limit`, resuming after the
    /// previous page's last record. Any failed page fails the whole call.
    async fn collect_pages(
        &self,
        query: Query,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, StoreError> {
        if limit == Some(0) {
            return Ok(Vec::new());
        }

        let page_size = match query.limit {
            Some(Limit::First(n)) => n,
            Some(Limit::Last(_)) => return self.collect_last(query, limit).await,
            None => self.config.page_size,
        };

        let mut collected: Vec<Record> = Vec::new();
        let mut cursor: Option<Record> = None;
        let mut page_number = 0usize;
        loop {
            self.check_cancelled()?;
            let request = match limit {
                Some(max) => page_size.min(max - collected.len()),
                None => page_size,
            };
            let mut page_query = query.clone().with_limit(Some(Limit::First(request)));
            if let Some(snapshot) = cursor.take() {
                page_query = page_query.start_after(snapshot);
            }

            page_number += 1;
            tracing::debug!(
                collection = %query.collection,
                page = page_number,
                request,
                "fetching page"
            );
            let page = self
                .store
                .run_query(&page_query)
                .await
                .map_err(|e| self.classify(Operation::Fetch, e))?;

            let short = page.len() < request;
            cursor = page.last().cloned();
            collected.extend(page);

            if short || limit.is_some_and(|max| collected.len() >= max) {
                break;
            }
        }

        if let Some(max) = limit {
            collected.truncate(max);
        }
        tracing::debug!(
            collection = %query.collection,
            pages = page_number,
            count = collected.len(),
            "paged query complete"
        );
        Ok(collected)
    }

    /// `LimitToLast` queries anchor at the end of the order; they are run once.
    async fn collect_last(
        &self,
        query: Query,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, StoreError> {
        self.check_cancelled()?;
        let mut page = self
            .store
            .run_query(&query)
            .await
            .map_err(|e| self.classify(Operation::Fetch, e))?;
        if let Some(max) = limit {
            page.truncate(max);
        }
        Ok(page)
    }

    fn check_cancelled(&self) -> Result<(), StoreError> {
        if self.cancel.is_cancelled() {
            tracing::debug!(collection = D::COLLECTION, "cancelled before next request");
            return Err(StoreError::Cancelled);
        }
        Ok(())
    }

    fn classify(&self, operation: Operation, err: BackendError) -> StoreError {
        tracing::warn!(
            collection = D::COLLECTION,
            ?operation,
            code = %err.code,
            message = %err.message,
            "remote store call failed"
        );
        StoreError::classify(operation, err)
    }
}

fn decode<D: Document>(record: &Record) -> Result<D, StoreError> {
    D::from_record(record).map_err(|e| {
        StoreError::FetchFailed(format!("decoding {}/{}: {e}", D::COLLECTION, record.id))
    })
}

fn record_order(a: &Record, b: &Record, order: &OrderSpec) -> Ordering {
    let av = a.value(&order.field).unwrap_or(WireValue::Null);
    let bv = b.value(&order.field).unwrap_or(WireValue::Null);
    let ord = compare(&av, &bv).then_with(|| a.id.cmp(&b.id));
    if order.descending { ord.reverse() } else { ord }
}
