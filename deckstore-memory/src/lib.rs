#![deny(missing_docs)]
//! In-memory implementation of deckstore's RemoteStore trait.
//!
//! Collections are `BTreeMap`s behind a `RwLock`. Query evaluation follows
//! the hosted backend's rules (kind-aware ranges, id tie-breaks, start-after
//! cursors, membership and batch limits) so service code behaves the same
//! against this store as against the real one.
//!
//! The store also counts the calls it receives and can be scripted to fail,
//! which makes batching, pagination, and error classification observable in
//! tests.

mod eval;

use async_trait::async_trait;
use deckstore_types::{
    BackendCode, BackendError, BatchWrite, DocumentId, FieldInstruction, Patch, Query, Record,
    RemoteStore, WireValue, WriteBatch,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};

/// Backend limits the in-memory store enforces.
#[derive(Debug, Clone)]
pub struct MemoryStoreConfig {
    /// Maximum operand count for `In`, `NotIn`, and `ArrayContainsAny`.
    pub max_membership_values: usize,
    /// Maximum writes per committed batch.
    pub max_batch_writes: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self { max_membership_values: 10, max_batch_writes: 500 }
    }
}

/// Call counters, for asserting how many round trips an operation made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Point reads.
    pub gets: usize,
    /// Page queries.
    pub queries: usize,
    /// Count queries.
    pub counts: usize,
    /// Single-document writes (create/set/update/delete).
    pub writes: usize,
    /// Batch commits.
    pub commits: usize,
}

type Collection = BTreeMap<DocumentId, Record>;

/// In-memory remote store.
///
/// Suitable for testing, prototyping, and single-process use where
/// persistence is not required.
pub struct MemoryStore {
    config: MemoryStoreConfig,
    collections: RwLock<HashMap<String, Collection>>,
    next_failures: Mutex<VecDeque<BackendError>>,
    query_failures: Mutex<BTreeMap<usize, BackendError>>,
    query_log: Mutex<Vec<Query>>,
    gets: AtomicUsize,
    queries: AtomicUsize,
    counts: AtomicUsize,
    writes: AtomicUsize,
    commits: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store with default backend limits.
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    /// Create an empty store with explicit limits.
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            config,
            collections: RwLock::new(HashMap::new()),
            next_failures: Mutex::new(VecDeque::new()),
            query_failures: Mutex::new(BTreeMap::new()),
            query_log: Mutex::new(Vec::new()),
            gets: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
            counts: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            commits: AtomicUsize::new(0),
        }
    }

    /// Insert records directly, bypassing counters and failure scripts.
    pub async fn seed(&self, collection: &str, records: impl IntoIterator<Item = Record>) {
        let mut collections = self.collections.write().await;
        let target = collections.entry(collection.to_owned()).or_default();
        for record in records {
            target.insert(record.id.clone(), record);
        }
    }

    /// Every record in a collection, in id order.
    pub async fn snapshot(&self, collection: &str) -> Vec<Record> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Fail the next call of any kind with `err`. Calls queue in order.
    pub async fn fail_next(&self, err: BackendError) {
        self.next_failures.lock().await.push_back(err);
    }

    /// Fail the `nth` page query (1-based, counted from store creation).
    pub async fn fail_query_at(&self, nth: usize, err: BackendError) {
        self.query_failures.lock().await.insert(nth, err);
    }

    /// Current call counters.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            gets: self.gets.load(Ordering::SeqCst),
            queries: self.queries.load(Ordering::SeqCst),
            counts: self.counts.load(Ordering::SeqCst),
            writes: self.writes.load(Ordering::SeqCst),
            commits: self.commits.load(Ordering::SeqCst),
        }
    }

    /// Every page query received, in order.
    pub async fn query_log(&self) -> Vec<Query> {
        self.query_log.lock().await.clone()
    }

    async fn scripted_failure(&self) -> Result<(), BackendError> {
        match self.next_failures.lock().await.pop_front() {
            Some(err) => {
                tracing::trace!(code = %err.code, "memory store: scripted failure");
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn apply_set(target: &mut Collection, record: Record, merge: bool) {
        if merge {
            if let Some(existing) = target.get_mut(&record.id) {
                existing.fields.extend(record.fields);
                return;
            }
        }
        target.insert(record.id.clone(), record);
    }

    fn apply_patch(record: &mut Record, patch: Patch) {
        for (field, instruction) in patch {
            let key = field.as_str().to_owned();
            match instruction {
                FieldInstruction::Set(value) => {
                    record.fields.insert(key, value);
                }
                FieldInstruction::ArrayUnion(values) => {
                    let slot = record.fields.entry(key).or_insert(WireValue::Array(Vec::new()));
                    if !slot.is_array() {
                        *slot = WireValue::Array(Vec::new());
                    }
                    if let WireValue::Array(items) = slot {
                        for value in values {
                            if !items.contains(&value) {
                                items.push(value);
                            }
                        }
                    }
                }
                FieldInstruction::ArrayRemove(values) => {
                    if let Some(WireValue::Array(items)) = record.fields.get_mut(&key) {
                        items.retain(|item| !values.contains(item));
                    }
                }
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Record>, BackendError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.scripted_failure().await?;
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<Record>, BackendError> {
        let nth = self.queries.fetch_add(1, Ordering::SeqCst) + 1;
        self.query_log.lock().await.push(query.clone());
        self.scripted_failure().await?;
        if let Some(err) = self.query_failures.lock().await.remove(&nth) {
            return Err(err);
        }
        eval::validate(query, self.config.max_membership_values)?;

        let collections = self.collections.read().await;
        let page = match collections.get(&query.collection) {
            Some(records) => eval::execute(records.values(), query),
            None => Vec::new(),
        };
        tracing::trace!(collection = %query.collection, returned = page.len(), "memory store: query");
        Ok(page)
    }

    async fn count(&self, query: &Query) -> Result<usize, BackendError> {
        self.counts.fetch_add(1, Ordering::SeqCst);
        self.scripted_failure().await?;
        eval::validate(query, self.config.max_membership_values)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(&query.collection)
            .map(|records| eval::execute(records.values(), query).len())
            .unwrap_or(0))
    }

    async fn create(&self, collection: &str, record: Record) -> Result<(), BackendError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.scripted_failure().await?;
        let mut collections = self.collections.write().await;
        let target = collections.entry(collection.to_owned()).or_default();
        if target.contains_key(&record.id) {
            return Err(BackendError::new(
                BackendCode::AlreadyExists,
                format!("document {collection}/{} already exists", record.id),
            ));
        }
        target.insert(record.id.clone(), record);
        Ok(())
    }

    async fn set(&self, collection: &str, record: Record, merge: bool) -> Result<(), BackendError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.scripted_failure().await?;
        let mut collections = self.collections.write().await;
        let target = collections.entry(collection.to_owned()).or_default();
        Self::apply_set(target, record, merge);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: Patch,
    ) -> Result<(), BackendError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.scripted_failure().await?;
        let mut collections = self.collections.write().await;
        let record = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| {
                BackendError::new(BackendCode::NotFound, format!("no document {collection}/{id}"))
            })?;
        Self::apply_patch(record, patch);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), BackendError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.scripted_failure().await?;
        let mut collections = self.collections.write().await;
        if let Some(target) = collections.get_mut(collection) {
            target.remove(id);
        }
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), BackendError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.scripted_failure().await?;
        if batch.len() > self.config.max_batch_writes {
            return Err(BackendError::new(
                BackendCode::InvalidArgument,
                format!(
                    "batch of {} writes exceeds limit of {}",
                    batch.len(),
                    self.config.max_batch_writes
                ),
            ));
        }
        // Holding the write lock for the whole batch makes it atomic.
        let mut collections = self.collections.write().await;
        for write in batch {
            match write {
                BatchWrite::Delete { collection, id } => {
                    if let Some(target) = collections.get_mut(&collection) {
                        target.remove(&id);
                    }
                }
                BatchWrite::Set { collection, record, merge } => {
                    let target = collections.entry(collection).or_default();
                    Self::apply_set(target, record, merge);
                }
            }
        }
        Ok(())
    }
}
