//! Capacity-bounded, insertion-ordered document cache.

use std::collections::{HashMap, HashSet, VecDeque};

use deckstore_types::{DocumentId, Identifiable};

/// Capacity used when none is configured.
pub const DEFAULT_CACHE_CAPACITY: usize = 50;

/// Configuration for a [`BoundedCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached items.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_CACHE_CAPACITY }
    }
}

impl CacheConfig {
    /// Override the capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Ordered, capacity-limited cache keyed by document identifier.
///
/// The key order runs from head (most recently stored new items) to tail
/// (oldest). New items go in at the head; capacity pressure evicts from the
/// tail. Reads never reorder, so this is not an LRU.
///
/// After every operation the key order has no duplicates, every key has a
/// value and vice versa, and `len() <= capacity()`.
///
/// Not synchronized: confine one cache to one owner, or lock around it.
#[derive(Debug, Clone)]
pub struct BoundedCache<T> {
    capacity: usize,
    key_order: VecDeque<DocumentId>,
    items: HashMap<DocumentId, T>,
}

impl<T: Identifiable + Clone> BoundedCache<T> {
    /// Create an empty cache holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            key_order: VecDeque::with_capacity(capacity),
            items: HashMap::with_capacity(capacity),
        }
    }

    /// Create an empty cache from a config.
    pub fn with_config(config: CacheConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Maximum number of items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached items.
    pub fn len(&self) -> usize {
        self.key_order.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.key_order.is_empty()
    }

    /// Whether `id` is cached.
    pub fn contains(&self, id: &DocumentId) -> bool {
        self.items.contains_key(id)
    }

    /// Keys from head to tail.
    pub fn keys(&self) -> impl Iterator<Item = &DocumentId> {
        self.key_order.iter()
    }

    /// Replace the contents with `items`, keeping the first `capacity` in
    /// supplied order. A repeated id keeps its first position and last value.
    pub fn store_initial_data(&mut self, items: impl IntoIterator<Item = T>) {
        self.clear_cache();
        for item in items {
            let id = item.id().clone();
            if self.items.contains_key(&id) {
                self.items.insert(id, item);
                continue;
            }
            if self.key_order.len() >= self.capacity {
                continue;
            }
            self.key_order.push_back(id.clone());
            self.items.insert(id, item);
        }
        tracing::trace!(count = self.len(), capacity = self.capacity, "cache seeded");
    }

    /// Store freshly fetched items at the head, evicting from the tail.
    ///
    /// Items already cached are moved to their new head position. When there
    /// are more new items than capacity, only the first `capacity` are kept.
    pub fn store_new_items(&mut self, new_items: impl IntoIterator<Item = T>) {
        let mut fresh: Vec<T> = Vec::new();
        let mut fresh_ids: HashSet<DocumentId> = HashSet::new();
        for item in new_items {
            if fresh_ids.insert(item.id().clone()) {
                fresh.push(item);
            } else if let Some(slot) = fresh.iter_mut().find(|f| f.id() == item.id()) {
                *slot = item;
            }
        }
        fresh.truncate(self.capacity);

        // Re-stored keys get re-positioned.
        let before = self.key_order.len();
        self.key_order.retain(|id| !fresh_ids.contains(id));
        if self.key_order.len() != before {
            for id in &fresh_ids {
                self.items.remove(id);
            }
        }

        let total = self.key_order.len() + fresh.len();
        if total > self.capacity {
            let overflow = total - self.capacity;
            for _ in 0..overflow {
                if let Some(evicted) = self.key_order.pop_back() {
                    tracing::trace!(id = %evicted, "cache evicted");
                    self.items.remove(&evicted);
                }
            }
        }

        for item in fresh.into_iter().rev() {
            let id = item.id().clone();
            self.key_order.push_front(id.clone());
            self.items.insert(id, item);
        }
    }

    /// Append older items at the tail, up to the remaining headroom.
    ///
    /// Items already cached have their value refreshed in place. Items that
    /// do not fit are dropped.
    pub fn store_old_items(&mut self, old_items: impl IntoIterator<Item = T>) {
        let mut dropped = 0usize;
        for item in old_items {
            let id = item.id().clone();
            if let Some(existing) = self.items.get_mut(&id) {
                *existing = item;
                continue;
            }
            if self.key_order.len() >= self.capacity {
                dropped += 1;
                continue;
            }
            self.key_order.push_back(id.clone());
            self.items.insert(id, item);
        }
        if dropped > 0 {
            tracing::trace!(dropped, capacity = self.capacity, "cache full, old items dropped");
        }
    }

    /// Remove the given ids. Unknown ids are ignored.
    pub fn delete_items<'a>(&mut self, ids: impl IntoIterator<Item = &'a DocumentId>) {
        let doomed: HashSet<&DocumentId> = ids.into_iter().collect();
        if doomed.is_empty() {
            return;
        }
        self.key_order.retain(|id| !doomed.contains(id));
        self.items.retain(|id, _| !doomed.contains(id));
    }

    /// Every cached item, head to tail.
    pub fn retrieve_items(&self) -> Vec<T> {
        self.key_order
            .iter()
            .filter_map(|id| self.items.get(id).cloned())
            .collect()
    }

    /// Point lookup. Does not change the order.
    pub fn retrieve_item(&self, id: &DocumentId) -> Option<&T> {
        self.items.get(id)
    }

    /// Empty the cache.
    pub fn clear_cache(&mut self) {
        self.key_order.clear();
        self.items.clear();
    }
}

impl<T: Identifiable + Clone> Default for BoundedCache<T> {
    fn default() -> Self {
        Self::with_config(CacheConfig::default())
    }
}
