//! A shared value with change notification.

use std::sync::Arc;

use tokio::sync::watch;

/// One source of truth for a value several consumers read and write.
///
/// Clones share the value. Setting an equal value is a no-op and wakes no
/// subscriber, so two consumers mirroring each other cannot loop.
#[derive(Debug)]
pub struct Observable<T> {
    inner: Arc<watch::Sender<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Clone + PartialEq> Observable<T> {
    /// Create an observable holding `initial`.
    pub fn new(initial: T) -> Self {
        let (inner, _) = watch::channel(initial);
        Self { inner: Arc::new(inner) }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.inner.borrow().clone()
    }

    /// Run `f` against the current value without cloning it.
    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        f(&self.inner.borrow())
    }

    /// Replace the value. Returns whether it changed.
    pub fn set(&self, value: T) -> bool {
        self.inner.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        })
    }

    /// A receiver woken on every effective change.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.inner.subscribe()
    }

    /// Whether both handles share one value.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone + PartialEq + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
