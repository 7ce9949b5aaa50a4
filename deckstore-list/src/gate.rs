//! One-in-flight guard for list loads.

use std::sync::Arc;

use tokio::sync::watch;

/// Suppresses duplicate loads and lets others wait for the current one.
///
/// [`LoadGate::try_begin`] hands out at most one [`LoadTicket`] at a time.
/// Dropping the ticket marks the gate idle and wakes every
/// [`LoadGate::wait_idle`] caller. Clones share the same gate.
#[derive(Debug, Clone)]
pub struct LoadGate {
    busy: Arc<watch::Sender<bool>>,
}

/// Proof that a load is in flight. Drop it when the load completes.
#[derive(Debug)]
#[must_use = "the gate reopens as soon as the ticket is dropped"]
pub struct LoadTicket {
    busy: Arc<watch::Sender<bool>>,
}

impl LoadGate {
    /// Create an idle gate.
    pub fn new() -> Self {
        let (busy, _) = watch::channel(false);
        Self { busy: Arc::new(busy) }
    }

    /// Start a load unless one is already in flight.
    pub fn try_begin(&self) -> Option<LoadTicket> {
        let mut acquired = false;
        self.busy.send_if_modified(|busy| {
            if *busy {
                return false;
            }
            *busy = true;
            acquired = true;
            true
        });
        if !acquired {
            tracing::trace!("load already in flight");
        }
        acquired.then(|| LoadTicket { busy: Arc::clone(&self.busy) })
    }

    /// Start a load, first waiting out any load already in flight.
    pub async fn begin(&self) -> LoadTicket {
        loop {
            if let Some(ticket) = self.try_begin() {
                return ticket;
            }
            self.wait_idle().await;
        }
    }

    /// Whether a load is in flight.
    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    /// Wait until no load is in flight. Returns immediately when idle.
    pub async fn wait_idle(&self) {
        let mut idle = self.busy.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = idle.wait_for(|busy| !*busy).await;
    }
}

impl Default for LoadGate {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LoadTicket {
    fn drop(&mut self) {
        self.busy.send_replace(false);
    }
}
