//! Copy-on-write subscriber list for channel events.
//!
//! Publishing clones an `Arc` of the current list and iterates it without
//! holding the lock, so subscribers may be added or removed while an event is
//! being delivered.  Mutations replace the whole `Vec`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use emu_core::protocol::ChannelEvent;
use tokio::sync::mpsc;
use tracing::debug;

/// Identifies one subscription for [`Subscribers::unsubscribe`].
pub type SubscriptionId = u64;

type Entry = (SubscriptionId, mpsc::UnboundedSender<ChannelEvent>);

#[derive(Default)]
pub struct Subscribers {
    next_id: AtomicU64,
    list: Mutex<Arc<Vec<Entry>>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&self) -> MutexGuard<'_, Arc<Vec<Entry>>> {
        self.list.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a subscriber.  It receives every event published from now on, in
    /// publish order.
    pub fn subscribe(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut guard = self.list();
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push((id, tx));
        *guard = Arc::new(next);

        (id, rx)
    }

    /// Removes a subscriber.  Returns `false` if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut guard = self.list();
        if !guard.iter().any(|(sid, _)| *sid == id) {
            return false;
        }
        let next: Vec<Entry> = guard.iter().filter(|(sid, _)| *sid != id).cloned().collect();
        *guard = Arc::new(next);
        true
    }

    /// Delivers `event` to every current subscriber.  Subscribers whose
    /// receiver was dropped are removed.
    pub fn publish(&self, event: &ChannelEvent) {
        let snapshot = Arc::clone(&*self.list());

        let mut dead = Vec::new();
        for (id, tx) in snapshot.iter() {
            if tx.send(event.clone()).is_err() {
                dead.push(*id);
            }
        }

        for id in dead {
            debug!(id, "Dropping closed subscriber");
            self.unsubscribe(id);
        }
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
