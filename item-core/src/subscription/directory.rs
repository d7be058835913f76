//! Subscription directory: versioned, lock-free-read table of live subscriptions.

use crate::data_plane::ReplySender;
use crate::model::{Item, QueryFilter, SubscriptionId, SubscriptionLifecycle, Usn};
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Mutable part of one subscription, guarded per slot.
pub(crate) struct SlotState {
    pub(crate) lifecycle: SubscriptionLifecycle,
    /// Last USN covered by the initial snapshot. `None` until the snapshot is taken;
    /// live matches arriving before then are parked in `pending`.
    pub(crate) watermark: Option<Usn>,
    pub(crate) pending: Vec<Arc<Item>>,
}

pub(crate) struct SubscriptionSlot {
    pub(crate) id: SubscriptionId,
    pub(crate) owner: Uuid,
    pub(crate) filter: QueryFilter,
    pub(crate) outbound: ReplySender,
    state: Mutex<SlotState>,
}

impl SubscriptionSlot {
    pub(crate) fn new(
        id: SubscriptionId,
        owner: Uuid,
        filter: QueryFilter,
        outbound: ReplySender,
        lifecycle: SubscriptionLifecycle,
    ) -> Self {
        Self {
            id,
            owner,
            filter,
            outbound,
            state: Mutex::new(SlotState {
                lifecycle,
                watermark: None,
                pending: Vec::new(),
            }),
        }
    }

    /// Slot state is plain data, so a panic elsewhere never leaves it unusable.
    pub(crate) fn state(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct DirectorySnapshot {
    version: u64,
    slots: HashMap<SubscriptionId, Arc<SubscriptionSlot>>,
}

#[derive(Clone)]
pub(crate) struct SubscriptionDirectory {
    snapshot: Arc<ArcSwap<DirectorySnapshot>>,
    next_version: Arc<AtomicU64>,
}

impl SubscriptionDirectory {
    pub(crate) fn empty() -> Self {
        Self {
            snapshot: Arc::new(ArcSwap::from_pointee(DirectorySnapshot {
                version: 0,
                slots: HashMap::new(),
            })),
            next_version: Arc::new(AtomicU64::new(1)),
        }
    }

    fn update<F>(&self, mut mutate: F)
    where
        F: FnMut(&mut HashMap<SubscriptionId, Arc<SubscriptionSlot>>),
    {
        self.snapshot.rcu(|current| {
            let mut slots = current.slots.clone();
            mutate(&mut slots);
            DirectorySnapshot {
                version: self.next_version.fetch_add(1, Ordering::Relaxed),
                slots,
            }
        });
    }

    /// Publishes `slot`, returning the slot it replaced.
    pub(crate) fn insert(&self, slot: Arc<SubscriptionSlot>) -> Option<Arc<SubscriptionSlot>> {
        let mut replaced = None;
        self.update(|slots| replaced = slots.insert(slot.id, slot.clone()));
        replaced
    }

    pub(crate) fn remove(&self, id: &SubscriptionId) -> Option<Arc<SubscriptionSlot>> {
        if !self.snapshot.load().slots.contains_key(id) {
            return None;
        }
        let mut removed = None;
        self.update(|slots| removed = slots.remove(id));
        removed
    }

    pub(crate) fn get(&self, id: &SubscriptionId) -> Option<Arc<SubscriptionSlot>> {
        self.snapshot.load().slots.get(id).cloned()
    }

    /// Every slot plus the snapshot version they were read from.
    pub(crate) fn slots_with_version(&self) -> (u64, Vec<Arc<SubscriptionSlot>>) {
        let snapshot = self.snapshot.load();
        (snapshot.version, snapshot.slots.values().cloned().collect())
    }

    pub(crate) fn owned_by(&self, owner: &Uuid) -> Vec<Arc<SubscriptionSlot>> {
        self.snapshot
            .load()
            .slots
            .values()
            .filter(|slot| slot.owner == *owner)
            .cloned()
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.snapshot.load().slots.len()
    }

    #[cfg(test)]
    pub(crate) fn current_version(&self) -> u64 {
        self.snapshot.load().version
    }
}
