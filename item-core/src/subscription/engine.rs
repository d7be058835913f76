/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Subscription engine: lifecycle operations, incremental matching and expiry sweep.
//!
//! Matching is incremental and in-memory. Every store write is published on the store's
//! write stream; a dedicated dispatch thread drains that stream in batches and matches
//! each batch against the current directory snapshot. Creation takes a snapshot read
//! plus the USN watermark it covers, so the snapshot and the live stream never overlap.
//! When the dispatcher falls behind the write stream, the skipped USN range is read back
//! from the store before the next batch is matched.

use crate::data_plane::{OutboundReply, ReplySender};
use crate::error::CoreError;
use crate::model::{
    Item, QueryDefinition, SubscriptionId, SubscriptionLifecycle, SubscriptionState, Transfer,
    Usn,
};
use crate::observability::{events, fields};
use crate::runtime::worker_runtime::{spawn_worker_loop, WorkerLoopHandle};
use crate::store::ItemStore;
use crate::subscription::batch::{batch_items, BatchLimits, DEFAULT_MAX_BATCH_BYTES, DEFAULT_MAX_BATCH_ITEMS};
use crate::subscription::directory::{SubscriptionDirectory, SubscriptionSlot};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

const COMPONENT: &str = "subscription_engine";
const DISPATCH_THREAD_NAME: &str = "core-dispatch";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Capacity of the store write stream before the dispatcher starts lagging.
    pub write_queue_size: usize,
    pub sweep_interval: Duration,
    pub max_batch_items: usize,
    pub max_batch_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            write_queue_size: 4096,
            sweep_interval: Duration::from_secs(30),
            max_batch_items: DEFAULT_MAX_BATCH_ITEMS,
            max_batch_bytes: DEFAULT_MAX_BATCH_BYTES,
        }
    }
}

impl EngineConfig {
    pub fn batch_limits(&self) -> BatchLimits {
        BatchLimits {
            max_items: self.max_batch_items,
            max_bytes: self.max_batch_bytes,
        }
    }
}

/// State shared between request handling and the dispatch thread.
#[derive(Clone)]
struct EngineShared {
    store: Arc<ItemStore>,
    directory: SubscriptionDirectory,
    limits: BatchLimits,
}

impl EngineShared {
    fn send_notify(&self, slot: &SubscriptionSlot, items: &[Arc<Item>]) -> usize {
        let exclude_body = slot.filter.definition().exclude_data_body;
        let mut sent = 0;

        for page in batch_items(items, self.limits, exclude_body) {
            let item_count = page.len();
            let usn_range = tracing::enabled!(tracing::Level::DEBUG)
                .then(|| fields::format_usn_range(page.iter()));
            let reply = OutboundReply::new(
                None,
                Transfer::Notify {
                    subscription_id: slot.id,
                    items: page,
                },
            );

            if slot.outbound.send(reply).is_err() {
                debug!(
                    event = events::NOTIFY_DROPPED_CLOSED,
                    component = COMPONENT,
                    subscription_id = %slot.id,
                    item_count,
                    "reply channel closed; notification dropped"
                );
                return sent;
            }
            sent += item_count;
            if let Some(usn_range) = usn_range.as_deref() {
                debug!(
                    event = events::NOTIFY_BATCH_SENT,
                    component = COMPONENT,
                    subscription_id = %slot.id,
                    item_count,
                    usn_range,
                    "notification batch queued"
                );
            }
        }
        sent
    }

    fn retire_expired(&self, slot: &SubscriptionSlot) {
        self.directory.remove(&slot.id);
        debug!(
            event = events::SUBSCRIPTION_EXPIRED,
            component = COMPONENT,
            subscription_id = %slot.id,
            session_id = %slot.owner,
            "subscription expired"
        );
    }

    /// Matches one batch of writes against every subscription.
    fn dispatch_batch(&self, batch: &[Arc<Item>], now: DateTime<Utc>) {
        // Loaded after the batch was drained, so any slot registered before these
        // writes were assigned is visible here.
        let (_, slots) = self.directory.slots_with_version();

        for slot in slots {
            let matched: Vec<Arc<Item>> = batch
                .iter()
                .filter(|item| slot.filter.matches(item, now))
                .cloned()
                .collect();
            if matched.is_empty() {
                continue;
            }

            let mut state = slot.state();
            if state.lifecycle.state().is_terminal() {
                continue;
            }
            if state.lifecycle.expire(now) {
                drop(state);
                self.retire_expired(&slot);
                continue;
            }
            match state.watermark {
                None => state.pending.extend(matched),
                Some(watermark) => {
                    let fresh: Vec<Arc<Item>> = matched
                        .into_iter()
                        .filter(|item| item.store_usn > watermark)
                        .collect();
                    self.send_notify(&slot, &fresh);
                }
            }
        }
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> Vec<SubscriptionId> {
        let (_, slots) = self.directory.slots_with_version();
        let mut expired = Vec::new();

        for slot in slots {
            let newly_expired = slot.state().lifecycle.expire(now);
            if newly_expired {
                self.retire_expired(&slot);
                expired.push(slot.id);
            }
        }
        expired
    }

    /// Dispatches `batch`, first filling any USN gap left by a lagged write stream.
    ///
    /// Returns the last USN dispatched.
    fn dispatch_writes(
        &self,
        last_dispatched: Usn,
        batch: Vec<Arc<Item>>,
        now: DateTime<Utc>,
    ) -> Usn {
        let Some(first) = batch.first().map(|item| item.store_usn) else {
            return last_dispatched;
        };
        let last = batch.last().map_or(first, |item| item.store_usn);
        if first <= last_dispatched.saturating_add(1) {
            self.dispatch_batch(&batch, now);
            return last.max(last_dispatched);
        }

        let missed = match self.store.read_usn_range(last_dispatched, first) {
            Ok(missed) => missed,
            Err(err) => {
                warn!(
                    event = events::WRITE_STREAM_CATCH_UP_FAILED,
                    component = COMPONENT,
                    after_usn = last_dispatched,
                    before_usn = first,
                    err = %err,
                    "skipped writes could not be read back"
                );
                Vec::new()
            }
        };
        debug!(
            event = events::WRITE_STREAM_CATCH_UP,
            component = COMPONENT,
            after_usn = last_dispatched,
            before_usn = first,
            item_count = missed.len(),
            "skipped writes read back from the store"
        );
        let mut full = missed;
        full.extend(batch);
        self.dispatch_batch(&full, now);
        last
    }

    async fn dispatch_loop(
        self,
        mut last_dispatched: Usn,
        mut writes: broadcast::Receiver<Arc<Item>>,
        mut shutdown: watch::Receiver<bool>,
        sweep_interval: Duration,
    ) {
        let mut sweep = tokio::time::interval(sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(
                            event = events::ENGINE_SHUTDOWN,
                            component = COMPONENT,
                            reason = fields::REASON_SHUTDOWN,
                            "stopping dispatch loop"
                        );
                        break;
                    }
                }
                _ = sweep.tick() => {
                    self.sweep_expired(Utc::now());
                }
                received = writes.recv() => match received {
                    Ok(item) => {
                        let mut batch = vec![item];
                        while batch.len() < self.limits.max_items.max(1) {
                            match writes.try_recv() {
                                Ok(item) => batch.push(item),
                                // The batch stays contiguous; the gap is read back next round.
                                Err(TryRecvError::Lagged(skipped)) => {
                                    warn!(
                                        event = events::WRITE_STREAM_LAGGED,
                                        component = COMPONENT,
                                        skipped,
                                        "write stream lagged; catching up from the store"
                                    );
                                    break;
                                }
                                Err(_) => break,
                            }
                        }
                        last_dispatched = self.dispatch_writes(last_dispatched, batch, Utc::now());
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            event = events::WRITE_STREAM_LAGGED,
                            component = COMPONENT,
                            skipped,
                            "write stream lagged; catching up from the store"
                        );
                    }
                    Err(RecvError::Closed) => {
                        info!(
                            event = events::WRITE_STREAM_CLOSED,
                            component = COMPONENT,
                            reason = fields::REASON_BROADCAST_CLOSED,
                            "write stream closed; stopping dispatch loop"
                        );
                        break;
                    }
                }
            }
        }
    }
}

/// Owns every subscription of one store.
pub struct SubscriptionEngine {
    store: Arc<ItemStore>,
    shared: EngineShared,
    shutdown: watch::Sender<bool>,
    dispatch_handle: Mutex<Option<WorkerLoopHandle>>,
}

impl SubscriptionEngine {
    /// Starts the dispatch thread over `store`'s write stream.
    pub fn new(store: Arc<ItemStore>, config: &EngineConfig) -> Result<Self, CoreError> {
        let shared = EngineShared {
            store: store.clone(),
            directory: SubscriptionDirectory::empty(),
            limits: config.batch_limits(),
        };
        let (shutdown, shutdown_receiver) = watch::channel(false);
        let writes = store.subscribe_writes();
        // Read after subscribing: anything later is either on the stream or read back.
        let dispatched_from = store.last_usn()?;
        let loop_shared = shared.clone();
        let sweep_interval = config.sweep_interval.max(Duration::from_millis(1));

        let dispatch_handle = spawn_worker_loop(DISPATCH_THREAD_NAME.to_string(), move || {
            loop_shared.dispatch_loop(dispatched_from, writes, shutdown_receiver, sweep_interval)
        })?;

        Ok(Self {
            store,
            shared,
            shutdown,
            dispatch_handle: Mutex::new(Some(dispatch_handle)),
        })
    }

    /// Registers a subscription and queues its initial snapshot on `outbound`.
    pub fn create(
        &self,
        owner: Uuid,
        outbound: ReplySender,
        query: &QueryDefinition,
        subscription_id: SubscriptionId,
        expiry: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let filter = query.compile()?;
        let slot = Arc::new(SubscriptionSlot::new(
            subscription_id,
            owner,
            filter,
            outbound,
            SubscriptionLifecycle::new(expiry),
        ));

        if let Some(replaced) = self.shared.directory.insert(slot.clone()) {
            replaced.state().lifecycle.cancel();
            debug!(
                event = events::SUBSCRIPTION_REPLACED,
                component = COMPONENT,
                subscription_id = %subscription_id,
                "existing subscription replaced"
            );
        }

        let now = Utc::now();
        let definition = slot.filter.definition();
        let captured = if definition.exclude_existing {
            self.store.last_usn().map(|usn| (usn, Vec::new()))
        } else {
            self.store.read_with_watermark(&slot.filter, now)
        };
        let (watermark, snapshot) = match captured {
            Ok(captured) => captured,
            Err(err) => {
                self.shared.directory.remove(&subscription_id);
                return Err(err);
            }
        };

        let mut state = slot.state();
        state.watermark = Some(watermark);
        let pending: Vec<Arc<Item>> = std::mem::take(&mut state.pending)
            .into_iter()
            .filter(|item| item.store_usn > watermark)
            .collect();
        // Only fails for terminal states, which a fresh slot cannot be in unless a
        // concurrent cancel won; then nothing below is delivered.
        let _ = state.lifecycle.activate();
        let deliverable = state.lifecycle.is_deliverable(now);

        let snapshot_sent = if definition.wait_for_existing {
            let sent = if deliverable {
                self.shared.send_notify(&slot, &snapshot)
            } else {
                0
            };
            if deliverable {
                self.shared.send_notify(&slot, &pending);
            }
            drop(state);
            sent
        } else {
            if deliverable {
                self.shared.send_notify(&slot, &pending);
            }
            drop(state);
            if deliverable {
                self.shared.send_notify(&slot, &snapshot)
            } else {
                0
            }
        };

        debug!(
            event = events::SUBSCRIPTION_SNAPSHOT_SENT,
            component = COMPONENT,
            subscription_id = %subscription_id,
            watermark,
            item_count = snapshot_sent,
            "initial snapshot queued"
        );
        debug!(
            event = events::SUBSCRIPTION_CREATED,
            component = COMPONENT,
            subscription_id = %subscription_id,
            session_id = %owner,
            expiry = %expiry,
            "subscription created"
        );
        Ok(())
    }

    /// Pushes the expiry forward. Unknown, cancelled or expired ids are rejected.
    pub fn extend(
        &self,
        subscription_id: SubscriptionId,
        expiry: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let slot = self
            .shared
            .directory
            .get(&subscription_id)
            .ok_or(CoreError::UnknownSubscription(subscription_id))?;

        let result = slot.state().lifecycle.extend(expiry, Utc::now());
        match result {
            Ok(()) => {
                debug!(
                    event = events::SUBSCRIPTION_EXTENDED,
                    component = COMPONENT,
                    subscription_id = %subscription_id,
                    expiry = %expiry,
                    "subscription extended"
                );
                Ok(())
            }
            Err(rejected) => {
                if rejected.from == SubscriptionState::Expired {
                    self.shared.retire_expired(&slot);
                }
                debug!(
                    event = events::SUBSCRIPTION_EXTEND_REJECTED,
                    component = COMPONENT,
                    subscription_id = %subscription_id,
                    state = rejected.from.as_str(),
                    "extend rejected"
                );
                Err(CoreError::UnknownSubscription(subscription_id))
            }
        }
    }

    /// Stops future matches immediately. Cancelling twice or an unknown id is a no-op.
    ///
    /// Returns whether a live subscription was cancelled.
    pub fn cancel(&self, subscription_id: SubscriptionId) -> bool {
        let Some(slot) = self.shared.directory.remove(&subscription_id) else {
            return false;
        };
        let cancelled = slot.state().lifecycle.cancel();
        if cancelled {
            debug!(
                event = events::SUBSCRIPTION_CANCELLED,
                component = COMPONENT,
                subscription_id = %subscription_id,
                session_id = %slot.owner,
                "subscription cancelled"
            );
        }
        cancelled
    }

    /// Cancels every subscription created by `owner`.
    pub fn cancel_owned_by(&self, owner: &Uuid) -> usize {
        self.shared
            .directory
            .owned_by(owner)
            .into_iter()
            .filter(|slot| self.cancel(slot.id))
            .count()
    }

    /// Expires every subscription whose expiry is at or before `now`.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Vec<SubscriptionId> {
        self.shared.sweep_expired(now)
    }

    /// Lifecycle state of a subscription still in the directory.
    pub fn state_of(&self, subscription_id: &SubscriptionId) -> Option<SubscriptionState> {
        self.shared
            .directory
            .get(subscription_id)
            .map(|slot| slot.state().lifecycle.state())
    }

    pub fn active_count(&self) -> usize {
        self.shared.directory.len()
    }

    /// Stops the dispatch thread and waits for it.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        let handle = self
            .dispatch_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut handle) = handle {
            debug!(
                event = events::ENGINE_SHUTDOWN,
                component = COMPONENT,
                worker_thread = handle.worker_thread(),
                "joining dispatch thread"
            );
            handle.join();
        }
    }
}

impl Drop for SubscriptionEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineConfig, SubscriptionEngine};
    use crate::data_plane::OutboundReply;
    use crate::error::CoreError;
    use crate::model::{Item, ItemKind, QueryDefinition, SubscriptionState, Transfer};
    use crate::store::ItemStore;
    use chrono::{Duration, Utc};
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tokio::time::timeout;
    use uuid::Uuid;

    const WAIT: std::time::Duration = std::time::Duration::from_secs(5);

    fn scoped(name: &str, scope: &str) -> Item {
        let mut item = Item::new(ItemKind::Object, name);
        item.app_scope = scope.to_string();
        item
    }

    fn engine(store: &Arc<ItemStore>) -> SubscriptionEngine {
        SubscriptionEngine::new(store.clone(), &EngineConfig::default()).unwrap()
    }

    async fn next_notified_usns(receiver: &mut mpsc::UnboundedReceiver<OutboundReply>) -> Vec<u64> {
        let reply = timeout(WAIT, receiver.recv())
            .await
            .expect("notification should arrive")
            .expect("channel open");
        match reply.transfer {
            Transfer::Notify { items, .. } => items.iter().map(|item| item.store_usn).collect(),
            other => panic!("expected notify, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn snapshot_and_live_stream_respect_scope_and_minimum_usn() {
        let store = Arc::new(ItemStore::new(64));
        for (name, scope) in [("one", "A"), ("two", "B"), ("three", "A"), ("four", "B")] {
            store.write(scoped(name, scope)).unwrap();
        }
        let engine = engine(&store);
        let (outbound, mut receiver) = mpsc::unbounded_channel();

        engine
            .create(
                Uuid::new_v4(),
                outbound,
                &QueryDefinition {
                    app_scopes: vec!["A".to_string()],
                    minimum_usn: 3,
                    ..Default::default()
                },
                Uuid::new_v4(),
                Utc::now() + Duration::minutes(5),
            )
            .unwrap();
        store.write(scoped("five", "A")).unwrap();

        let mut received = next_notified_usns(&mut receiver).await;
        received.extend(next_notified_usns(&mut receiver).await);
        assert_eq!(received, vec![3, 5]);
    }

    #[tokio::test]
    async fn exclude_existing_skips_snapshot() {
        let store = Arc::new(ItemStore::new(64));
        store.write(scoped("old", "A")).unwrap();
        let engine = engine(&store);
        let (outbound, mut receiver) = mpsc::unbounded_channel();

        engine
            .create(
                Uuid::new_v4(),
                outbound,
                &QueryDefinition {
                    exclude_existing: true,
                    ..Default::default()
                },
                Uuid::new_v4(),
                Utc::now() + Duration::minutes(5),
            )
            .unwrap();
        store.write(scoped("new", "A")).unwrap();

        assert_eq!(next_notified_usns(&mut receiver).await, vec![2]);
    }

    #[tokio::test]
    async fn cancel_stops_matches_and_is_idempotent() {
        let store = Arc::new(ItemStore::new(64));
        let engine = engine(&store);
        let (outbound, mut receiver) = mpsc::unbounded_channel();
        let subscription_id = Uuid::new_v4();

        engine
            .create(
                Uuid::new_v4(),
                outbound,
                &QueryDefinition::default(),
                subscription_id,
                Utc::now() + Duration::minutes(5),
            )
            .unwrap();
        store.write(scoped("before", "A")).unwrap();
        assert_eq!(next_notified_usns(&mut receiver).await, vec![1]);

        assert!(engine.cancel(subscription_id));
        assert!(!engine.cancel(subscription_id));
        assert!(!engine.cancel(Uuid::new_v4()));

        store.write(scoped("after", "A")).unwrap();
        engine.shutdown();
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn extend_rejects_unknown_and_expired() {
        let store = Arc::new(ItemStore::new(64));
        let engine = engine(&store);
        let (outbound, _receiver) = mpsc::unbounded_channel();
        let subscription_id = Uuid::new_v4();

        assert!(matches!(
            engine.extend(Uuid::new_v4(), Utc::now()),
            Err(CoreError::UnknownSubscription(_))
        ));

        engine
            .create(
                Uuid::new_v4(),
                outbound,
                &QueryDefinition::default(),
                subscription_id,
                Utc::now() + Duration::milliseconds(50),
            )
            .unwrap();
        engine
            .extend(subscription_id, Utc::now() + Duration::milliseconds(100))
            .unwrap();
        assert_eq!(
            engine.state_of(&subscription_id),
            Some(SubscriptionState::Extended)
        );

        let expired = engine.sweep_expired(Utc::now() + Duration::seconds(1));
        assert_eq!(expired, vec![subscription_id]);
        assert!(matches!(
            engine.extend(subscription_id, Utc::now() + Duration::minutes(1)),
            Err(CoreError::UnknownSubscription(id)) if id == subscription_id
        ));
    }

    #[tokio::test]
    async fn expired_subscription_receives_nothing() {
        let store = Arc::new(ItemStore::new(64));
        let engine = engine(&store);
        let (outbound, mut receiver) = mpsc::unbounded_channel();

        engine
            .create(
                Uuid::new_v4(),
                outbound,
                &QueryDefinition::default(),
                Uuid::new_v4(),
                Utc::now() - Duration::seconds(1),
            )
            .unwrap();
        store.write(scoped("late", "A")).unwrap();
        engine.shutdown();

        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn cancel_owned_by_only_touches_that_session() {
        let store = Arc::new(ItemStore::new(64));
        let engine = engine(&store);
        let owner = Uuid::new_v4();
        let expiry = Utc::now() + Duration::minutes(5);

        for session in [owner, owner, Uuid::new_v4()] {
            let (outbound, _) = mpsc::unbounded_channel();
            engine
                .create(session, outbound, &QueryDefinition::default(), Uuid::new_v4(), expiry)
                .unwrap();
        }

        assert_eq!(engine.cancel_owned_by(&owner), 2);
        assert_eq!(engine.active_count(), 1);
    }

    async fn collect_usns(
        receiver: &mut mpsc::UnboundedReceiver<OutboundReply>,
        expected: usize,
    ) -> Vec<u64> {
        let mut usns = Vec::new();
        while usns.len() < expected {
            usns.extend(next_notified_usns(receiver).await);
        }
        usns
    }

    #[tokio::test]
    async fn lagging_write_stream_is_caught_up_from_the_store() {
        let store = Arc::new(ItemStore::new(4));
        let engine = engine(&store);
        let (outbound, mut receiver) = mpsc::unbounded_channel();
        engine
            .create(
                Uuid::new_v4(),
                outbound,
                &QueryDefinition::default(),
                Uuid::new_v4(),
                Utc::now() + Duration::minutes(5),
            )
            .unwrap();

        for n in 0..500 {
            store.write(scoped(&format!("burst.{n}"), "A")).unwrap();
        }

        let usns = collect_usns(&mut receiver, 500).await;
        assert_eq!(usns, (1..=500).collect::<Vec<u64>>());
        engine.shutdown();
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn non_waiting_subscription_gets_every_write_exactly_once() {
        let store = Arc::new(ItemStore::new(1024));
        for n in 0..100 {
            store.write(scoped(&format!("existing.{n}"), "A")).unwrap();
        }
        let engine = engine(&store);
        let (outbound, mut receiver) = mpsc::unbounded_channel();

        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for n in 0..200 {
                    store.write(scoped(&format!("live.{n}"), "A")).unwrap();
                }
            })
        };
        engine
            .create(
                Uuid::new_v4(),
                outbound,
                &QueryDefinition {
                    wait_for_existing: false,
                    ..Default::default()
                },
                Uuid::new_v4(),
                Utc::now() + Duration::minutes(5),
            )
            .unwrap();
        writer.join().unwrap();

        let mut usns = collect_usns(&mut receiver, 300).await;
        engine.shutdown();
        assert!(receiver.try_recv().is_err());
        usns.sort_unstable();
        assert_eq!(usns, (1..=300).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn invalid_query_is_rejected_before_registration() {
        let store = Arc::new(ItemStore::new(64));
        let engine = engine(&store);
        let (outbound, _) = mpsc::unbounded_channel();

        let result = engine.create(
            Uuid::new_v4(),
            outbound,
            &QueryDefinition {
                query_expr: Some("Name =".to_string()),
                ..Default::default()
            },
            Uuid::new_v4(),
            Utc::now() + Duration::minutes(1),
        );

        assert!(matches!(result, Err(CoreError::InvalidQuery(_))));
        assert_eq!(engine.active_count(), 0);
    }
}
