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

//! In-memory item store that assigns update sequence numbers.

use crate::error::CoreError;
use crate::model::{Item, ItemKind, QueryFilter, SelectRequest, Usn};
use crate::observability::events;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

const COMPONENT: &str = "item_store";

struct StoreState {
    last_usn: Usn,
    items: HashMap<Uuid, Arc<Item>>,
}

/// Item cache keyed by id. One USN counter per instance.
pub struct ItemStore {
    state: Mutex<StoreState>,
    written: broadcast::Sender<Arc<Item>>,
}

impl ItemStore {
    /// `write_queue_size` bounds how far a write-stream subscriber may lag.
    pub fn new(write_queue_size: usize) -> Self {
        let (written, _) = broadcast::channel(write_queue_size.max(1));
        Self {
            state: Mutex::new(StoreState {
                last_usn: 0,
                items: HashMap::new(),
            }),
            written,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, CoreError> {
        self.state
            .lock()
            .map_err(|_| CoreError::InvariantViolation("item store lock poisoned".to_string()))
    }

    /// Stores `item` (replacing any item with the same id) and returns its new USN.
    ///
    /// USN assignment and publication on the write stream happen under one lock, so
    /// stream receivers observe writes in USN order.
    pub fn write(&self, mut item: Item) -> Result<Usn, CoreError> {
        if item.kind == ItemKind::Undefined {
            return Err(CoreError::InvalidKind);
        }

        let mut state = self.lock()?;
        let usn = state.last_usn.checked_add(1).ok_or_else(|| {
            CoreError::InvariantViolation(format!("usn counter exhausted at {}", state.last_usn))
        })?;
        item.store_usn = usn;
        let item = Arc::new(item);
        state.items.insert(item.id, item.clone());
        state.last_usn = usn;
        // No receivers is not an error: nobody is subscribed yet.
        let _ = self.written.send(item.clone());
        drop(state);

        debug!(
            event = events::ITEM_WRITE,
            component = COMPONENT,
            item_id = %item.id,
            item_name = item.name.as_str(),
            usn,
            "item written"
        );
        Ok(usn)
    }

    /// Stream of every write, in USN order.
    pub fn subscribe_writes(&self) -> broadcast::Receiver<Arc<Item>> {
        self.written.subscribe()
    }

    pub fn last_usn(&self) -> Result<Usn, CoreError> {
        Ok(self.lock()?.last_usn)
    }

    pub fn len(&self) -> Result<usize, CoreError> {
        Ok(self.lock()?.items.len())
    }

    pub fn is_empty(&self) -> Result<bool, CoreError> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, id: &Uuid) -> Result<Option<Arc<Item>>, CoreError> {
        Ok(self.lock()?.items.get(id).cloned())
    }

    /// Items matching `filter`, ascending by USN.
    pub fn read(&self, filter: &QueryFilter, now: DateTime<Utc>) -> Result<Vec<Arc<Item>>, CoreError> {
        Ok(self.read_with_watermark(filter, now)?.1)
    }

    /// Matching items plus the last USN assigned when they were captured.
    ///
    /// Matching runs after the lock is released.
    pub fn read_with_watermark(
        &self,
        filter: &QueryFilter,
        now: DateTime<Utc>,
    ) -> Result<(Usn, Vec<Arc<Item>>), CoreError> {
        let (watermark, candidates) = {
            let state = self.lock()?;
            (
                state.last_usn,
                state.items.values().cloned().collect::<Vec<_>>(),
            )
        };

        let mut matched: Vec<Arc<Item>> = candidates
            .into_iter()
            .filter(|item| filter.matches(item, now))
            .collect();
        matched.sort_by_key(|item| item.store_usn);
        Ok((watermark, matched))
    }

    /// Current items with `after < usn < before`, ascending by USN.
    ///
    /// An item rewritten since carries its newer USN and is not part of the range.
    pub fn read_usn_range(&self, after: Usn, before: Usn) -> Result<Vec<Arc<Item>>, CoreError> {
        let mut found: Vec<Arc<Item>> = self
            .lock()?
            .items
            .values()
            .filter(|item| item.store_usn > after && item.store_usn < before)
            .cloned()
            .collect();
        found.sort_by_key(|item| item.store_usn);
        Ok(found)
    }

    /// Ordered, optionally paged selection.
    ///
    /// Selecting by explicit ids ignores every filter except deletion visibility.
    pub fn select(
        &self,
        request: &SelectRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<Arc<Item>>, CoreError> {
        let filter = request.query.compile()?;
        let order = request.order_by()?;

        let mut selected = match request.item_ids.as_ref() {
            Some(ids) => {
                let state = self.lock()?;
                let found: Vec<Arc<Item>> =
                    ids.iter().filter_map(|id| state.items.get(id).cloned()).collect();
                drop(state);
                found
                    .into_iter()
                    .filter(|item| filter.is_visible(item, now))
                    .collect()
            }
            None => self.read(&filter, now)?,
        };
        selected.sort_by(|a, b| order.compare(a, b));

        if request.row_count > 0 {
            selected = selected
                .into_iter()
                .skip(request.start_row as usize)
                .take(request.row_count as usize)
                .collect();
        }

        debug!(
            event = events::ITEM_SELECT,
            component = COMPONENT,
            selected = selected.len(),
            "items selected"
        );
        Ok(selected)
    }
}
