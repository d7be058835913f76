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

//! Durable queue seam used by queue endpoints.

use crate::error::CoreError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

/// Broker holding named durable queues of encoded messages.
#[async_trait]
pub trait QueueBroker: Send + Sync {
    async fn exists(&self, name: &str) -> Result<bool, CoreError>;

    async fn create(&self, name: &str) -> Result<(), CoreError>;

    async fn delete(&self, name: &str) -> Result<(), CoreError>;

    async fn send(&self, name: &str, message: String) -> Result<(), CoreError>;

    /// Waits for the next message. `None` means the queue was deleted.
    async fn receive(&self, name: &str) -> Result<Option<String>, CoreError>;
}

#[derive(Default)]
struct MemoryQueue {
    messages: Mutex<VecDeque<String>>,
    arrived: Notify,
    deleted: AtomicBool,
}

impl MemoryQueue {
    fn pop(&self) -> Option<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

/// Process-local broker. Queues live as long as the broker.
#[derive(Default)]
pub struct InMemoryQueueBroker {
    queues: Mutex<HashMap<String, Arc<MemoryQueue>>>,
}

impl InMemoryQueueBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, name: &str) -> Result<Arc<MemoryQueue>, CoreError> {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::Queue(format!("queue '{name}' does not exist")))
    }

    pub fn queue_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl QueueBroker for InMemoryQueueBroker {
    async fn exists(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name))
    }

    async fn create(&self, name: &str) -> Result<(), CoreError> {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), CoreError> {
        let removed = self
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .ok_or_else(|| CoreError::Queue(format!("queue '{name}' does not exist")))?;
        removed.deleted.store(true, Ordering::SeqCst);
        removed.arrived.notify_waiters();
        Ok(())
    }

    async fn send(&self, name: &str, message: String) -> Result<(), CoreError> {
        let queue = self.queue(name)?;
        queue
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(message);
        queue.arrived.notify_one();
        Ok(())
    }

    async fn receive(&self, name: &str) -> Result<Option<String>, CoreError> {
        let queue = self.queue(name)?;
        loop {
            let arrived = queue.arrived.notified();
            if let Some(message) = queue.pop() {
                return Ok(Some(message));
            }
            if queue.deleted.load(Ordering::SeqCst) {
                return Ok(None);
            }
            arrived.await;
        }
    }
}
