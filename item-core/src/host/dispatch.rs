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

//! Concurrency policy of the hosted singleton, shared by every endpoint.

use crate::error::CoreError;
use crate::host::config::ConcurrencyMode;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Clone)]
pub struct CallDispatcher {
    mode: ConcurrencyMode,
    permits: Arc<Semaphore>,
}

impl CallDispatcher {
    pub fn new(mode: ConcurrencyMode, max_concurrent_calls: usize) -> Self {
        let permits = match mode {
            ConcurrencyMode::SingleThreaded => 1,
            ConcurrencyMode::MultiThreaded => max_concurrent_calls.max(1),
        };
        Self {
            mode,
            permits: Arc::new(Semaphore::new(permits)),
        }
    }

    pub fn mode(&self) -> ConcurrencyMode {
        self.mode
    }

    /// Runs `call` once a permit is free.
    pub async fn dispatch<F>(&self, call: F) -> Result<F::Output, CoreError>
    where
        F: Future,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|err| CoreError::Runtime(format!("call dispatcher closed: {err}")))?;
        Ok(call.await)
    }
}
