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

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 9400;
pub const DEFAULT_MAX_CONCURRENT_CALLS: usize = 64;
pub const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 600;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyMode {
    /// Every inbound call runs alone.
    SingleThreaded,
    #[default]
    MultiThreaded,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ServiceHostConfig {
    pub app_name: String,
    pub interface_name: String,
    /// Semicolon-separated endpoint list, see [`parse_endpoints`](crate::host::parse_endpoints).
    pub endpoints: String,
    pub default_port: u16,
    pub concurrency: ConcurrencyMode,
    /// Upper bound on concurrently dispatched calls in multi-threaded mode.
    pub max_concurrent_calls: usize,
    /// HTTP and queue sessions silent this long are closed. TCP sessions end with
    /// their connection instead.
    pub session_idle_timeout_secs: u64,
}

impl ServiceHostConfig {
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_timeout_secs.max(1))
    }
}

impl Default for ServiceHostConfig {
    fn default() -> Self {
        Self {
            app_name: "core".to_string(),
            interface_name: "transfer".to_string(),
            endpoints: format!("tcp://0.0.0.0:{DEFAULT_PORT}"),
            default_port: DEFAULT_PORT,
            concurrency: ConcurrencyMode::default(),
            max_concurrent_calls: DEFAULT_MAX_CONCURRENT_CALLS,
            session_idle_timeout_secs: DEFAULT_SESSION_IDLE_TIMEOUT_SECS,
        }
    }
}
