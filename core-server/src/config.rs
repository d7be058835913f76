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

use item_core::host::ServiceHostConfig;
use item_core::subscription::EngineConfig;
use item_core::CoreError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub(crate) server: ServiceHostConfig,
    #[serde(default)]
    pub(crate) engine: EngineSection,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields, default)]
pub struct EngineSection {
    pub(crate) write_queue_size: usize,
    pub(crate) sweep_interval_secs: u64,
    pub(crate) max_batch_items: usize,
    pub(crate) max_batch_bytes: usize,
}

impl Default for EngineSection {
    fn default() -> Self {
        let defaults = EngineConfig::default();
        Self {
            write_queue_size: defaults.write_queue_size,
            sweep_interval_secs: defaults.sweep_interval.as_secs(),
            max_batch_items: defaults.max_batch_items,
            max_batch_bytes: defaults.max_batch_bytes,
        }
    }
}

impl EngineSection {
    pub(crate) fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            write_queue_size: self.write_queue_size,
            sweep_interval: Duration::from_secs(self.sweep_interval_secs.max(1)),
            max_batch_items: self.max_batch_items,
            max_batch_bytes: self.max_batch_bytes,
        }
    }
}

impl Config {
    pub fn parse(contents: &str) -> Result<Self, CoreError> {
        json5::from_str(contents)
            .map_err(|e| CoreError::Configuration(format!("Unable to parse config file: {e}")))
    }

    pub fn load(path: &str) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Configuration(format!("Unable to read config file {path}: {e}"))
        })?;
        Self::parse(&contents)
    }
}
