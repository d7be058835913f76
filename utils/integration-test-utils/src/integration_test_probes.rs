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

use async_trait::async_trait;
use item_core::discovery::{DiscoveryProbe, ServiceAddress};
use item_core::CoreError;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Scripted behaviour of one candidate host.
#[derive(Clone, Debug)]
pub enum ProbeScript {
    /// Successive round trips take these latencies (the last one repeats).
    Reply {
        latencies: Vec<Duration>,
        contracts: Vec<String>,
    },
    Unreachable,
}

impl ProbeScript {
    pub fn reply(latency_ms: &[u64], contracts: &[&str]) -> Self {
        ProbeScript::Reply {
            latencies: latency_ms.iter().copied().map(Duration::from_millis).collect(),
            contracts: contracts.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Probe that sleeps for the scripted latency, meant for paused-clock tests.
#[derive(Default)]
pub struct ScriptedProbe {
    scripts: HashMap<String, ProbeScript>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, host: &str, script: ProbeScript) -> Self {
        self.scripts.insert(host.to_string(), script);
        self
    }

    /// Hosts probed so far, one entry per round trip.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiscoveryProbe for ScriptedProbe {
    async fn probe(&self, candidate: &ServiceAddress) -> Result<Vec<String>, CoreError> {
        let round = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(candidate.host.clone());
            calls.iter().filter(|host| **host == candidate.host).count() - 1
        };

        match self.scripts.get(&candidate.host) {
            Some(ProbeScript::Reply {
                latencies,
                contracts,
            }) => {
                let latency = latencies
                    .get(round)
                    .or(latencies.last())
                    .copied()
                    .unwrap_or_default();
                tokio::time::sleep(latency).await;
                Ok(contracts.clone())
            }
            Some(ProbeScript::Unreachable) | None => Err(CoreError::Transport(format!(
                "connection to {candidate} refused"
            ))),
        }
    }
}
