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

//! Latency-scored server selection.
//!
//! Every candidate is probed in turn. A single candidate gets one round trip, several
//! candidates get three each and keep their fastest. A candidate is rejected when any
//! round fails or its reply lacks a required contract. The fastest survivor wins; ties
//! keep the earlier candidate.

use crate::discovery::address::{ServiceAddress, ServiceAddresses};
use crate::error::CoreError;
use crate::observability::events;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const COMPONENT: &str = "discovery";

pub const SINGLE_CANDIDATE_ROUNDS: usize = 1;
pub const MULTI_CANDIDATE_ROUNDS: usize = 3;

/// One discovery round trip against one candidate.
#[async_trait]
pub trait DiscoveryProbe: Send + Sync {
    /// Returns the contract names the candidate advertises.
    async fn probe(&self, candidate: &ServiceAddress) -> Result<Vec<String>, CoreError>;
}

/// Terminal state of one candidate after probing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CandidateState {
    Scored { latency: Duration },
    Rejected { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub address: ServiceAddress,
    pub latency: Duration,
    /// Outcome per candidate, in candidate order.
    pub outcomes: Vec<(ServiceAddress, CandidateState)>,
}

/// Stateless between calls; safe to share.
#[derive(Clone)]
pub struct ServerResolver {
    probe: Arc<dyn DiscoveryProbe>,
}

impl ServerResolver {
    pub fn new(probe: Arc<dyn DiscoveryProbe>) -> Self {
        Self { probe }
    }

    async fn score(
        &self,
        candidate: &ServiceAddress,
        rounds: usize,
        required_contracts: &[String],
    ) -> CandidateState {
        let mut minimum: Option<Duration> = None;

        for round in 1..=rounds {
            debug!(
                event = events::DISCOVERY_PROBE,
                component = COMPONENT,
                candidate = %candidate,
                round,
                rounds,
                "probing candidate"
            );
            let started = Instant::now();
            let contracts = match self.probe.probe(candidate).await {
                Ok(contracts) => contracts,
                Err(err) => {
                    return CandidateState::Rejected {
                        reason: err.to_string(),
                    }
                }
            };
            let elapsed = started.elapsed();

            if let Some(missing) = required_contracts
                .iter()
                .find(|required| !contracts.contains(required))
            {
                return CandidateState::Rejected {
                    reason: format!("missing contract {missing}"),
                };
            }
            minimum = Some(minimum.map_or(elapsed, |best| best.min(elapsed)));
        }

        match minimum {
            Some(latency) => CandidateState::Scored { latency },
            None => CandidateState::Rejected {
                reason: "not probed".to_string(),
            },
        }
    }

    /// Picks the lowest-latency candidate advertising every `required_contracts` entry.
    pub async fn resolve(
        &self,
        addresses: &ServiceAddresses,
        required_contracts: &[String],
    ) -> Result<Resolution, CoreError> {
        let rounds = if addresses.len() == 1 {
            SINGLE_CANDIDATE_ROUNDS
        } else {
            MULTI_CANDIDATE_ROUNDS
        };
        let mut best: Option<(usize, Duration)> = None;
        let mut outcomes = Vec::with_capacity(addresses.len());

        for (index, candidate) in addresses.candidates.iter().enumerate() {
            let state = self.score(candidate, rounds, required_contracts).await;
            match &state {
                CandidateState::Scored { latency } => {
                    debug!(
                        event = events::DISCOVERY_CANDIDATE_SCORED,
                        component = COMPONENT,
                        candidate = %candidate,
                        latency_us = latency.as_micros() as u64,
                        "candidate scored"
                    );
                    if best.map_or(true, |(_, fastest)| *latency < fastest) {
                        best = Some((index, *latency));
                    }
                }
                CandidateState::Rejected { reason } => {
                    debug!(
                        event = events::DISCOVERY_CANDIDATE_REJECTED,
                        component = COMPONENT,
                        candidate = %candidate,
                        reason = reason.as_str(),
                        "candidate rejected"
                    );
                }
            }
            outcomes.push((candidate.clone(), state));
        }

        let Some((index, latency)) = best else {
            let candidates: Vec<String> = addresses
                .candidates
                .iter()
                .map(ToString::to_string)
                .collect();
            warn!(
                event = events::DISCOVERY_NONE_AVAILABLE,
                component = COMPONENT,
                service = addresses.name.as_str(),
                candidates = ?candidates,
                "no server available"
            );
            return Err(CoreError::NoServerAvailable { candidates });
        };

        let address = addresses.candidates[index].clone();
        info!(
            event = events::DISCOVERY_RESOLVED,
            component = COMPONENT,
            service = addresses.name.as_str(),
            address = %address,
            latency_us = latency.as_micros() as u64,
            "server resolved"
        );
        Ok(Resolution {
            address,
            latency,
            outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{CandidateState, DiscoveryProbe, ServerResolver};
    use crate::discovery::address::{ServiceAddress, ServiceAddresses};
    use crate::error::CoreError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct FixedLatencyProbe {
        latency_ms: HashMap<String, u64>,
        calls: AtomicUsize,
    }

    impl FixedLatencyProbe {
        fn new(entries: &[(&str, u64)]) -> Self {
            Self {
                latency_ms: entries
                    .iter()
                    .map(|(host, ms)| (host.to_string(), *ms))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DiscoveryProbe for FixedLatencyProbe {
        async fn probe(&self, candidate: &ServiceAddress) -> Result<Vec<String>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let ms = self
                .latency_ms
                .get(&candidate.host)
                .ok_or_else(|| CoreError::Transport("connection refused".to_string()))?;
            tokio::time::sleep(Duration::from_millis(*ms)).await;
            Ok(vec!["transfer/3.4".to_string()])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn single_candidate_is_probed_once() {
        let probe = Arc::new(FixedLatencyProbe::new(&[("alpha", 5)]));
        let resolver = ServerResolver::new(probe.clone());
        let addresses = ServiceAddresses::parse("core", "alpha", 9400).unwrap();

        let resolution = resolver.resolve(&addresses, &[]).await.unwrap();

        assert_eq!(resolution.address.host, "alpha");
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn several_candidates_get_three_rounds_and_equal_latency_keeps_first() {
        let probe = Arc::new(FixedLatencyProbe::new(&[("alpha", 10), ("beta", 10)]));
        let resolver = ServerResolver::new(probe.clone());
        let addresses = ServiceAddresses::parse("core", "alpha;beta", 9400).unwrap();

        let resolution = resolver.resolve(&addresses, &[]).await.unwrap();

        assert_eq!(resolution.address.host, "alpha");
        assert_eq!(probe.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_candidate_is_skipped() {
        let probe = Arc::new(FixedLatencyProbe::new(&[("beta", 30)]));
        let resolver = ServerResolver::new(probe);
        let addresses = ServiceAddresses::parse("core", "alpha;beta", 9400).unwrap();

        let resolution = resolver.resolve(&addresses, &[]).await.unwrap();

        assert_eq!(resolution.address.host, "beta");
        assert!(matches!(
            resolution.outcomes[0].1,
            CandidateState::Rejected { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_contract_rejects_every_candidate() {
        let probe = Arc::new(FixedLatencyProbe::new(&[("alpha", 1), ("beta", 2)]));
        let resolver = ServerResolver::new(probe);
        let addresses = ServiceAddresses::parse("core", "alpha;beta:9500", 9400).unwrap();

        let err = resolver
            .resolve(&addresses, &["session/2.2".to_string()])
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "no server available, tried: [alpha:9400, beta:9500]"
        );
    }
}
