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

mod support;

use integration_test_utils::{ProbeScript, ScriptedProbe};
use item_core::discovery::{
    CandidateState, ServerResolver, ServiceAddress, ServiceAddresses, TcpDiscoveryProbe,
};
use item_core::wire::CONTRACT_TRANSFER_V3_4;
use item_core::CoreError;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn fastest_round_decides_between_candidates() {
    integration_test_utils::init_logging();
    let probe = Arc::new(
        ScriptedProbe::new()
            .with("alpha", ProbeScript::reply(&[30, 4, 40], &["transfer/3.4"]))
            .with("beta", ProbeScript::reply(&[10, 10, 10], &["transfer/3.4"])),
    );
    let resolver = ServerResolver::new(probe.clone());
    let addresses = ServiceAddresses::parse("core", "alpha;beta", 9400).unwrap();

    let resolution = resolver.resolve(&addresses, &[]).await.unwrap();

    assert_eq!(resolution.address, ServiceAddress::new("alpha", 9400));
    assert_eq!(resolution.latency, Duration::from_millis(4));
    assert_eq!(
        probe.calls(),
        vec!["alpha", "alpha", "alpha", "beta", "beta", "beta"]
    );
}

#[tokio::test(start_paused = true)]
async fn candidate_missing_a_contract_is_passed_over() {
    integration_test_utils::init_logging();
    let probe = Arc::new(
        ScriptedProbe::new()
            .with("alpha", ProbeScript::reply(&[1], &["transfer/1.1"]))
            .with("beta", ProbeScript::reply(&[20], &["transfer/1.1", "transfer/3.4"])),
    );
    let resolver = ServerResolver::new(probe);
    let addresses = ServiceAddresses::parse("core", "alpha;beta", 9400).unwrap();

    let resolution = resolver
        .resolve(&addresses, &["transfer/3.4".to_string()])
        .await
        .unwrap();

    assert_eq!(resolution.address.host, "beta");
    assert!(matches!(
        &resolution.outcomes[0].1,
        CandidateState::Rejected { reason } if reason.contains("transfer/3.4")
    ));
}

#[tokio::test(start_paused = true)]
async fn all_candidates_unreachable_names_every_candidate() {
    integration_test_utils::init_logging();
    let probe = Arc::new(
        ScriptedProbe::new()
            .with("alpha", ProbeScript::Unreachable)
            .with("beta", ProbeScript::Unreachable),
    );
    let resolver = ServerResolver::new(probe.clone());
    let addresses = ServiceAddresses::parse("core", "alpha;beta:9500", 9400).unwrap();

    let err = resolver.resolve(&addresses, &[]).await.unwrap_err();

    assert!(matches!(
        &err,
        CoreError::NoServerAvailable { candidates }
            if candidates == &["alpha:9400".to_string(), "beta:9500".to_string()]
    ));
    // A failed round ends probing of that candidate.
    assert_eq!(probe.calls(), vec!["alpha", "beta"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tcp_probe_resolves_a_live_host() {
    integration_test_utils::init_logging();
    let running = support::start_host("tcp://127.0.0.1:0").await;
    let port = running.tcp_address().await.port;

    let resolver = ServerResolver::new(Arc::new(TcpDiscoveryProbe::new(Duration::from_secs(2))));
    let addresses = ServiceAddresses::new("core", vec![ServiceAddress::new("127.0.0.1", port)]);

    let resolution = resolver
        .resolve(&addresses, &[CONTRACT_TRANSFER_V3_4.to_string()])
        .await
        .unwrap();

    assert_eq!(resolution.address.port, port);
    assert!(matches!(
        resolution.outcomes[0].1,
        CandidateState::Scored { .. }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tcp_probe_skips_a_closed_port() {
    integration_test_utils::init_logging();
    let running = support::start_host("tcp://127.0.0.1:0").await;
    let live = running.tcp_address().await;

    let closed = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let resolver = ServerResolver::new(Arc::new(TcpDiscoveryProbe::default()));
    let addresses = ServiceAddresses::new(
        "core",
        vec![ServiceAddress::new("127.0.0.1", closed), live.clone()],
    );

    let resolution = resolver.resolve(&addresses, &[]).await.unwrap();

    assert_eq!(resolution.address, live);
}
