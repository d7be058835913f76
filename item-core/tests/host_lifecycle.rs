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

use integration_test_utils::scoped_item;
use item_core::host::{HostMetadata, QueueBroker, Scheme};
use item_core::model::{RequestHeader, SelectRequest, Transfer};
use item_core::wire::{ProtocolVersion, WireMessage};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use uuid::Uuid;

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Minimal HTTP/1.1 exchange; returns the status code and the body.
async fn http_exchange(port: u16, method: &str, path: &str, body: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap();
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn open_binds_every_scheme_and_close_releases_them() {
    integration_test_utils::init_logging();
    let running = support::start_host("tcp://127.0.0.1:0;http://127.0.0.1:0;queue:9411").await;

    let endpoints = running.host.endpoints().await;
    assert_eq!(endpoints.len(), 3);
    assert!(endpoints.iter().all(|endpoint| endpoint.bound_port != 0));
    assert_eq!(running.broker.queue_names(), vec!["core.9411.transfer".to_string()]);

    let tcp_port = running.port_of(Scheme::Tcp).await;
    let addresses = running
        .host
        .resolve_reachable_addresses(Some(Scheme::Tcp))
        .await
        .unwrap();
    assert_eq!(addresses, vec![format!("tcp://127.0.0.1:{tcp_port}")]);

    running.host.close().await;
    assert!(running.host.endpoints().await.is_empty());
    assert!(running.broker.queue_names().is_empty());
    assert!(TcpStream::connect(("127.0.0.1", tcp_port)).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_binding_answers_discovery_and_publishes_metadata() {
    integration_test_utils::init_logging();
    let running = support::start_host("http://127.0.0.1:0").await;
    let port = running.port_of(Scheme::Http).await;

    let discover = WireMessage::encode(
        ProtocolVersion::V3_4,
        &RequestHeader::new(Uuid::nil()),
        &Transfer::DiscoverService,
    )
    .unwrap();
    let (status, body) = http_exchange(
        port,
        "POST",
        "/transfer",
        &serde_json::to_string(&discover).unwrap(),
    )
    .await;
    assert_eq!(status, 200);
    let (_, _, reply) = serde_json::from_str::<WireMessage>(&body)
        .unwrap()
        .decode()
        .unwrap();
    assert!(matches!(
        reply,
        Transfer::DiscoverReply { ref contracts } if contracts.contains(&"transfer/3.4".to_string())
    ));

    let (status, body) = http_exchange(port, "GET", "/metadata", "").await;
    assert_eq!(status, 200);
    let metadata: HostMetadata = serde_json::from_str(&body).unwrap();
    assert_eq!(metadata.service, "core");
    assert_eq!(metadata.endpoints, vec![format!("http://127.0.0.1:{port}/transfer")]);

    let (status, _) = http_exchange(port, "POST", "/transfer", "not json").await;
    assert_eq!(status, 400);

    running.host.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn session_replies_over_http_wait_in_the_mailbox() {
    integration_test_utils::init_logging();
    let running = support::start_host("http://127.0.0.1:0").await;
    let port = running.port_of(Scheme::Http).await;
    let session_id = Uuid::new_v4();

    let begin = WireMessage::encode(
        ProtocolVersion::V3_4,
        &RequestHeader::new(session_id).with_request_id(Uuid::new_v4()),
        &Transfer::BeginSession {
            token: "http".to_string(),
        },
    )
    .unwrap();
    let (status, _) = http_exchange(
        port,
        "POST",
        "/transfer",
        &serde_json::to_string(&begin).unwrap(),
    )
    .await;
    assert_eq!(status, 202);

    let mut drained = Vec::new();
    for _ in 0..50 {
        let (status, body) =
            http_exchange(port, "GET", &format!("/transfer/mailbox/{session_id}"), "").await;
        assert_eq!(status, 200);
        drained.extend(serde_json::from_str::<Vec<WireMessage>>(&body).unwrap());
        if !drained.is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    let (_, _, completion) = drained.remove(0).decode().unwrap();
    assert!(matches!(completion, Transfer::Completion(ref result) if result.success));
    assert_eq!(running.service.session_count(), 1);

    running.host.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_endpoint_with_a_path_serves_under_it() {
    integration_test_utils::init_logging();
    let running = support::start_host("http://127.0.0.1:0/pricing").await;
    let port = running.port_of(Scheme::Http).await;

    let discover = WireMessage::encode(
        ProtocolVersion::V3_4,
        &RequestHeader::new(Uuid::nil()),
        &Transfer::DiscoverService,
    )
    .unwrap();
    let body = serde_json::to_string(&discover).unwrap();
    let (status, _) = http_exchange(port, "POST", "/pricing", &body).await;
    assert_eq!(status, 200);
    let (status, _) = http_exchange(port, "POST", "/transfer", &body).await;
    assert_eq!(status, 404);

    let metadata = running.host.metadata();
    assert_eq!(metadata.endpoints, vec![format!("http://127.0.0.1:{port}/pricing")]);

    running.host.close().await;
}

async fn next_on_queue(broker: &dyn QueueBroker, queue: &str) -> Transfer {
    let text = tokio::time::timeout(REPLY_TIMEOUT, broker.receive(queue))
        .await
        .expect("reply should arrive in time")
        .unwrap()
        .expect("reply queue should stay open");
    let (_, _, transfer) = WireMessage::from_line(&text).unwrap().decode().unwrap();
    transfer
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn queue_requests_are_answered_on_their_reply_queue() {
    integration_test_utils::init_logging();
    let running = support::start_host("queue:9412").await;
    let request_queue = "core.9412.transfer";
    let reply_queue = "client.replies";
    running.broker.create(reply_queue).await.unwrap();
    let session_id = Uuid::new_v4();
    let header = RequestHeader::new(session_id).with_reply_address(reply_queue);

    let requests = [
        Transfer::BeginSession {
            token: "queue".to_string(),
        },
        Transfer::Notify {
            subscription_id: Uuid::nil(),
            items: vec![scoped_item("Curve.1", "A")],
        },
        Transfer::Select(SelectRequest::default()),
    ];
    for transfer in &requests {
        let message = WireMessage::encode(
            ProtocolVersion::V3_4,
            &header.clone().with_request_id(Uuid::new_v4()),
            transfer,
        )
        .unwrap();
        running
            .broker
            .send(request_queue, message.to_line().unwrap())
            .await
            .unwrap();
    }

    for _ in 0..2 {
        assert!(matches!(
            next_on_queue(running.broker.as_ref(), reply_queue).await,
            Transfer::Completion(ref result) if result.success
        ));
    }
    match next_on_queue(running.broker.as_ref(), reply_queue).await {
        Transfer::Answer { items } => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].name, "Curve.1");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        next_on_queue(running.broker.as_ref(), reply_queue).await,
        Transfer::Completion(ref result) if result.success
    ));
    assert_eq!(running.service.session_count(), 1);

    running.host.close().await;
    assert_eq!(running.service.session_count(), 0);
}
