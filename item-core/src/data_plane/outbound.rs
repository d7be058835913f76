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

//! Per-session outbound reply worker that encodes and delivers one-way replies.

use crate::error::CoreError;
use crate::model::{RequestHeader, Transfer};
use crate::observability::{events, fields};
use crate::wire::{ProtocolVersion, WireMessage};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Level};
use uuid::Uuid;

const COMPONENT: &str = "outbound";

/// Transport-specific destination for encoded replies of one session.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn deliver(&self, message: WireMessage) -> Result<(), CoreError>;

    /// Short label for logs, e.g. the peer address or queue name.
    fn describe(&self) -> String;
}

/// One queued reply. `request_id` correlates it with the request that caused it.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundReply {
    pub request_id: Option<Uuid>,
    pub transfer: Transfer,
}

impl OutboundReply {
    pub fn new(request_id: Option<Uuid>, transfer: Transfer) -> Self {
        Self {
            request_id,
            transfer,
        }
    }
}

/// In-order, at-most-once reply channel of one session.
pub type ReplySender = mpsc::UnboundedSender<OutboundReply>;

pub(crate) struct OutboundWorker;

impl OutboundWorker {
    /// Spawns the delivery task on the current runtime.
    pub(crate) fn spawn(
        session_id: Uuid,
        version: ProtocolVersion,
        sink: Arc<dyn ReplySink>,
    ) -> (ReplySender, JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(Self::reply_dispatch_loop(
            session_id, version, sink, receiver,
        ));
        (sender, handle)
    }

    /// Encodes one reply in `version` and hands it to `sink`.
    pub(crate) async fn deliver_once(
        session_id: Uuid,
        version: ProtocolVersion,
        sink: &dyn ReplySink,
        reply: OutboundReply,
    ) -> Result<(), CoreError> {
        let header = RequestHeader {
            request_id: reply.request_id,
            ..RequestHeader::new(session_id)
        };
        let message = WireMessage::encode(version, &header, &reply.transfer)?;
        sink.deliver(message).await
    }

    pub(crate) async fn reply_dispatch_loop(
        session_id: Uuid,
        version: ProtocolVersion,
        sink: Arc<dyn ReplySink>,
        mut receiver: mpsc::UnboundedReceiver<OutboundReply>,
    ) {
        let sink_label = sink.describe();

        while let Some(reply) = receiver.recv().await {
            let operation = reply.transfer.operation();
            let request_id = tracing::enabled!(Level::DEBUG)
                .then(|| fields::format_optional_id(reply.request_id));

            match Self::deliver_once(session_id, version, sink.as_ref(), reply).await {
                Ok(()) => {
                    if let Some(request_id) = request_id.as_deref() {
                        debug!(
                            event = events::OUTBOUND_SEND_OK,
                            component = COMPONENT,
                            session_id = %session_id,
                            request_id,
                            protocol = version.as_str(),
                            operation,
                            sink = sink_label.as_str(),
                            "reply delivered"
                        );
                    }
                }
                Err(err @ CoreError::UnsupportedMessage { .. }) => {
                    warn!(
                        event = events::OUTBOUND_ENCODE_FAILED,
                        component = COMPONENT,
                        session_id = %session_id,
                        protocol = version.as_str(),
                        operation,
                        err = %err,
                        "reply cannot be expressed in session protocol"
                    );
                }
                Err(err) => {
                    warn!(
                        event = events::OUTBOUND_SEND_FAILED,
                        component = COMPONENT,
                        session_id = %session_id,
                        protocol = version.as_str(),
                        operation,
                        sink = sink_label.as_str(),
                        err = %err,
                        "reply delivery failed"
                    );
                }
            }
        }

        info!(
            event = events::OUTBOUND_CLOSED,
            component = COMPONENT,
            session_id = %session_id,
            sink = sink_label.as_str(),
            "reply channel closed; stopping outbound worker"
        );
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{OutboundReply, OutboundWorker, ReplySink};
    use crate::error::CoreError;
    use crate::model::{CompletionResult, Transfer};
    use crate::wire::{ProtocolVersion, WireMessage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    /// Sink that records every delivered message.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) delivered: Mutex<Vec<WireMessage>>,
        pub(crate) failures: AtomicUsize,
        pub(crate) fail: bool,
    }

    impl RecordingSink {
        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub(crate) fn transfers(&self) -> Vec<Transfer> {
            self.delivered
                .lock()
                .unwrap()
                .iter()
                .cloned()
                .map(|message| message.decode().unwrap().2)
                .collect()
        }
    }

    #[async_trait]
    impl ReplySink for RecordingSink {
        async fn deliver(&self, message: WireMessage) -> Result<(), CoreError> {
            if self.fail {
                self.failures.fetch_add(1, Ordering::Relaxed);
                return Err(CoreError::Transport("peer gone".to_string()));
            }
            self.delivered.lock().unwrap().push(message);
            Ok(())
        }

        fn describe(&self) -> String {
            "recording".to_string()
        }
    }

    #[tokio::test]
    async fn replies_are_delivered_in_order_in_session_protocol() {
        let sink = Arc::new(RecordingSink::default());
        let (sender, receiver) = mpsc::unbounded_channel();
        let session_id = Uuid::new_v4();

        for code in 0..3 {
            let mut completion = CompletionResult::ok();
            completion.result_code = code;
            sender
                .send(OutboundReply::new(None, Transfer::Completion(completion)))
                .unwrap();
        }
        drop(sender);

        OutboundWorker::reply_dispatch_loop(
            session_id,
            ProtocolVersion::V2_2,
            sink.clone(),
            receiver,
        )
        .await;

        let delivered = sink.delivered.lock().unwrap().clone();
        assert!(delivered
            .iter()
            .all(|message| message.version() == ProtocolVersion::V2_2
                && message.session_id() == session_id));
        let codes: Vec<i32> = sink
            .transfers()
            .into_iter()
            .map(|transfer| match transfer {
                Transfer::Completion(result) => result.result_code,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(codes, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn delivery_failure_does_not_stop_the_worker() {
        let sink = Arc::new(RecordingSink::failing());
        let (sender, receiver) = mpsc::unbounded_channel();

        sender
            .send(OutboundReply::new(None, Transfer::Completion(CompletionResult::ok())))
            .unwrap();
        sender
            .send(OutboundReply::new(None, Transfer::Completion(CompletionResult::ok())))
            .unwrap();
        drop(sender);

        OutboundWorker::reply_dispatch_loop(
            Uuid::new_v4(),
            ProtocolVersion::V3_4,
            sink.clone(),
            receiver,
        )
        .await;

        assert_eq!(sink.failures.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn reply_outside_session_protocol_is_skipped() {
        let sink = Arc::new(RecordingSink::default());
        let (sender, receiver) = mpsc::unbounded_channel();

        sender
            .send(OutboundReply::new(None, Transfer::CloseSession))
            .unwrap();
        sender
            .send(OutboundReply::new(None, Transfer::Completion(CompletionResult::ok())))
            .unwrap();
        drop(sender);

        OutboundWorker::reply_dispatch_loop(
            Uuid::new_v4(),
            ProtocolVersion::V1_1,
            sink.clone(),
            receiver,
        )
        .await;

        assert_eq!(sink.delivered.lock().unwrap().len(), 1);
    }
}
