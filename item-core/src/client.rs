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

//! TCP client for one session against a core server.

use crate::discovery::ServiceAddress;
use crate::error::CoreError;
use crate::model::{
    Item, QueryDefinition, RequestHeader, SelectRequest, SubscriptionId, Transfer,
};
use crate::observability::events;
use crate::wire::{ProtocolVersion, WireMessage};
use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

const COMPONENT: &str = "core_client";

/// One decoded message from the server.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientReply {
    pub request_id: Option<Uuid>,
    pub transfer: Transfer,
}

///
/// [`CoreClient`] owns one TCP connection and one session on it.
///
/// Every operation is one-way: the call returns once the request is written, and the
/// outcome arrives later through [`next_reply`](Self::next_reply) as `Answer`,
/// `Notify` and `CompletionResult` messages.
pub struct CoreClient {
    session_id: Uuid,
    version: ProtocolVersion,
    writer: OwnedWriteHalf,
    replies: mpsc::UnboundedReceiver<ClientReply>,
    reader: JoinHandle<()>,
}

async fn read_replies(reader: OwnedReadHalf, replies: mpsc::UnboundedSender<ClientReply>) {
    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(
                    event = events::CONNECTION_READ_FAILED,
                    component = COMPONENT,
                    err = %err,
                    "server connection failed"
                );
                break;
            }
        };
        match WireMessage::from_line(&line).and_then(WireMessage::decode) {
            Ok((_, header, transfer)) => {
                let reply = ClientReply {
                    request_id: header.request_id,
                    transfer,
                };
                if replies.send(reply).is_err() {
                    break;
                }
            }
            Err(err) => {
                warn!(
                    event = events::REQUEST_DECODE_FAILED,
                    component = COMPONENT,
                    err = %err,
                    "dropping undecodable reply"
                );
            }
        }
    }
    debug!(
        event = events::CONNECTION_CLOSED,
        component = COMPONENT,
        "server connection closed"
    );
}

impl CoreClient {
    /// Connects with the newest protocol generation.
    pub async fn connect(address: &ServiceAddress) -> Result<Self, CoreError> {
        Self::connect_with_version(address, ProtocolVersion::V3_4).await
    }

    pub async fn connect_with_version(
        address: &ServiceAddress,
        version: ProtocolVersion,
    ) -> Result<Self, CoreError> {
        let stream = TcpStream::connect((address.host.as_str(), address.port)).await?;
        let (reader, writer) = stream.into_split();
        let (sender, replies) = mpsc::unbounded_channel();

        Ok(Self {
            session_id: Uuid::new_v4(),
            version,
            writer,
            replies,
            reader: tokio::spawn(read_replies(reader, sender)),
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Writes one request and returns its request id.
    async fn send(&mut self, transfer: &Transfer) -> Result<Uuid, CoreError> {
        let request_id = Uuid::new_v4();
        let header = RequestHeader::new(self.session_id).with_request_id(request_id);
        let mut line = WireMessage::encode(self.version, &header, transfer)?.to_line()?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        Ok(request_id)
    }

    /// Asks for the server's contract list. The reply arrives as `DiscoverReply`.
    pub async fn discover(&mut self) -> Result<Uuid, CoreError> {
        self.send(&Transfer::DiscoverService).await
    }

    pub async fn begin_session(&mut self, token: &str) -> Result<Uuid, CoreError> {
        self.send(&Transfer::BeginSession {
            token: token.to_string(),
        })
        .await
    }

    pub async fn close_session(&mut self) -> Result<Uuid, CoreError> {
        self.send(&Transfer::CloseSession).await
    }

    pub async fn select(&mut self, request: SelectRequest) -> Result<Uuid, CoreError> {
        self.send(&Transfer::Select(request)).await
    }

    /// Creates a subscription under a fresh id and returns that id.
    pub async fn create_subscription(
        &mut self,
        query: QueryDefinition,
        expiry: DateTime<Utc>,
    ) -> Result<SubscriptionId, CoreError> {
        let subscription_id = Uuid::new_v4();
        self.send(&Transfer::CreateSubscription {
            query,
            subscription_id,
            expiry,
        })
        .await?;
        Ok(subscription_id)
    }

    pub async fn extend_subscription(
        &mut self,
        subscription_id: SubscriptionId,
        expiry: DateTime<Utc>,
    ) -> Result<Uuid, CoreError> {
        self.send(&Transfer::ExtendSubscription {
            subscription_id,
            expiry,
        })
        .await
    }

    pub async fn cancel_subscription(
        &mut self,
        subscription_id: SubscriptionId,
    ) -> Result<Uuid, CoreError> {
        self.send(&Transfer::CancelSubscription { subscription_id })
            .await
    }

    /// Publishes items; the server assigns their USNs.
    pub async fn publish(&mut self, items: Vec<Item>) -> Result<Uuid, CoreError> {
        self.send(&Transfer::Notify {
            subscription_id: Uuid::nil(),
            items,
        })
        .await
    }

    /// Next message from the server; `None` once the connection is gone.
    pub async fn next_reply(&mut self) -> Option<ClientReply> {
        self.replies.recv().await
    }
}

impl Drop for CoreClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
