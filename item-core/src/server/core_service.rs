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

//! The singleton item service: selects, subscriptions, publishing and sessions.

use crate::data_plane::outbound::OutboundWorker;
use crate::data_plane::{OutboundReply, ReplySender, ReplySink};
use crate::error::CoreError;
use crate::host::HostedService;
use crate::model::{CompletionResult, Item, ItemKind, RequestHeader, SelectRequest, Transfer};
use crate::observability::{events, fields};
use crate::server::session::SessionTable;
use crate::store::ItemStore;
use crate::subscription::{batch_items, BatchLimits, EngineConfig, SubscriptionEngine};
use crate::wire::{ProtocolVersion, WireMessage};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn, Level};
use uuid::Uuid;

const COMPONENT: &str = "core_service";

pub struct CoreService {
    name: String,
    store: Arc<ItemStore>,
    engine: SubscriptionEngine,
    sessions: SessionTable,
    limits: BatchLimits,
}

impl CoreService {
    /// Builds the service over `store` and starts its subscription engine.
    pub fn new(
        name: impl Into<String>,
        store: Arc<ItemStore>,
        config: &EngineConfig,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            name: name.into(),
            engine: SubscriptionEngine::new(store.clone(), config)?,
            store,
            sessions: SessionTable::default(),
            limits: config.batch_limits(),
        })
    }

    pub fn store(&self) -> &Arc<ItemStore> {
        &self.store
    }

    pub fn engine(&self) -> &SubscriptionEngine {
        &self.engine
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn send(outbound: &ReplySender, request_id: Option<Uuid>, transfer: Transfer) {
        if outbound.send(OutboundReply::new(request_id, transfer)).is_err() {
            debug!(
                event = events::OUTBOUND_CLOSED,
                component = COMPONENT,
                request_id = fields::format_optional_id(request_id).as_str(),
                "session reply channel closed"
            );
        }
    }

    fn complete<T>(outbound: &ReplySender, request_id: Option<Uuid>, result: &Result<T, CoreError>) {
        Self::send(
            outbound,
            request_id,
            Transfer::Completion(CompletionResult::from_result(result)),
        );
    }

    /// Reports a failure straight to `sink` when no session channel is usable.
    async fn fail_direct(
        session_id: Uuid,
        version: ProtocolVersion,
        request_id: Option<Uuid>,
        sink: &dyn ReplySink,
        err: &CoreError,
    ) {
        let reply = OutboundReply::new(request_id, Transfer::Completion(CompletionResult::failed(err)));
        if let Err(send_err) = OutboundWorker::deliver_once(session_id, version, sink, reply).await {
            warn!(
                event = events::OUTBOUND_SEND_FAILED,
                component = COMPONENT,
                session_id = %session_id,
                protocol = version.as_str(),
                sink = sink.describe().as_str(),
                err = %send_err,
                "failure completion not delivered"
            );
        }
    }

    fn select(&self, outbound: &ReplySender, request_id: Option<Uuid>, request: &SelectRequest) {
        let result = self.store.select(request, Utc::now()).map(|items| {
            let pages = batch_items(&items, self.limits, request.query.exclude_data_body);
            if pages.is_empty() {
                Self::send(outbound, request_id, Transfer::Answer { items: Vec::new() });
            }
            for items in pages {
                Self::send(outbound, request_id, Transfer::Answer { items });
            }
        });
        Self::complete(outbound, request_id, &result);
    }

    /// Writes `items` in order. A batch with any undefined kind is rejected whole.
    fn publish(&self, items: Vec<Item>) -> Result<(), CoreError> {
        if let Some(invalid) = items.iter().find(|item| item.kind == ItemKind::Undefined) {
            warn!(
                event = events::ITEM_PUBLISH_FAILED,
                component = COMPONENT,
                item_name = invalid.name.as_str(),
                items = items.len(),
                "published batch rejected"
            );
            return Err(CoreError::InvalidKind);
        }
        for item in items {
            let name = item.name.clone();
            if let Err(err) = self.store.write(item) {
                warn!(
                    event = events::ITEM_PUBLISH_FAILED,
                    component = COMPONENT,
                    item_name = name.as_str(),
                    err = %err,
                    "published item rejected"
                );
                return Err(err);
            }
        }
        Ok(())
    }

    fn close_session(&self, session_id: Uuid, reason: &str) -> Option<ReplySender> {
        let outbound = self.sessions.remove(&session_id)?;
        self.end_session(session_id, reason);
        Some(outbound)
    }

    fn end_session(&self, session_id: Uuid, reason: &str) {
        let cancelled = self.engine.cancel_owned_by(&session_id);
        info!(
            event = events::SESSION_CLOSE,
            component = COMPONENT,
            session_id = %session_id,
            cancelled_subscriptions = cancelled,
            reason,
            "session closed"
        );
    }

    async fn handle(
        &self,
        version: ProtocolVersion,
        header: RequestHeader,
        transfer: Transfer,
        sink: Arc<dyn ReplySink>,
    ) -> Option<WireMessage> {
        let session_id = header.session_id;
        let request_id = header.request_id;

        match transfer {
            Transfer::DiscoverService => {
                let reply = Transfer::DiscoverReply {
                    contracts: self.contract_names(),
                };
                match WireMessage::encode(version, &header, &reply) {
                    Ok(message) => return Some(message),
                    Err(err) => {
                        warn!(
                            event = events::OUTBOUND_ENCODE_FAILED,
                            component = COMPONENT,
                            protocol = version.as_str(),
                            err = %err,
                            "discovery reply cannot be encoded"
                        );
                    }
                }
            }
            Transfer::BeginSession { .. } => {
                let outbound = self.sessions.begin(session_id, version, sink);
                info!(
                    event = events::SESSION_BEGIN,
                    component = COMPONENT,
                    session_id = %session_id,
                    protocol = version.as_str(),
                    "session started"
                );
                Self::complete(&outbound, request_id, &Ok::<(), CoreError>(()));
            }
            Transfer::CloseSession => match self.close_session(session_id, "close_session") {
                Some(outbound) => Self::complete(&outbound, request_id, &Ok::<(), CoreError>(())),
                None => {
                    let err = CoreError::UnknownSession(session_id);
                    Self::fail_direct(session_id, version, request_id, sink.as_ref(), &err).await;
                }
            },
            Transfer::Completion(result) => {
                debug!(
                    event = events::CLIENT_COMPLETION,
                    component = COMPONENT,
                    session_id = %session_id,
                    success = result.success,
                    result_code = result.result_code,
                    "client acknowledgement"
                );
            }
            transfer => {
                let outbound = match self.sessions.resolve(session_id, version, &sink) {
                    Ok(outbound) => outbound,
                    Err(err) => {
                        debug!(
                            event = events::SESSION_UNKNOWN,
                            component = COMPONENT,
                            session_id = %session_id,
                            operation = transfer.operation(),
                            "request for unknown session"
                        );
                        Self::fail_direct(session_id, version, request_id, sink.as_ref(), &err)
                            .await;
                        return None;
                    }
                };
                self.handle_transfer(&outbound, session_id, request_id, version, transfer);
            }
        }
        None
    }

    fn handle_transfer(
        &self,
        outbound: &ReplySender,
        session_id: Uuid,
        request_id: Option<Uuid>,
        version: ProtocolVersion,
        transfer: Transfer,
    ) {
        match transfer {
            Transfer::Select(request) => self.select(outbound, request_id, &request),
            Transfer::CreateSubscription {
                query,
                subscription_id,
                expiry,
            } => {
                let result =
                    self.engine
                        .create(session_id, outbound.clone(), &query, subscription_id, expiry);
                Self::complete(outbound, request_id, &result);
            }
            Transfer::ExtendSubscription {
                subscription_id,
                expiry,
            } => {
                let result = self.engine.extend(subscription_id, expiry);
                Self::complete(outbound, request_id, &result);
            }
            Transfer::CancelSubscription { subscription_id } => {
                self.engine.cancel(subscription_id);
                Self::complete(outbound, request_id, &Ok::<(), CoreError>(()));
            }
            Transfer::Notify { items, .. } => {
                let result = self.publish(items);
                Self::complete(outbound, request_id, &result);
            }
            other => {
                let err = CoreError::UnsupportedMessage {
                    operation: other.operation().to_string(),
                    protocol: version.as_str().to_string(),
                };
                debug!(
                    event = events::REQUEST_UNSUPPORTED,
                    component = COMPONENT,
                    session_id = %session_id,
                    operation = other.operation(),
                    "operation is server-to-client only"
                );
                Self::complete(outbound, request_id, &Err::<(), CoreError>(err));
            }
        }
    }
}

#[async_trait]
impl HostedService for CoreService {
    fn service_name(&self) -> String {
        self.name.clone()
    }

    fn contract_names(&self) -> Vec<String> {
        let mut contracts: Vec<String> = ProtocolVersion::ALL
            .iter()
            .flat_map(ProtocolVersion::contract_names)
            .collect();
        contracts.sort();
        contracts.dedup();
        contracts
    }

    async fn receive(&self, message: WireMessage, sink: Arc<dyn ReplySink>) -> Option<WireMessage> {
        let version = message.version();
        let session_id = message.session_id();

        let (_, header, transfer) = match message.decode() {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(
                    event = events::REQUEST_DECODE_FAILED,
                    component = COMPONENT,
                    session_id = %session_id,
                    protocol = version.as_str(),
                    err = %err,
                    "request rejected"
                );
                Self::fail_direct(session_id, version, None, sink.as_ref(), &err).await;
                return None;
            }
        };

        if tracing::enabled!(Level::DEBUG) {
            debug!(
                event = events::REQUEST_RECEIVED,
                component = COMPONENT,
                session_id = %session_id,
                request_id = fields::format_optional_id(header.request_id).as_str(),
                protocol = version.as_str(),
                operation = transfer.operation(),
                "request received"
            );
        }
        self.handle(version, header, transfer, sink).await
    }

    async fn disconnected(&self, session_id: Uuid, sink: &Arc<dyn ReplySink>) {
        if self.sessions.remove_owned(&session_id, sink).is_some() {
            self.end_session(session_id, "disconnected");
        }
    }
}
