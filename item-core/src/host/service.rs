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

use crate::data_plane::ReplySink;
use crate::wire::WireMessage;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// The singleton implementation a [`ServiceHost`](crate::host::ServiceHost) exposes.
#[async_trait]
pub trait HostedService: Send + Sync + 'static {
    fn service_name(&self) -> String;

    /// Contract names answered by discovery and listed in host metadata.
    fn contract_names(&self) -> Vec<String>;

    /// Handles one inbound message.
    ///
    /// One-way replies go to `sink`, which stays valid for the sender's session.
    /// The only two-way reply (discovery) is returned instead.
    async fn receive(&self, message: WireMessage, sink: Arc<dyn ReplySink>) -> Option<WireMessage>;

    /// The channel behind `sink` went away after carrying `session_id`.
    ///
    /// Implementations end the session only if it still replies through `sink`.
    async fn disconnected(&self, _session_id: Uuid, _sink: &Arc<dyn ReplySink>) {}
}
