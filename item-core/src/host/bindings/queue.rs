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

//! Durable-queue binding. Replies go to the queue named in the request header.
//!
//! A session keeps the reply queue of its first request until it goes idle.

use crate::data_plane::ReplySink;
use crate::error::CoreError;
use crate::host::bindings::{expire_idle_sessions, BindingContext, IdleSessions};
use crate::host::queue::QueueBroker;
use crate::observability::events;
use crate::wire::WireMessage;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

const COMPONENT: &str = "queue_binding";
const RECEIVE_RETRY_DELAY: Duration = Duration::from_secs(1);

struct QueueReplySink {
    broker: Arc<dyn QueueBroker>,
    reply_queue: Option<String>,
}

#[async_trait]
impl ReplySink for QueueReplySink {
    async fn deliver(&self, message: WireMessage) -> Result<(), CoreError> {
        let Some(reply_queue) = self.reply_queue.as_deref() else {
            debug!(
                event = events::QUEUE_REPLY_DROPPED,
                component = COMPONENT,
                protocol = message.version().as_str(),
                "request carried no reply address"
            );
            return Ok(());
        };
        self.broker.send(reply_queue, message.to_line()?).await
    }

    fn describe(&self) -> String {
        format!(
            "queue://{}",
            self.reply_queue.as_deref().unwrap_or("<no reply address>")
        )
    }
}

async fn handle_message(
    broker: &Arc<dyn QueueBroker>,
    context: &BindingContext,
    sessions: &IdleSessions,
    text: &str,
) {
    let message = match WireMessage::from_line(text) {
        Ok(message) => message,
        Err(err) => {
            warn!(
                event = events::REQUEST_DECODE_FAILED,
                component = COMPONENT,
                err = %err,
                "dropping undecodable queue message"
            );
            return;
        }
    };
    let sink = sessions.touch(message.session_id(), || {
        Arc::new(QueueReplySink {
            broker: broker.clone(),
            reply_queue: message.reply_address().map(str::to_string),
        })
    });

    if let Some(reply) = context.handle(message, sink.clone()).await {
        if let Err(err) = sink.deliver(reply).await {
            warn!(
                event = events::OUTBOUND_SEND_FAILED,
                component = COMPONENT,
                sink = sink.describe().as_str(),
                err = %err,
                "two-way reply not delivered"
            );
        }
    }
}

pub(crate) async fn serve(
    broker: Arc<dyn QueueBroker>,
    queue_name: String,
    context: BindingContext,
    shutdown: watch::Receiver<bool>,
) {
    let sessions = Arc::new(IdleSessions::new(context.session_idle_timeout));
    let expiry = expire_idle_sessions(context.clone(), sessions.clone(), shutdown.clone(), |_| {});
    tokio::join!(
        receive_loop(broker, queue_name, context, sessions, shutdown),
        expiry
    );
}

async fn receive_loop(
    broker: Arc<dyn QueueBroker>,
    queue_name: String,
    context: BindingContext,
    sessions: Arc<IdleSessions>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let received = tokio::select! {
            _ = shutdown.changed() => break,
            received = broker.receive(&queue_name) => received,
        };
        match received {
            Ok(Some(text)) => handle_message(&broker, &context, &sessions, &text).await,
            Ok(None) => break,
            Err(err) => {
                warn!(
                    event = events::QUEUE_RECEIVE_FAILED,
                    component = COMPONENT,
                    queue = queue_name.as_str(),
                    err = %err,
                    "queue receive failed; retrying"
                );
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(RECEIVE_RETRY_DELAY) => {}
                }
            }
        }
    }
}
