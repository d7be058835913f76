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

//! HTTP binding: requests are POSTed, one-way replies wait in a per-session mailbox.

use crate::data_plane::ReplySink;
use crate::error::CoreError;
use crate::host::bindings::{expire_idle_sessions, BindingContext, IdleSessions};
use crate::host::service_host::HostMetadata;
use crate::observability::events;
use crate::wire::WireMessage;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

const COMPONENT: &str = "http_binding";
const MAX_MAILBOX_MESSAGES: usize = 10_000;

/// Undelivered one-way replies, keyed by session.
#[derive(Default)]
pub(crate) struct Mailboxes {
    inner: Mutex<HashMap<Uuid, VecDeque<WireMessage>>>,
}

impl Mailboxes {
    fn inner(&self) -> MutexGuard<'_, HashMap<Uuid, VecDeque<WireMessage>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, session_id: Uuid, message: WireMessage) -> Result<(), CoreError> {
        let mut inner = self.inner();
        let mailbox = inner.entry(session_id).or_default();
        if mailbox.len() >= MAX_MAILBOX_MESSAGES {
            return Err(CoreError::Transport(format!(
                "mailbox of session {session_id} is full"
            )));
        }
        mailbox.push_back(message);
        Ok(())
    }

    /// Takes every waiting reply. The emptied mailbox goes away with them.
    fn drain(&self, session_id: &Uuid) -> Vec<WireMessage> {
        self.inner()
            .remove(session_id)
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Drops the mailboxes of sessions the binding no longer tracks.
    fn retain_tracked(&self, sessions: &IdleSessions) {
        self.inner()
            .retain(|session_id, _| sessions.contains(session_id));
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner().len()
    }
}

struct MailboxSink {
    session_id: Uuid,
    mailboxes: Arc<Mailboxes>,
}

#[async_trait]
impl ReplySink for MailboxSink {
    async fn deliver(&self, message: WireMessage) -> Result<(), CoreError> {
        self.mailboxes.push(self.session_id, message)
    }

    fn describe(&self) -> String {
        format!("mailbox:{}", self.session_id)
    }
}

#[derive(Clone)]
struct HttpState {
    context: BindingContext,
    sessions: Arc<IdleSessions>,
    mailboxes: Arc<Mailboxes>,
    metadata: Arc<ArcSwap<HostMetadata>>,
}

impl HttpState {
    fn new(context: BindingContext, metadata: Arc<ArcSwap<HostMetadata>>) -> Self {
        Self {
            sessions: Arc::new(IdleSessions::new(context.session_idle_timeout)),
            context,
            mailboxes: Arc::new(Mailboxes::default()),
            metadata,
        }
    }

    /// Sink shared by every request of one session.
    fn sink_for(&self, session_id: Uuid) -> Arc<dyn ReplySink> {
        self.sessions.touch(session_id, || {
            Arc::new(MailboxSink {
                session_id,
                mailboxes: self.mailboxes.clone(),
            })
        })
    }
}

async fn post_message(State(state): State<HttpState>, body: String) -> Response {
    let message = match serde_json::from_str::<WireMessage>(&body) {
        Ok(message) => message,
        Err(err) => {
            debug!(
                event = events::REQUEST_DECODE_FAILED,
                component = COMPONENT,
                err = %err,
                "rejecting undecodable request body"
            );
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };

    let sink = state.sink_for(message.session_id());
    match state.context.handle(message, sink).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn drain_mailbox(
    State(state): State<HttpState>,
    Path(session_id): Path<Uuid>,
) -> Json<Vec<WireMessage>> {
    state.sessions.refresh(&session_id);
    Json(state.mailboxes.drain(&session_id))
}

async fn serve_metadata(State(state): State<HttpState>) -> Json<HostMetadata> {
    Json(HostMetadata::clone(&state.metadata.load()))
}

fn router(mount: &str, state: HttpState) -> Router {
    Router::new()
        .route(&format!("/{mount}"), post(post_message))
        .route(&format!("/{mount}/mailbox/{{session_id}}"), get(drain_mailbox))
        .route("/metadata", get(serve_metadata))
        .with_state(state)
}

/// Serves requests under `/{mount}` and releases sessions that fall silent.
pub(crate) async fn serve(
    listener: TcpListener,
    mount: String,
    context: BindingContext,
    metadata: Arc<ArcSwap<HostMetadata>>,
    shutdown: watch::Receiver<bool>,
) {
    let state = HttpState::new(context, metadata);
    let mailboxes = state.mailboxes.clone();
    let expiry = expire_idle_sessions(
        state.context.clone(),
        state.sessions.clone(),
        shutdown.clone(),
        move |sessions| mailboxes.retain_tracked(sessions),
    );

    let mut server_shutdown = shutdown;
    let server = async move {
        axum::serve(listener, router(&mount, state))
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.changed().await;
            })
            .await
    };
    let (result, ()) = tokio::join!(server, expiry);
    if let Err(err) = result {
        warn!(
            event = events::ENDPOINT_ACCEPT_FAILED,
            component = COMPONENT,
            err = %err,
            "http endpoint stopped with error"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{drain_mailbox, post_message, HttpState};
    use crate::host::bindings::{expire_idle_sessions, BindingContext};
    use crate::host::config::ConcurrencyMode;
    use crate::host::dispatch::CallDispatcher;
    use crate::host::service_host::HostMetadata;
    use crate::model::{RequestHeader, SelectRequest, Transfer};
    use crate::store::ItemStore;
    use crate::subscription::EngineConfig;
    use crate::wire::{ProtocolVersion, WireMessage};
    use crate::CoreService;
    use arc_swap::ArcSwap;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;
    use uuid::Uuid;

    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    fn state() -> (Arc<CoreService>, HttpState) {
        let service = Arc::new(
            CoreService::new("core", Arc::new(ItemStore::new(64)), &EngineConfig::default())
                .unwrap(),
        );
        let context = BindingContext {
            service: service.clone(),
            dispatcher: CallDispatcher::new(ConcurrencyMode::MultiThreaded, 4),
            session_idle_timeout: IDLE_TIMEOUT,
        };
        let metadata = Arc::new(ArcSwap::from_pointee(HostMetadata::default()));
        (service, HttpState::new(context, metadata))
    }

    /// Posts an implicit-session select and waits until its answer and completion are queued.
    async fn select_over_http(state: &HttpState, session_id: Uuid) {
        let select = WireMessage::encode(
            ProtocolVersion::V1_1,
            &RequestHeader::new(session_id),
            &Transfer::Select(SelectRequest::default()),
        )
        .unwrap();
        let response = post_message(State(state.clone()), serde_json::to_string(&select).unwrap()).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        for _ in 0..100 {
            let queued = state
                .mailboxes
                .inner()
                .get(&session_id)
                .map_or(0, |mailbox| mailbox.len());
            if queued >= 2 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("select replies never reached the mailbox");
    }

    #[tokio::test(start_paused = true)]
    async fn draining_removes_the_mailbox() {
        let (service, state) = state();
        let session_id = Uuid::new_v4();
        select_over_http(&state, session_id).await;
        assert_eq!(state.mailboxes.len(), 1);

        let drained = drain_mailbox(State(state.clone()), Path(session_id)).await;

        assert_eq!(drained.0.len(), 2);
        assert_eq!(state.mailboxes.len(), 0);
        assert_eq!(service.session_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_is_released_with_its_mailbox() {
        let (service, state) = state();
        let session_id = Uuid::new_v4();
        select_over_http(&state, session_id).await;
        assert_eq!(service.session_count(), 1);
        assert_eq!(state.mailboxes.len(), 1);

        let (_shutdown, shutdown_receiver) = watch::channel(false);
        let mailboxes = state.mailboxes.clone();
        tokio::spawn(expire_idle_sessions(
            state.context.clone(),
            state.sessions.clone(),
            shutdown_receiver,
            move |sessions| mailboxes.retain_tracked(sessions),
        ));
        tokio::time::sleep(IDLE_TIMEOUT * 2).await;

        assert_eq!(service.session_count(), 0);
        assert_eq!(state.sessions.len(), 0);
        assert_eq!(state.mailboxes.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_the_mailbox_keeps_the_session() {
        let (service, state) = state();
        let session_id = Uuid::new_v4();
        select_over_http(&state, session_id).await;

        let (_shutdown, shutdown_receiver) = watch::channel(false);
        let mailboxes = state.mailboxes.clone();
        tokio::spawn(expire_idle_sessions(
            state.context.clone(),
            state.sessions.clone(),
            shutdown_receiver,
            move |sessions| mailboxes.retain_tracked(sessions),
        ));
        for _ in 0..4 {
            tokio::time::sleep(IDLE_TIMEOUT / 2).await;
            drain_mailbox(State(state.clone()), Path(session_id)).await;
        }

        assert_eq!(service.session_count(), 1);
        assert_eq!(state.sessions.len(), 1);
    }
}
