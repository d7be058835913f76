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

//! Direct TCP binding: one JSON envelope per line in both directions.

use crate::data_plane::ReplySink;
use crate::error::CoreError;
use crate::host::bindings::BindingContext;
use crate::observability::events;
use crate::wire::WireMessage;
use async_trait::async_trait;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

const COMPONENT: &str = "tcp_binding";

pub(crate) struct TcpReplySink {
    peer: SocketAddr,
    lines: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl ReplySink for TcpReplySink {
    async fn deliver(&self, message: WireMessage) -> Result<(), CoreError> {
        let line = message.to_line()?;
        self.lines
            .send(line)
            .map_err(|_| CoreError::Transport(format!("connection to {} closed", self.peer)))
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.peer)
    }
}

async fn write_lines(mut writer: OwnedWriteHalf, mut lines: mpsc::UnboundedReceiver<String>) {
    while let Some(mut line) = lines.recv().await {
        line.push('\n');
        if writer.write_all(line.as_bytes()).await.is_err() {
            break;
        }
    }
    let _ = writer.shutdown().await;
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    context: BindingContext,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(
        event = events::CONNECTION_OPENED,
        component = COMPONENT,
        peer = %peer,
        "connection opened"
    );

    let (reader, writer) = stream.into_split();
    let (line_sender, line_receiver) = mpsc::unbounded_channel();
    // Ends once every holder of the sink, including session workers, has let go.
    tokio::spawn(write_lines(writer, line_receiver));
    let sink: Arc<dyn ReplySink> = Arc::new(TcpReplySink {
        peer,
        lines: line_sender,
    });
    let mut sessions = HashSet::new();
    let mut lines = BufReader::new(reader).lines();

    loop {
        let line = tokio::select! {
            _ = shutdown.changed() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(
                    event = events::CONNECTION_READ_FAILED,
                    component = COMPONENT,
                    peer = %peer,
                    err = %err,
                    "connection read failed"
                );
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let message = match WireMessage::from_line(&line) {
            Ok(message) => message,
            Err(err) => {
                warn!(
                    event = events::REQUEST_DECODE_FAILED,
                    component = COMPONENT,
                    peer = %peer,
                    err = %err,
                    "dropping undecodable line"
                );
                continue;
            }
        };
        sessions.insert(message.session_id());

        // Requests of one connection are handled in arrival order.
        if let Some(reply) = context.handle(message, sink.clone()).await {
            if let Err(err) = sink.deliver(reply).await {
                debug!(
                    event = events::OUTBOUND_SEND_FAILED,
                    component = COMPONENT,
                    peer = %peer,
                    err = %err,
                    "two-way reply not delivered"
                );
            }
        }
    }

    // Sessions another connection has taken over are left alone by the service.
    for session_id in sessions {
        context.service.disconnected(session_id, &sink).await;
    }
    info!(
        event = events::CONNECTION_CLOSED,
        component = COMPONENT,
        peer = %peer,
        "connection closed"
    );
}

pub(crate) async fn serve(
    listener: TcpListener,
    context: BindingContext,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tokio::spawn(serve_connection(stream, peer, context.clone(), shutdown.clone()));
                }
                Err(err) => {
                    warn!(
                        event = events::ENDPOINT_ACCEPT_FAILED,
                        component = COMPONENT,
                        err = %err,
                        "accept failed"
                    );
                }
            }
        }
    }
}
