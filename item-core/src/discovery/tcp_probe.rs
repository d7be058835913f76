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

use crate::discovery::address::ServiceAddress;
use crate::discovery::resolver::DiscoveryProbe;
use crate::error::CoreError;
use crate::model::{RequestHeader, Transfer};
use crate::wire::{ProtocolVersion, WireMessage};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use uuid::Uuid;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connects, sends a 1.1 `DiscoverService` and reads the reply line.
#[derive(Clone, Debug)]
pub struct TcpDiscoveryProbe {
    timeout: Duration,
}

impl Default for TcpDiscoveryProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl TcpDiscoveryProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn round_trip(candidate: &ServiceAddress) -> Result<Vec<String>, CoreError> {
        let stream = TcpStream::connect((candidate.host.as_str(), candidate.port)).await?;
        let (reader, mut writer) = stream.into_split();

        let request = WireMessage::encode(
            ProtocolVersion::V1_1,
            &RequestHeader::new(Uuid::nil()),
            &Transfer::DiscoverService,
        )?;
        let mut line = request.to_line()?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;

        let reply = BufReader::new(reader)
            .lines()
            .next_line()
            .await?
            .ok_or_else(|| CoreError::Transport(format!("{candidate} closed the channel")))?;
        match WireMessage::from_line(&reply)?.decode()? {
            (_, _, Transfer::DiscoverReply { contracts }) => Ok(contracts),
            (_, _, other) => Err(CoreError::Codec(format!(
                "expected DiscoverReply from {candidate}, got {}",
                other.operation()
            ))),
        }
    }
}

#[async_trait]
impl DiscoveryProbe for TcpDiscoveryProbe {
    async fn probe(&self, candidate: &ServiceAddress) -> Result<Vec<String>, CoreError> {
        tokio::time::timeout(self.timeout, Self::round_trip(candidate))
            .await
            .map_err(|_| CoreError::Transport(format!("{candidate} timed out")))?
    }
}
