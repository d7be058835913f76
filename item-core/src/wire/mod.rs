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

//! Versioned wire protocol layer.
//!
//! Each generation is a frozen message family in its own module with a pair of pure
//! mappings to and from [`Transfer`]. Envelopes travel as one JSON document per line,
//! tagged with the generation label.
//!
//! ```
//! use item_core::model::{RequestHeader, Transfer};
//! use item_core::wire::{ProtocolVersion, WireMessage};
//!
//! let header = RequestHeader::new(uuid::Uuid::new_v4());
//! let message = WireMessage::encode(ProtocolVersion::V1_1, &header, &Transfer::DiscoverService)
//!     .unwrap();
//! let line = message.to_line().unwrap();
//! let (version, _, transfer) = WireMessage::from_line(&line).unwrap().decode().unwrap();
//! assert_eq!(version, ProtocolVersion::V1_1);
//! assert_eq!(transfer, Transfer::DiscoverService);
//! ```

pub mod v1_1;
pub mod v2_2;
pub mod v3_4;

use crate::error::CoreError;
use crate::model::{RequestHeader, Transfer};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Contract names advertised in discovery replies.
pub const CONTRACT_DISCOVER_V1_1: &str = "discover/1.1";
pub const CONTRACT_SESSION_V2_2: &str = "session/2.2";
pub const CONTRACT_TRANSFER_V1_1: &str = "transfer/1.1";
pub const CONTRACT_TRANSFER_V2_2: &str = "transfer/2.2";
pub const CONTRACT_TRANSFER_V3_4: &str = "transfer/3.4";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProtocolVersion {
    V1_1,
    V2_2,
    V3_4,
}

impl ProtocolVersion {
    pub const ALL: [ProtocolVersion; 3] = [
        ProtocolVersion::V1_1,
        ProtocolVersion::V2_2,
        ProtocolVersion::V3_4,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVersion::V1_1 => "1.1",
            ProtocolVersion::V2_2 => "2.2",
            ProtocolVersion::V3_4 => "3.4",
        }
    }

    /// Whether the generation carries explicit session control.
    pub fn has_sessions(&self) -> bool {
        !matches!(self, ProtocolVersion::V1_1)
    }

    /// Contracts a server speaking every generation up to this one supports.
    pub fn contract_names(&self) -> Vec<String> {
        let names: &[&str] = match self {
            ProtocolVersion::V1_1 => &[CONTRACT_DISCOVER_V1_1, CONTRACT_TRANSFER_V1_1],
            ProtocolVersion::V2_2 => &[
                CONTRACT_DISCOVER_V1_1,
                CONTRACT_SESSION_V2_2,
                CONTRACT_TRANSFER_V1_1,
                CONTRACT_TRANSFER_V2_2,
            ],
            ProtocolVersion::V3_4 => &[
                CONTRACT_DISCOVER_V1_1,
                CONTRACT_SESSION_V2_2,
                CONTRACT_TRANSFER_V1_1,
                CONTRACT_TRANSFER_V2_2,
                CONTRACT_TRANSFER_V3_4,
            ],
        };
        names.iter().map(|name| name.to_string()).collect()
    }
}

impl Display for ProtocolVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolVersion {
    type Err = CoreError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        ProtocolVersion::ALL
            .into_iter()
            .find(|version| version.as_str() == input.trim_start_matches('v'))
            .ok_or_else(|| CoreError::Codec(format!("unknown protocol version '{input}'")))
    }
}

/// One envelope of any generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Protocol")]
pub enum WireMessage {
    #[serde(rename = "1.1")]
    V1_1(v1_1::Envelope),
    #[serde(rename = "2.2")]
    V2_2(v2_2::Envelope),
    #[serde(rename = "3.4")]
    V3_4(v3_4::Envelope),
}

impl WireMessage {
    /// Domain to wire for the requested generation.
    pub fn encode(
        version: ProtocolVersion,
        header: &RequestHeader,
        transfer: &Transfer,
    ) -> Result<Self, CoreError> {
        Ok(match version {
            ProtocolVersion::V1_1 => WireMessage::V1_1(v1_1::encode(header, transfer)?),
            ProtocolVersion::V2_2 => WireMessage::V2_2(v2_2::encode(header, transfer)?),
            ProtocolVersion::V3_4 => WireMessage::V3_4(v3_4::encode(header, transfer)?),
        })
    }

    /// Wire to domain. Fields the generation lacks take their documented defaults.
    pub fn decode(self) -> Result<(ProtocolVersion, RequestHeader, Transfer), CoreError> {
        let version = self.version();
        let (header, transfer) = match self {
            WireMessage::V1_1(envelope) => v1_1::decode(envelope)?,
            WireMessage::V2_2(envelope) => v2_2::decode(envelope)?,
            WireMessage::V3_4(envelope) => v3_4::decode(envelope)?,
        };
        Ok((version, header, transfer))
    }

    pub fn version(&self) -> ProtocolVersion {
        match self {
            WireMessage::V1_1(_) => ProtocolVersion::V1_1,
            WireMessage::V2_2(_) => ProtocolVersion::V2_2,
            WireMessage::V3_4(_) => ProtocolVersion::V3_4,
        }
    }

    pub fn session_id(&self) -> Uuid {
        match self {
            WireMessage::V1_1(envelope) => envelope.header.session_id,
            WireMessage::V2_2(envelope) => envelope.header.session_id,
            WireMessage::V3_4(envelope) => envelope.header.session_id,
        }
    }

    pub fn reply_address(&self) -> Option<&str> {
        match self {
            WireMessage::V1_1(_) => None,
            WireMessage::V2_2(envelope) => envelope.header.reply_address.as_deref(),
            WireMessage::V3_4(envelope) => envelope.header.reply_address.as_deref(),
        }
    }

    /// Serialized form for line-framed transports; never contains a newline.
    pub fn to_line(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_line(line: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(line.trim())?)
    }
}
