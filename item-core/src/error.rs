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

//! Crate-wide error type and the remote error-detail chain.

use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use uuid::Uuid;

/// Every failure surfaced by the item core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("items cannot be written with kind Undefined")]
    InvalidKind,
    #[error("unsupported value {value} in protocol v{protocol}")]
    UnsupportedKind { value: i32, protocol: String },
    #[error("unsupported operation {operation} in protocol v{protocol}")]
    UnsupportedMessage { operation: String, protocol: String },
    #[error("codec error: {0}")]
    Codec(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("host resolution failed: {0}")]
    HostResolution(String),
    #[error("no server available, tried: [{}]", candidates.join(", "))]
    NoServerAvailable { candidates: Vec<String> },
    #[error("unknown subscription {0}")]
    UnknownSubscription(Uuid),
    #[error("unknown session {0}")]
    UnknownSession(Uuid),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("store invariant violated: {0}")]
    InvariantViolation(String),
    #[error("queue error: {0}")]
    Queue(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl CoreError {
    /// Stable code carried in `CompletionResult.result_code`. Zero is reserved for success.
    pub fn result_code(&self) -> i32 {
        match self {
            CoreError::Configuration(_) => 1,
            CoreError::InvalidKind => 2,
            CoreError::UnsupportedKind { .. } => 3,
            CoreError::UnsupportedMessage { .. } => 4,
            CoreError::Codec(_) => 5,
            CoreError::Transport(_) => 6,
            CoreError::HostResolution(_) => 7,
            CoreError::NoServerAvailable { .. } => 8,
            CoreError::UnknownSubscription(_) => 9,
            CoreError::UnknownSession(_) => 10,
            CoreError::InvalidQuery(_) => 11,
            CoreError::InvariantViolation(_) => 12,
            CoreError::Queue(_) => 13,
            CoreError::Runtime(_) => 14,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            CoreError::Configuration(_) => "Configuration",
            CoreError::InvalidKind => "InvalidKind",
            CoreError::UnsupportedKind { .. } => "UnsupportedKind",
            CoreError::UnsupportedMessage { .. } => "UnsupportedMessage",
            CoreError::Codec(_) => "Codec",
            CoreError::Transport(_) => "Transport",
            CoreError::HostResolution(_) => "HostResolution",
            CoreError::NoServerAvailable { .. } => "NoServerAvailable",
            CoreError::UnknownSubscription(_) => "UnknownSubscription",
            CoreError::UnknownSession(_) => "UnknownSession",
            CoreError::InvalidQuery(_) => "InvalidQuery",
            CoreError::InvariantViolation(_) => "InvariantViolation",
            CoreError::Queue(_) => "Queue",
            CoreError::Runtime(_) => "Runtime",
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Codec(err.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Transport(err.to_string())
    }
}

/// Description of a failed remote call, nested through `inner_error` for wrapped causes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub full_name: String,
    pub message: String,
    pub source: String,
    pub stack_trace: String,
    pub inner_error: Option<Box<ErrorDetail>>,
}

impl ErrorDetail {
    /// Builds the detail chain for a core error, following `Error::source` links.
    pub fn from_core_error(err: &CoreError) -> Self {
        let mut detail = Self::from_error(err);
        detail.full_name = format!("item_core::CoreError::{}", err.kind_name());
        detail
    }

    pub fn from_error(err: &(dyn Error + 'static)) -> Self {
        Self {
            full_name: std::any::type_name_of_val(err).to_string(),
            message: err.to_string(),
            source: env!("CARGO_PKG_NAME").to_string(),
            stack_trace: String::new(),
            inner_error: err
                .source()
                .map(|cause| Box::new(ErrorDetail::from_error(cause))),
        }
    }

    /// Number of entries in the chain, counting this one.
    pub fn depth(&self) -> usize {
        1 + self.inner_error.as_ref().map_or(0, |inner| inner.depth())
    }
}
