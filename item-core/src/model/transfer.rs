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

//! Protocol-independent transfer operations exchanged between clients and the service.

use crate::error::{CoreError, ErrorDetail};
use crate::model::{Item, QueryDefinition, SelectRequest, SubscriptionId};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Session header common to every operation. Older generations carry only `session_id`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestHeader {
    pub session_id: Uuid,
    pub request_id: Option<Uuid>,
    pub debug: bool,
    pub reply_address: Option<String>,
}

impl RequestHeader {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            request_id: None,
            debug: false,
            reply_address: None,
        }
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_reply_address(mut self, reply_address: impl Into<String>) -> Self {
        self.reply_address = Some(reply_address.into());
        self
    }
}

/// Outcome of a one-way operation, reported asynchronously.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionResult {
    pub success: bool,
    pub result_code: i32,
    pub message: String,
    pub error: Option<ErrorDetail>,
}

impl CompletionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            result_code: 0,
            message: String::new(),
            error: None,
        }
    }

    pub fn failed(err: &CoreError) -> Self {
        Self {
            success: false,
            result_code: err.result_code(),
            message: err.to_string(),
            error: Some(ErrorDetail::from_core_error(err)),
        }
    }

    pub fn from_result<T>(result: &Result<T, CoreError>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(err) => Self::failed(err),
        }
    }
}

/// Every operation of the transfer family, in domain terms.
#[derive(Clone, Debug, PartialEq)]
pub enum Transfer {
    DiscoverService,
    DiscoverReply {
        contracts: Vec<String>,
    },
    BeginSession {
        token: String,
    },
    CloseSession,
    Select(SelectRequest),
    CreateSubscription {
        query: QueryDefinition,
        subscription_id: SubscriptionId,
        expiry: DateTime<Utc>,
    },
    ExtendSubscription {
        subscription_id: SubscriptionId,
        expiry: DateTime<Utc>,
    },
    CancelSubscription {
        subscription_id: SubscriptionId,
    },
    Answer {
        items: Vec<Item>,
    },
    /// Server to client: matches for a subscription. Client to server: items to publish.
    Notify {
        subscription_id: SubscriptionId,
        items: Vec<Item>,
    },
    Completion(CompletionResult),
}

impl Transfer {
    pub fn operation(&self) -> &'static str {
        match self {
            Transfer::DiscoverService => "DiscoverService",
            Transfer::DiscoverReply { .. } => "DiscoverReply",
            Transfer::BeginSession { .. } => "BeginSession",
            Transfer::CloseSession => "CloseSession",
            Transfer::Select(_) => "SelectMultipleItems",
            Transfer::CreateSubscription { .. } => "CreateSubscription",
            Transfer::ExtendSubscription { .. } => "ExtendSubscription",
            Transfer::CancelSubscription { .. } => "CancelSubscription",
            Transfer::Answer { .. } => "AnswerMultipleItems",
            Transfer::Notify { .. } => "NotifyMultipleItems",
            Transfer::Completion(_) => "CompletionResult",
        }
    }
}
