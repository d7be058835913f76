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

//! Generation 2.2: session header, error detail, session control and extend. Frozen.
//!
//! The session header, error detail and session-control bodies defined here are
//! reused unchanged by later generations.

use crate::error::{self, CoreError};
use crate::model::{self, CompletionResult, ItemKind, PropertySet, RequestHeader, Transfer};
use crate::wire::ProtocolVersion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const PROTOCOL: ProtocolVersion = ProtocolVersion::V2_2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Undefined,
    Object,
    Debug,
    Signal,
    System,
    Local,
}

impl Kind {
    pub fn code(self) -> i32 {
        match self {
            Kind::Undefined => 0,
            Kind::Object => 1,
            Kind::Debug => 2,
            Kind::Signal => 3,
            Kind::System => 4,
            Kind::Local => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Kind::Undefined),
            1 => Some(Kind::Object),
            2 => Some(Kind::Debug),
            3 => Some(Kind::Signal),
            4 => Some(Kind::System),
            5 => Some(Kind::Local),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Header {
    pub session_id: Uuid,
    pub request_id: Uuid,
    pub debug_flag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_address: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ErrorDetail {
    pub full_name: String,
    pub message: String,
    pub source: String,
    pub stack_trace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_error: Option<Box<ErrorDetail>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct BeginSession {
    pub token: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CloseSession {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Item {
    pub id: Uuid,
    pub kind: i32,
    pub transient: bool,
    pub name: String,
    pub app_props: String,
    pub sys_props: String,
    pub data_type: String,
    pub app_scope: String,
    pub net_scope: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payload: Option<Vec<u8>>,
    #[serde(default)]
    pub signature: Option<Vec<u8>>,
    #[serde(rename = "USN")]
    pub usn: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct QueryDefinition {
    pub kind: i32,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub app_scopes: Vec<String>,
    #[serde(default)]
    pub item_names: Vec<String>,
    #[serde(default)]
    pub query_expr: Option<String>,
    #[serde(rename = "MinimumUSN")]
    pub minimum_usn: u64,
    pub exclude_deleted: bool,
    #[serde(default)]
    pub as_at_time: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct SelectMultipleItems {
    pub query_definition: QueryDefinition,
    #[serde(default)]
    pub item_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub order_expr: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CreateSubscription {
    pub query_definition: QueryDefinition,
    pub subscription_id: Uuid,
    pub expiry_time: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct ExtendSubscription {
    pub subscription_id: Uuid,
    pub expiry_time: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CancelSubscription {
    pub subscription_id: Uuid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct AnswerMultipleItems {
    pub items: Vec<Item>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct NotifyMultipleItems {
    pub subscription_id: Uuid,
    pub items: Vec<Item>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CompletionResultV22 {
    pub success: bool,
    pub result_code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Op", content = "Body")]
pub enum Message {
    BeginSession(BeginSession),
    CloseSession(CloseSession),
    SelectMultipleItems(SelectMultipleItems),
    CreateSubscription(CreateSubscription),
    ExtendSubscription(ExtendSubscription),
    CancelSubscription(CancelSubscription),
    AnswerMultipleItems(AnswerMultipleItems),
    NotifyMultipleItems(NotifyMultipleItems),
    CompletionResult(CompletionResultV22),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope {
    pub header: Header,
    pub message: Message,
}

impl ErrorDetail {
    pub fn from_domain(detail: &error::ErrorDetail) -> Self {
        Self {
            full_name: detail.full_name.clone(),
            message: detail.message.clone(),
            source: detail.source.clone(),
            stack_trace: detail.stack_trace.clone(),
            inner_error: detail
                .inner_error
                .as_ref()
                .map(|inner| Box::new(ErrorDetail::from_domain(inner))),
        }
    }

    pub fn into_domain(self) -> error::ErrorDetail {
        error::ErrorDetail {
            full_name: self.full_name,
            message: self.message,
            source: self.source,
            stack_trace: self.stack_trace,
            inner_error: self.inner_error.map(|inner| Box::new(inner.into_domain())),
        }
    }
}

impl Header {
    pub fn from_domain(header: &RequestHeader) -> Self {
        Self {
            session_id: header.session_id,
            // Replies to one-way operations without a request id get a nil id.
            request_id: header.request_id.unwrap_or_else(Uuid::nil),
            debug_flag: header.debug,
            reply_address: header.reply_address.clone(),
        }
    }

    pub fn into_domain(self) -> RequestHeader {
        RequestHeader {
            session_id: self.session_id,
            request_id: (!self.request_id.is_nil()).then_some(self.request_id),
            debug: self.debug_flag,
            reply_address: self.reply_address,
        }
    }
}

pub fn kind_to_wire(kind: ItemKind) -> Kind {
    match kind {
        ItemKind::Undefined => Kind::Undefined,
        ItemKind::Object => Kind::Object,
        ItemKind::System => Kind::System,
        ItemKind::Signal => Kind::Signal,
        ItemKind::Debug => Kind::Debug,
        ItemKind::Local => Kind::Local,
    }
}

pub fn kind_from_wire(code: i32) -> Result<ItemKind, CoreError> {
    let kind = Kind::from_code(code).ok_or_else(|| CoreError::UnsupportedKind {
        value: code,
        protocol: PROTOCOL.to_string(),
    })?;
    Ok(match kind {
        Kind::Undefined => ItemKind::Undefined,
        Kind::Object => ItemKind::Object,
        Kind::Debug => ItemKind::Debug,
        Kind::Signal => ItemKind::Signal,
        Kind::System => ItemKind::System,
        Kind::Local => ItemKind::Local,
    })
}

fn item_to_wire(item: &model::Item) -> Item {
    Item {
        id: item.id,
        kind: kind_to_wire(item.kind).code(),
        transient: item.transient,
        name: item.name.clone(),
        app_props: item.app_props.to_blob(),
        sys_props: item.sys_props.to_blob(),
        data_type: item.data_type.clone(),
        app_scope: item.app_scope.clone(),
        net_scope: item.net_scope.clone(),
        created: item.created,
        expires: item.expires,
        payload: item.payload.clone(),
        signature: item.signature.clone(),
        usn: item.store_usn,
    }
}

fn item_from_wire(item: Item) -> Result<model::Item, CoreError> {
    Ok(model::Item {
        id: item.id,
        kind: kind_from_wire(item.kind)?,
        transient: item.transient,
        name: item.name,
        data_type: item.data_type,
        app_scope: item.app_scope,
        net_scope: item.net_scope,
        app_props: PropertySet::from_blob(&item.app_props)?,
        sys_props: PropertySet::from_blob(&item.sys_props)?,
        created: item.created,
        expires: item.expires,
        payload: item.payload,
        signature: item.signature,
        store_usn: item.usn,
    })
}

fn items_from_wire(items: Vec<Item>) -> Result<Vec<model::Item>, CoreError> {
    items.into_iter().map(item_from_wire).collect()
}

fn query_to_wire(query: &model::QueryDefinition) -> QueryDefinition {
    QueryDefinition {
        kind: kind_to_wire(query.kind).code(),
        data_type: query.data_type.clone(),
        app_scopes: query.app_scopes.clone(),
        item_names: query.item_names.clone(),
        query_expr: query.query_expr.clone(),
        minimum_usn: query.minimum_usn,
        exclude_deleted: query.exclude_deleted,
        as_at_time: query.as_at_time,
    }
}

fn query_from_wire(query: QueryDefinition) -> Result<model::QueryDefinition, CoreError> {
    Ok(model::QueryDefinition {
        kind: kind_from_wire(query.kind)?,
        data_type: query.data_type,
        app_scopes: query.app_scopes,
        item_names: query.item_names,
        query_expr: query.query_expr,
        minimum_usn: query.minimum_usn,
        exclude_deleted: query.exclude_deleted,
        as_at_time: query.as_at_time,
        ..Default::default()
    })
}

pub fn completion_to_wire(result: &CompletionResult) -> CompletionResultV22 {
    CompletionResultV22 {
        success: result.success,
        result_code: result.result_code,
        message: result.message.clone(),
        error: result.error.as_ref().map(ErrorDetail::from_domain),
    }
}

pub fn completion_from_wire(result: CompletionResultV22) -> CompletionResult {
    CompletionResult {
        success: result.success,
        result_code: result.result_code,
        message: result.message,
        error: result.error.map(ErrorDetail::into_domain),
    }
}

pub fn encode(header: &RequestHeader, transfer: &Transfer) -> Result<Envelope, CoreError> {
    let message = match transfer {
        Transfer::BeginSession { token } => Message::BeginSession(BeginSession {
            token: token.clone(),
        }),
        Transfer::CloseSession => Message::CloseSession(CloseSession {}),
        Transfer::Select(select) => Message::SelectMultipleItems(SelectMultipleItems {
            query_definition: query_to_wire(&select.query),
            item_ids: select.item_ids.clone(),
            order_expr: select.order_expr.clone(),
        }),
        Transfer::CreateSubscription {
            query,
            subscription_id,
            expiry,
        } => Message::CreateSubscription(CreateSubscription {
            query_definition: query_to_wire(query),
            subscription_id: *subscription_id,
            expiry_time: *expiry,
        }),
        Transfer::ExtendSubscription {
            subscription_id,
            expiry,
        } => Message::ExtendSubscription(ExtendSubscription {
            subscription_id: *subscription_id,
            expiry_time: *expiry,
        }),
        Transfer::CancelSubscription { subscription_id } => {
            Message::CancelSubscription(CancelSubscription {
                subscription_id: *subscription_id,
            })
        }
        Transfer::Answer { items } => Message::AnswerMultipleItems(AnswerMultipleItems {
            items: items.iter().map(item_to_wire).collect(),
        }),
        Transfer::Notify {
            subscription_id,
            items,
        } => Message::NotifyMultipleItems(NotifyMultipleItems {
            subscription_id: *subscription_id,
            items: items.iter().map(item_to_wire).collect(),
        }),
        Transfer::Completion(result) => Message::CompletionResult(completion_to_wire(result)),
        Transfer::DiscoverService | Transfer::DiscoverReply { .. } => {
            return Err(CoreError::UnsupportedMessage {
                operation: transfer.operation().to_string(),
                protocol: PROTOCOL.to_string(),
            })
        }
    };

    Ok(Envelope {
        header: Header::from_domain(header),
        message,
    })
}

pub fn decode(envelope: Envelope) -> Result<(RequestHeader, Transfer), CoreError> {
    let header = envelope.header.into_domain();
    let transfer = match envelope.message {
        Message::BeginSession(begin) => Transfer::BeginSession { token: begin.token },
        Message::CloseSession(_) => Transfer::CloseSession,
        Message::SelectMultipleItems(select) => Transfer::Select(model::SelectRequest {
            query: query_from_wire(select.query_definition)?,
            item_ids: select.item_ids,
            order_expr: select.order_expr,
            ..Default::default()
        }),
        Message::CreateSubscription(create) => Transfer::CreateSubscription {
            query: query_from_wire(create.query_definition)?,
            subscription_id: create.subscription_id,
            expiry: create.expiry_time,
        },
        Message::ExtendSubscription(extend) => Transfer::ExtendSubscription {
            subscription_id: extend.subscription_id,
            expiry: extend.expiry_time,
        },
        Message::CancelSubscription(cancel) => Transfer::CancelSubscription {
            subscription_id: cancel.subscription_id,
        },
        Message::AnswerMultipleItems(answer) => Transfer::Answer {
            items: items_from_wire(answer.items)?,
        },
        Message::NotifyMultipleItems(notify) => Transfer::Notify {
            subscription_id: notify.subscription_id,
            items: items_from_wire(notify.items)?,
        },
        Message::CompletionResult(result) => Transfer::Completion(completion_from_wire(result)),
    };
    Ok((header, transfer))
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, kind_from_wire, kind_to_wire, Kind};
    use crate::error::CoreError;
    use crate::model::{
        CompletionResult, ItemKind, QueryDefinition, RequestHeader, SelectRequest, Transfer,
    };
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn kind_table_is_a_bijection() {
        for kind in ItemKind::ALL {
            let code = kind_to_wire(kind).code();
            assert_eq!(Kind::from_code(code), Some(kind_to_wire(kind)));
            assert_eq!(kind_from_wire(code).unwrap(), kind);
        }
    }

    #[test]
    fn header_keeps_request_id_and_reply_address() {
        let header = RequestHeader::new(Uuid::new_v4())
            .with_request_id(Uuid::new_v4())
            .with_reply_address("replies.9001.client");
        let envelope = encode(&header, &Transfer::CloseSession).unwrap();
        let (decoded, transfer) = decode(envelope).unwrap();

        assert_eq!(decoded, header);
        assert_eq!(transfer, Transfer::CloseSession);
    }

    #[test]
    fn select_defaults_fields_added_later() {
        let select = SelectRequest {
            query: QueryDefinition {
                exclude_existing: true,
                wait_for_existing: false,
                exclude_data_body: true,
                as_at_time: Some(Utc::now()),
                ..Default::default()
            },
            order_expr: Some("name desc".to_string()),
            start_row: 10,
            row_count: 5,
            ..Default::default()
        };
        let header = RequestHeader::new(Uuid::new_v4());
        let envelope = encode(&header, &Transfer::Select(select.clone())).unwrap();
        let (_, transfer) = decode(envelope).unwrap();

        let Transfer::Select(back) = transfer else {
            panic!("expected select");
        };
        assert_eq!(back.order_expr, select.order_expr);
        assert_eq!(back.query.as_at_time, select.query.as_at_time);
        assert!(!back.query.exclude_existing);
        assert!(back.query.wait_for_existing);
        assert!(!back.query.exclude_data_body);
        assert_eq!(back.start_row, 0);
        assert_eq!(back.row_count, 0);
    }

    #[test]
    fn completion_keeps_error_chain() {
        let failed = CompletionResult::failed(&CoreError::InvalidKind);
        let header = RequestHeader::new(Uuid::new_v4());
        let envelope = encode(&header, &Transfer::Completion(failed.clone())).unwrap();
        let (_, transfer) = decode(envelope).unwrap();

        assert_eq!(transfer, Transfer::Completion(failed));
    }

    #[test]
    fn discovery_belongs_to_generation_one() {
        let header = RequestHeader::new(Uuid::new_v4());
        let err = encode(&header, &Transfer::DiscoverService).unwrap_err();

        assert!(matches!(err, CoreError::UnsupportedMessage { .. }));
    }
}
