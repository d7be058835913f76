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

//! Generation 3.4: the full item transfer family. Frozen.

use crate::error::CoreError;
use crate::model::{self, ItemKind, PropertySet, RequestHeader, Transfer};
use crate::wire::v2_2::{self, BeginSession, CloseSession, CompletionResultV22, Header};
use crate::wire::ProtocolVersion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const PROTOCOL: ProtocolVersion = ProtocolVersion::V3_4;

/// Kind codes for this generation. `Event` is the domain `Signal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Undefined,
    Event,
    Object,
    Debug,
    System,
    Local,
}

impl Kind {
    pub fn code(self) -> i32 {
        match self {
            Kind::Undefined => 0,
            Kind::Event => 1,
            Kind::Object => 2,
            Kind::Debug => 3,
            Kind::System => 4,
            Kind::Local => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Kind::Undefined),
            1 => Some(Kind::Event),
            2 => Some(Kind::Object),
            3 => Some(Kind::Debug),
            4 => Some(Kind::System),
            5 => Some(Kind::Local),
            _ => None,
        }
    }
}

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
    #[serde(default, rename = "YData")]
    pub payload: Option<Vec<u8>>,
    #[serde(default, rename = "YSign")]
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
    pub exclude_existing: bool,
    pub wait_for_existing: bool,
    pub exclude_data_body: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct SelectMultipleItems {
    pub query_definition: QueryDefinition,
    #[serde(default)]
    pub item_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub order_expr: Option<String>,
    pub start_row: u32,
    pub row_count: u32,
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

pub fn kind_to_wire(kind: ItemKind) -> Kind {
    match kind {
        ItemKind::Undefined => Kind::Undefined,
        ItemKind::Signal => Kind::Event,
        ItemKind::Object => Kind::Object,
        ItemKind::Debug => Kind::Debug,
        ItemKind::System => Kind::System,
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
        Kind::Event => ItemKind::Signal,
        Kind::Object => ItemKind::Object,
        Kind::Debug => ItemKind::Debug,
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
        exclude_existing: query.exclude_existing,
        wait_for_existing: query.wait_for_existing,
        exclude_data_body: query.exclude_data_body,
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
        exclude_existing: query.exclude_existing,
        wait_for_existing: query.wait_for_existing,
        exclude_data_body: query.exclude_data_body,
    })
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
            start_row: select.start_row,
            row_count: select.row_count,
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
        Transfer::Completion(result) => {
            Message::CompletionResult(v2_2::completion_to_wire(result))
        }
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
            start_row: select.start_row,
            row_count: select.row_count,
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
        Message::CompletionResult(result) => {
            Transfer::Completion(v2_2::completion_from_wire(result))
        }
    };
    Ok((header, transfer))
}
