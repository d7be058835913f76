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

//! Generation 1.1: discovery plus the reduced transfer family. Frozen.

use crate::error::CoreError;
use crate::model::{self, CompletionResult, ItemKind, PropertySet, RequestHeader, Transfer};
use crate::wire::ProtocolVersion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const PROTOCOL: ProtocolVersion = ProtocolVersion::V1_1;

/// Kind codes for this generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Undefined,
    Object,
    System,
    Signal,
    Debug,
    Local,
}

impl Kind {
    pub fn code(self) -> i32 {
        match self {
            Kind::Undefined => 0,
            Kind::Object => 1,
            Kind::System => 2,
            Kind::Signal => 3,
            Kind::Debug => 4,
            Kind::Local => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Kind::Undefined),
            1 => Some(Kind::Object),
            2 => Some(Kind::System),
            3 => Some(Kind::Signal),
            4 => Some(Kind::Debug),
            5 => Some(Kind::Local),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Header {
    pub session_id: Uuid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct Item {
    pub id: Uuid,
    pub kind: i32,
    pub name: String,
    pub data_type: String,
    pub app_scope: String,
    pub app_props: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payload: Option<Vec<u8>>,
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
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct DiscoverReply {
    pub supported_contracts: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct SelectMultipleItems {
    pub query_definition: QueryDefinition,
    #[serde(default)]
    pub item_ids: Option<Vec<Uuid>>,
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
pub struct CompletionResultV11 {
    pub success: bool,
    pub result_code: i32,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Op", content = "Body")]
pub enum Message {
    DiscoverService,
    DiscoverReply(DiscoverReply),
    SelectMultipleItems(SelectMultipleItems),
    CreateSubscription(CreateSubscription),
    CancelSubscription(CancelSubscription),
    AnswerMultipleItems(AnswerMultipleItems),
    NotifyMultipleItems(NotifyMultipleItems),
    CompletionResult(CompletionResultV11),
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
        Kind::System => ItemKind::System,
        Kind::Signal => ItemKind::Signal,
        Kind::Debug => ItemKind::Debug,
        Kind::Local => ItemKind::Local,
    })
}

fn item_to_wire(item: &model::Item) -> Item {
    Item {
        id: item.id,
        kind: kind_to_wire(item.kind).code(),
        name: item.name.clone(),
        data_type: item.data_type.clone(),
        app_scope: item.app_scope.clone(),
        app_props: item.app_props.to_blob(),
        created: item.created,
        expires: item.expires,
        payload: item.payload.clone(),
        usn: item.store_usn,
    }
}

fn item_from_wire(item: Item) -> Result<model::Item, CoreError> {
    Ok(model::Item {
        id: item.id,
        kind: kind_from_wire(item.kind)?,
        transient: false,
        name: item.name,
        data_type: item.data_type,
        app_scope: item.app_scope,
        net_scope: String::new(),
        app_props: PropertySet::from_blob(&item.app_props)?,
        sys_props: PropertySet::default(),
        created: item.created,
        expires: item.expires,
        payload: item.payload,
        signature: None,
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
        ..Default::default()
    })
}

fn unsupported(operation: &str) -> CoreError {
    CoreError::UnsupportedMessage {
        operation: operation.to_string(),
        protocol: PROTOCOL.to_string(),
    }
}

pub fn encode(header: &RequestHeader, transfer: &Transfer) -> Result<Envelope, CoreError> {
    let message = match transfer {
        Transfer::DiscoverService => Message::DiscoverService,
        Transfer::DiscoverReply { contracts } => Message::DiscoverReply(DiscoverReply {
            supported_contracts: contracts.clone(),
        }),
        Transfer::Select(select) => Message::SelectMultipleItems(SelectMultipleItems {
            query_definition: query_to_wire(&select.query),
            item_ids: select.item_ids.clone(),
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
        Transfer::Completion(result) => Message::CompletionResult(CompletionResultV11 {
            success: result.success,
            result_code: result.result_code,
            message: result.message.clone(),
        }),
        Transfer::BeginSession { .. }
        | Transfer::CloseSession
        | Transfer::ExtendSubscription { .. } => return Err(unsupported(transfer.operation())),
    };

    Ok(Envelope {
        header: Header {
            session_id: header.session_id,
        },
        message,
    })
}

pub fn decode(envelope: Envelope) -> Result<(RequestHeader, Transfer), CoreError> {
    let header = RequestHeader::new(envelope.header.session_id);
    let transfer = match envelope.message {
        Message::DiscoverService => Transfer::DiscoverService,
        Message::DiscoverReply(reply) => Transfer::DiscoverReply {
            contracts: reply.supported_contracts,
        },
        Message::SelectMultipleItems(select) => Transfer::Select(model::SelectRequest {
            query: query_from_wire(select.query_definition)?,
            item_ids: select.item_ids,
            ..Default::default()
        }),
        Message::CreateSubscription(create) => Transfer::CreateSubscription {
            query: query_from_wire(create.query_definition)?,
            subscription_id: create.subscription_id,
            expiry: create.expiry_time,
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
        Message::CompletionResult(result) => Transfer::Completion(CompletionResult {
            success: result.success,
            result_code: result.result_code,
            message: result.message,
            error: None,
        }),
    };
    Ok((header, transfer))
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, kind_from_wire, kind_to_wire, Kind};
    use crate::error::CoreError;
    use crate::model::{Item, ItemKind, PropertySet, RequestHeader, Transfer};
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
    fn unknown_kind_code_is_named() {
        let err = kind_from_wire(6).unwrap_err();
        assert_eq!(err.to_string(), "unsupported value 6 in protocol v1.1");
    }

    #[test]
    fn newer_fields_default_after_round_trip() {
        let mut item = Item::new(ItemKind::Signal, "tick");
        item.transient = true;
        item.net_scope = "dmz".to_string();
        item.sys_props = PropertySet::new().with("Signer", "core");
        item.signature = Some(vec![7; 4]);
        item.app_props = PropertySet::new().with("Venue", "XLON");
        item.payload = Some(vec![1, 2]);

        let header = RequestHeader::new(Uuid::new_v4());
        let envelope = encode(
            &header,
            &Transfer::Answer {
                items: vec![item.clone()],
            },
        )
        .unwrap();
        let (decoded_header, decoded) = decode(envelope).unwrap();

        assert_eq!(decoded_header.session_id, header.session_id);
        let Transfer::Answer { items } = decoded else {
            panic!("expected answer");
        };
        let back = &items[0];
        assert_eq!(back.name, item.name);
        assert_eq!(back.kind, item.kind);
        assert_eq!(back.app_props, item.app_props);
        assert_eq!(back.payload, item.payload);
        assert!(!back.transient);
        assert!(back.net_scope.is_empty());
        assert!(back.sys_props.is_empty());
        assert_eq!(back.signature, None);
    }

    #[test]
    fn session_operations_are_not_part_of_this_generation() {
        let header = RequestHeader::new(Uuid::new_v4());
        let err = encode(&header, &Transfer::CloseSession).unwrap_err();

        assert!(matches!(err, CoreError::UnsupportedMessage { .. }));
        assert_eq!(
            err.to_string(),
            "unsupported operation CloseSession in protocol v1.1"
        );
    }
}
