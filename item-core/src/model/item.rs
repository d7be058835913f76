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

//! Canonical item record, its kind discriminant and the property-set blob.

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Update sequence number assigned by the store on every write.
pub type Usn = u64;

/// Fixed per-item overhead used by the transport size estimate.
const SIZE_ESTIMATE_BASE: usize = 2000;

/// Item discriminant. Wire generations map it through their own code tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    #[default]
    Undefined,
    Object,
    System,
    Signal,
    Debug,
    Local,
}

impl ItemKind {
    pub const ALL: [ItemKind; 6] = [
        ItemKind::Undefined,
        ItemKind::Object,
        ItemKind::System,
        ItemKind::Signal,
        ItemKind::Debug,
        ItemKind::Local,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Undefined => "Undefined",
            ItemKind::Object => "Object",
            ItemKind::System => "System",
            ItemKind::Signal => "Signal",
            ItemKind::Debug => "Debug",
            ItemKind::Local => "Local",
        }
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered key/value bag. Travels as a JSON object text, or an empty string when empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertySet(BTreeMap<String, String>);

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_blob(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        // A string-to-string map always serializes.
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    pub fn from_blob(blob: &str) -> Result<Self, CoreError> {
        if blob.trim().is_empty() {
            return Ok(Self::default());
        }
        let map: BTreeMap<String, String> = serde_json::from_str(blob)
            .map_err(|err| CoreError::Codec(format!("malformed property set: {err}")))?;
        Ok(Self(map))
    }
}

/// One stored record. `store_usn` is owned by the store and overwritten on every write.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub id: Uuid,
    pub kind: ItemKind,
    pub transient: bool,
    pub name: String,
    pub data_type: String,
    pub app_scope: String,
    pub net_scope: String,
    pub app_props: PropertySet,
    pub sys_props: PropertySet,
    pub created: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
    pub payload: Option<Vec<u8>>,
    pub signature: Option<Vec<u8>>,
    pub store_usn: Usn,
}

impl Item {
    pub fn new(kind: ItemKind, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            transient: false,
            name: name.into(),
            data_type: String::new(),
            app_scope: String::new(),
            net_scope: String::new(),
            app_props: PropertySet::default(),
            sys_props: PropertySet::default(),
            created: Utc::now(),
            expires: None,
            payload: None,
            signature: None,
            store_usn: 0,
        }
    }

    /// True once `expires` is at or before `at`.
    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= at)
    }

    /// Estimated transport size, doubled as a safety buffer. Used for batching only.
    pub fn estimated_size_in_bytes(&self, include_body: bool) -> usize {
        let strings = self.name.len()
            + self.data_type.len()
            + self.app_scope.len()
            + self.net_scope.len()
            + self.app_props.to_blob().len()
            + self.sys_props.to_blob().len();
        let body = if include_body {
            self.payload.as_ref().map_or(0, Vec::len) + self.signature.as_ref().map_or(0, Vec::len)
        } else {
            0
        };
        (SIZE_ESTIMATE_BASE + 2 * strings + body) * 2
    }

    /// Copy without payload and signature.
    pub fn header_only(&self) -> Self {
        Self {
            payload: None,
            signature: None,
            ..self.clone()
        }
    }
}
