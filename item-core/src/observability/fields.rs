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

//! Canonical structured field keys and value-format helpers.

use crate::model::{Item, Usn};
use uuid::Uuid;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";

pub const SESSION_ID: &str = "session_id";
pub const REQUEST_ID: &str = "request_id";
pub const SUBSCRIPTION_ID: &str = "subscription_id";
pub const PROTOCOL: &str = "protocol";
pub const OPERATION: &str = "operation";
pub const USN_RANGE: &str = "usn_range";
pub const ITEM_COUNT: &str = "item_count";
pub const SKIPPED: &str = "skipped";
pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const REASON_BROADCAST_CLOSED: &str = "broadcast_closed";
pub const REASON_SHUTDOWN: &str = "shutdown";
pub const REASON_INVALID_THREAD_NAME: &str = "invalid_thread_name";

pub fn format_optional_id(id: Option<Uuid>) -> String {
    id.map(|id| id.to_string())
        .unwrap_or_else(|| NONE.to_string())
}

/// `first..=last` over the USNs of a batch, or `none` when empty.
pub fn format_usn_range<'a>(items: impl IntoIterator<Item = &'a Item>) -> String {
    let mut range: Option<(Usn, Usn)> = None;
    for item in items {
        range = Some(match range {
            None => (item.store_usn, item.store_usn),
            Some((low, high)) => (low.min(item.store_usn), high.max(item.store_usn)),
        });
    }
    match range {
        Some((low, high)) if low == high => low.to_string(),
        Some((low, high)) => format!("{low}..={high}"),
        None => NONE.to_string(),
    }
}
