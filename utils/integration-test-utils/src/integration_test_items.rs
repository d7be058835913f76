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

use chrono::{DateTime, Utc};
use item_core::model::{Item, ItemKind, PropertySet, Usn};

/// Object item named `name` in app scope `scope`, with a small payload.
pub fn scoped_item(name: &str, scope: &str) -> Item {
    let mut item = Item::new(ItemKind::Object, name);
    item.app_scope = scope.to_string();
    item.data_type = "TestRecord".to_string();
    item.app_props = PropertySet::new().with("Scope", scope);
    item.payload = Some(name.as_bytes().to_vec());
    item
}

pub fn expiring_item(name: &str, scope: &str, expires: DateTime<Utc>) -> Item {
    let mut item = scoped_item(name, scope);
    item.expires = Some(expires);
    item
}

pub fn usns_of(items: &[Item]) -> Vec<Usn> {
    items.iter().map(|item| item.store_usn).collect()
}
