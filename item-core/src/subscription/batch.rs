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

//! Splits item runs into Answer/Notify pages bounded by count and estimated size.

use crate::model::Item;
use std::sync::Arc;

pub const DEFAULT_MAX_BATCH_ITEMS: usize = 50;
pub const DEFAULT_MAX_BATCH_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_items: usize,
    pub max_bytes: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_BATCH_ITEMS,
            max_bytes: DEFAULT_MAX_BATCH_BYTES,
        }
    }
}

/// Pages items in order. A single item larger than `max_bytes` gets a page of its own.
///
/// With `exclude_data_body` the copies carry no payload or signature and are sized
/// accordingly.
pub fn batch_items<'a>(
    items: impl IntoIterator<Item = &'a Arc<Item>>,
    limits: BatchLimits,
    exclude_data_body: bool,
) -> Vec<Vec<Item>> {
    let max_items = limits.max_items.max(1);
    let mut pages = Vec::new();
    let mut page: Vec<Item> = Vec::new();
    let mut page_bytes = 0usize;

    for item in items {
        let size = item.estimated_size_in_bytes(!exclude_data_body);
        if !page.is_empty() && (page.len() >= max_items || page_bytes + size > limits.max_bytes) {
            pages.push(std::mem::take(&mut page));
            page_bytes = 0;
        }
        page.push(if exclude_data_body {
            item.header_only()
        } else {
            Item::clone(item)
        });
        page_bytes += size;
    }

    if !page.is_empty() {
        pages.push(page);
    }
    pages
}
