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

//! Item storage layer.
//!
//! The store is the only owner of items and the only place a USN is assigned.
//!
//! ```
//! use item_core::model::{Item, ItemKind};
//! use item_core::store::ItemStore;
//!
//! let store = ItemStore::new(16);
//! assert_eq!(store.write(Item::new(ItemKind::Object, "a")).unwrap(), 1);
//! assert_eq!(store.write(Item::new(ItemKind::Object, "b")).unwrap(), 2);
//! ```

pub mod item_store;

pub use item_store::ItemStore;
