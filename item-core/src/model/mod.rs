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

//! Domain model layer.
//!
//! Owns the item record, USN ordering, query definitions and the subscription
//! lifecycle. Nothing here performs I/O.
//!
//! ```
//! use item_core::model::{Item, ItemKind, QueryDefinition};
//!
//! let filter = QueryDefinition {
//!     app_scopes: vec!["Pricing".to_string()],
//!     ..Default::default()
//! }
//! .compile()
//! .unwrap();
//!
//! let mut item = Item::new(ItemKind::Object, "Curve.EUR");
//! item.app_scope = "Pricing".to_string();
//! assert!(filter.matches(&item, chrono::Utc::now()));
//! ```

pub mod item;
pub mod query;
pub mod query_expr;
pub mod subscription;
pub mod transfer;

pub use item::{Item, ItemKind, PropertySet, Usn};
pub use query::{OrderBy, OrderField, QueryDefinition, QueryFilter, SelectRequest};
pub use query_expr::QueryExpr;
pub use subscription::{SubscriptionId, SubscriptionLifecycle, SubscriptionState};
pub use transfer::{CompletionResult, RequestHeader, Transfer};
