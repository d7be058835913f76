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

//! # item-core
//!
//! `item-core` is the messaging core of an item store: producers publish versioned
//! items, the store stamps every write with a monotonically increasing update sequence
//! number (USN), and consumers select or subscribe to filtered subsets of items over
//! several wire-protocol generations and transports.
//!
//! ## Store and subscriptions
//!
//! ```
//! use chrono::{Duration, Utc};
//! use item_core::model::{Item, ItemKind, QueryDefinition, Transfer};
//! use item_core::store::ItemStore;
//! use item_core::subscription::{EngineConfig, SubscriptionEngine};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = Arc::new(ItemStore::new(64));
//! let engine = SubscriptionEngine::new(store.clone(), &EngineConfig::default()).unwrap();
//!
//! let (outbound, mut replies) = tokio::sync::mpsc::unbounded_channel();
//! let query = QueryDefinition {
//!     app_scopes: vec!["pricing".to_string()],
//!     ..Default::default()
//! };
//! engine
//!     .create(Uuid::new_v4(), outbound, &query, Uuid::new_v4(), Utc::now() + Duration::minutes(5))
//!     .unwrap();
//!
//! let mut item = Item::new(ItemKind::Object, "Curve.EUR.Swap");
//! item.app_scope = "pricing".to_string();
//! assert_eq!(store.write(item).unwrap(), 1);
//!
//! let reply = replies.recv().await.unwrap();
//! assert!(matches!(reply.transfer, Transfer::Notify { ref items, .. } if items[0].store_usn == 1));
//! # });
//! ```
//!
//! ## Hosting the service
//!
//! ```no_run
//! use item_core::host::{InMemoryQueueBroker, ServiceHost, ServiceHostConfig};
//! use item_core::server::CoreService;
//! use item_core::store::ItemStore;
//! use item_core::subscription::EngineConfig;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = Arc::new(ItemStore::new(4096));
//! let service = Arc::new(CoreService::new("core", store, &EngineConfig::default()).unwrap());
//! let config = ServiceHostConfig {
//!     endpoints: "tcp://0.0.0.0:9400;http:8080;queue".to_string(),
//!     ..Default::default()
//! };
//!
//! let host = ServiceHost::new(config, service, Arc::new(InMemoryQueueBroker::new())).unwrap();
//! host.open().await.unwrap();
//! println!("{:?}", host.resolve_reachable_addresses(None).await);
//! host.close().await;
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Model: items, kinds, queries, subscription lifecycle and transfer operations
//! - Store: USN assignment, visibility-filtered reads, select ordering and paging
//! - Wire: frozen message families for generations 1.1, 2.2 and 3.4 plus adapters
//! - Subscription: directory snapshot, engine and dispatch thread, batching
//! - Server: the singleton service and its session table
//! - Data plane: per-session outbound reply workers
//! - Host: endpoint parsing, bindings (tcp, http, queue) and the concurrency policy
//! - Discovery: candidate addresses, probes and latency-scored selection
//! - Runtime: dedicated-thread loops
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events with `event` and `component` fields and does not
//! initialize a global subscriber. Binaries and tests are responsible for one-time
//! `tracing_subscriber` initialization at process boundaries.

pub mod client;
pub mod data_plane;
pub mod discovery;
pub mod error;
pub mod host;
pub mod model;
#[doc(hidden)]
pub mod observability;
mod runtime;
pub mod server;
pub mod store;
pub mod subscription;
pub mod wire;

pub use client::{ClientReply, CoreClient};
pub use error::{CoreError, ErrorDetail};
pub use server::CoreService;
