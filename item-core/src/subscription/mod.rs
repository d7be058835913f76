//! Subscription layer.
//!
//! A subscription is a compiled query plus a session's reply channel. Creation delivers
//! the matching snapshot; afterwards the engine's dispatch thread matches every store
//! write against the directory and queues `Notify` pages on the owner's channel.
//!
//! ```
//! use item_core::subscription::{batch_items, BatchLimits};
//! use item_core::model::{Item, ItemKind};
//! use std::sync::Arc;
//!
//! let items: Vec<Arc<Item>> = (0..120)
//!     .map(|n| Arc::new(Item::new(ItemKind::Object, format!("i{n}"))))
//!     .collect();
//! let pages = batch_items(&items, BatchLimits::default(), false);
//! assert_eq!(pages.len(), 3);
//! ```

pub mod batch;
pub(crate) mod directory;
pub mod engine;

pub use batch::{batch_items, BatchLimits, DEFAULT_MAX_BATCH_BYTES, DEFAULT_MAX_BATCH_ITEMS};
pub use engine::{EngineConfig, SubscriptionEngine};
