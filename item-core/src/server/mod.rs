//! Server layer.
//!
//! [`CoreService`] is the one service instance a host exposes. It decodes every
//! inbound envelope, keeps a session table of reply channels and routes operations to
//! the item store and the subscription engine. One-way results always come back as a
//! `CompletionResult` on the session's channel.

pub mod core_service;
pub(crate) mod session;

pub use core_service::CoreService;
