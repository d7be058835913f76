//! Data-plane layer.
//!
//! Owns the per-session outbound reply path: replies from the service and the
//! subscription engine are queued on a session's [`ReplySender`], encoded in the
//! session's protocol generation and handed to a transport [`ReplySink`] in order.

pub(crate) mod outbound;

pub use outbound::{OutboundReply, ReplySender, ReplySink};
