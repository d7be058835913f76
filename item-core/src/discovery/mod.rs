//! Discovery and server selection.
//!
//! [`ServerResolver`] turns a [`ServiceAddresses`] candidate list into the one address
//! a client should connect to. It holds no state between calls.

pub mod address;
pub mod resolver;
pub mod tcp_probe;

pub use address::{ServiceAddress, ServiceAddresses};
pub use resolver::{CandidateState, DiscoveryProbe, Resolution, ServerResolver};
pub use tcp_probe::TcpDiscoveryProbe;
