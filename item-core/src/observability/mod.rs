//! Structured logging vocabulary.
//!
//! Every event carries `event = <name from [`events`]>` and `component = <module>`.
//! Library code never installs a subscriber.

pub mod events;
pub mod fields;
