//! Runtime integration layer.
//!
//! Isolates dedicated worker threads so async/threading behavior stays localized and
//! predictable for the rest of the crate. The subscription engine's match dispatch and
//! expiry sweep are the only loops that run here.

pub(crate) mod worker_runtime;
