//! Service host layer.
//!
//! A [`ServiceHost`] exposes one [`HostedService`] over every endpoint of a
//! semicolon-separated endpoint string (`tcp`, `http`, `queue`). Inbound calls from all
//! endpoints share one [`CallDispatcher`], which serializes them in single-threaded mode.

pub(crate) mod bindings;
pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod queue;
pub mod service;
pub mod service_host;

pub use config::{ConcurrencyMode, ServiceHostConfig, DEFAULT_PORT};
pub use dispatch::CallDispatcher;
pub use endpoint::{parse_endpoints, queue_name, EndpointData, EndpointSpec, Scheme};
pub use queue::{InMemoryQueueBroker, QueueBroker};
pub use service::HostedService;
pub use service_host::{
    FixedAddressSource, HostAddressSource, HostMetadata, ServiceHost, SystemAddressSource,
};
