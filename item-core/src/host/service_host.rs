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

//! Hosts one service instance behind every configured endpoint.

use crate::error::CoreError;
use crate::host::bindings::{self, BindingContext};
use crate::host::config::ServiceHostConfig;
use crate::host::dispatch::CallDispatcher;
use crate::host::endpoint::{parse_endpoints, queue_name, EndpointData, EndpointSpec, Scheme};
use crate::host::queue::QueueBroker;
use crate::host::service::HostedService;
use crate::observability::events;
use arc_swap::ArcSwap;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const COMPONENT: &str = "service_host";

/// Source of the address other machines reach this host on.
pub trait HostAddressSource: Send + Sync {
    fn local_ipv4(&self) -> Option<Ipv4Addr>;
}

/// Asks the OS which local IPv4 address routes outward. No packet is sent.
pub struct SystemAddressSource;

impl HostAddressSource for SystemAddressSource {
    fn local_ipv4(&self) -> Option<Ipv4Addr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
        socket.connect((Ipv4Addr::new(192, 0, 2, 1), 9)).ok()?;
        match socket.local_addr().ok()?.ip() {
            IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
            _ => None,
        }
    }
}

pub struct FixedAddressSource(pub Option<Ipv4Addr>);

impl HostAddressSource for FixedAddressSource {
    fn local_ipv4(&self) -> Option<Ipv4Addr> {
        self.0
    }
}

/// Served by HTTP endpoints on `GET /metadata`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMetadata {
    pub service: String,
    pub contracts: Vec<String>,
    pub endpoints: Vec<String>,
}

struct OpenEndpoint {
    data: EndpointData,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct HostState {
    open: bool,
    endpoints: Vec<OpenEndpoint>,
    created_queues: Vec<String>,
}

pub struct ServiceHost {
    config: ServiceHostConfig,
    specs: Vec<EndpointSpec>,
    service: Arc<dyn HostedService>,
    broker: Arc<dyn QueueBroker>,
    address_source: Arc<dyn HostAddressSource>,
    dispatcher: CallDispatcher,
    metadata: Arc<ArcSwap<HostMetadata>>,
    state: Mutex<HostState>,
}

impl ServiceHost {
    /// Validates the endpoint list. Nothing is bound until [`open`](Self::open).
    pub fn new(
        config: ServiceHostConfig,
        service: Arc<dyn HostedService>,
        broker: Arc<dyn QueueBroker>,
    ) -> Result<Self, CoreError> {
        let specs = parse_endpoints(&config.endpoints, config.default_port)?;
        let dispatcher = CallDispatcher::new(config.concurrency, config.max_concurrent_calls);
        let metadata = HostMetadata {
            service: service.service_name(),
            contracts: service.contract_names(),
            endpoints: Vec::new(),
        };

        Ok(Self {
            config,
            specs,
            service,
            broker,
            address_source: Arc::new(SystemAddressSource),
            dispatcher,
            metadata: Arc::new(ArcSwap::from_pointee(metadata)),
            state: Mutex::new(HostState::default()),
        })
    }

    pub fn with_address_source(mut self, address_source: Arc<dyn HostAddressSource>) -> Self {
        self.address_source = address_source;
        self
    }

    pub fn config(&self) -> &ServiceHostConfig {
        &self.config
    }

    pub fn endpoint_specs(&self) -> &[EndpointSpec] {
        &self.specs
    }

    pub fn metadata(&self) -> HostMetadata {
        HostMetadata::clone(&self.metadata.load())
    }

    /// Endpoints currently open, in configuration order.
    pub async fn endpoints(&self) -> Vec<EndpointData> {
        self.state
            .lock()
            .await
            .endpoints
            .iter()
            .map(|endpoint| endpoint.data.clone())
            .collect()
    }

    async fn bind(spec: &EndpointSpec) -> Result<TcpListener, CoreError> {
        TcpListener::bind((spec.bind_host(), spec.port))
            .await
            .map_err(|err| CoreError::Transport(format!("cannot bind {spec}: {err}")))
    }

    /// Creates every missing queue. Runs before any endpoint accepts traffic.
    async fn ensure_queues(&self, state: &mut HostState) -> Result<(), CoreError> {
        for spec in self.specs.iter().filter(|spec| spec.scheme == Scheme::Queue) {
            let name = queue_name(&self.config.app_name, spec.port, &self.config.interface_name);
            if self.broker.exists(&name).await? || state.created_queues.contains(&name) {
                continue;
            }
            self.broker.create(&name).await?;
            state.created_queues.push(name.clone());
            info!(
                event = events::QUEUE_CREATED,
                component = COMPONENT,
                queue = name.as_str(),
                "queue created"
            );
        }
        Ok(())
    }

    async fn open_endpoint(
        &self,
        spec: &EndpointSpec,
        context: &BindingContext,
    ) -> Result<OpenEndpoint, CoreError> {
        let (shutdown, shutdown_receiver) = watch::channel(false);

        let (data, task) = match spec.scheme {
            Scheme::Tcp => {
                let listener = Self::bind(spec).await?;
                let bound_port = listener.local_addr()?.port();
                let task = tokio::spawn(bindings::tcp::serve(
                    listener,
                    context.clone(),
                    shutdown_receiver,
                ));
                (
                    EndpointData {
                        spec: spec.clone(),
                        bound_port,
                        queue_name: None,
                    },
                    task,
                )
            }
            Scheme::Http => {
                let listener = Self::bind(spec).await?;
                let bound_port = listener.local_addr()?.port();
                let task = tokio::spawn(bindings::http::serve(
                    listener,
                    spec.http_mount(&self.config.interface_name).to_string(),
                    context.clone(),
                    self.metadata.clone(),
                    shutdown_receiver,
                ));
                (
                    EndpointData {
                        spec: spec.clone(),
                        bound_port,
                        queue_name: None,
                    },
                    task,
                )
            }
            Scheme::Queue => {
                let name = queue_name(&self.config.app_name, spec.port, &self.config.interface_name);
                let task = tokio::spawn(bindings::queue::serve(
                    self.broker.clone(),
                    name.clone(),
                    context.clone(),
                    shutdown_receiver,
                ));
                (
                    EndpointData {
                        spec: spec.clone(),
                        bound_port: spec.port,
                        queue_name: Some(name),
                    },
                    task,
                )
            }
        };

        info!(
            event = events::ENDPOINT_OPENED,
            component = COMPONENT,
            endpoint = %spec,
            bound_port = data.bound_port,
            "endpoint opened"
        );
        Ok(OpenEndpoint {
            data,
            shutdown,
            task,
        })
    }

    /// Ensures every queue exists, then binds every endpoint and starts accepting traffic.
    ///
    /// On failure everything opened so far is closed again.
    pub async fn open(&self) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        if state.open {
            return Ok(());
        }
        let context = BindingContext {
            service: self.service.clone(),
            dispatcher: self.dispatcher.clone(),
            session_idle_timeout: self.config.session_idle_timeout(),
        };

        if let Err(err) = self.ensure_queues(&mut state).await {
            self.shutdown_locked(&mut state).await;
            return Err(err);
        }
        for spec in &self.specs {
            match self.open_endpoint(spec, &context).await {
                Ok(endpoint) => state.endpoints.push(endpoint),
                Err(err) => {
                    self.shutdown_locked(&mut state).await;
                    return Err(err);
                }
            }
        }
        state.open = true;

        let opened: Vec<EndpointData> = state.endpoints.iter().map(|e| e.data.clone()).collect();
        let addresses = match self.address_source.local_ipv4() {
            Some(ip) => self.reachable_addresses(ip, &opened, None),
            None => {
                warn!(
                    event = events::HOST_OPEN,
                    component = COMPONENT,
                    "no IPv4 address; metadata lists bind addresses"
                );
                opened.iter().map(|data| data.spec.to_string()).collect()
            }
        };
        self.metadata.rcu(|current| HostMetadata {
            endpoints: addresses.clone(),
            ..HostMetadata::clone(current)
        });

        info!(
            event = events::HOST_OPEN,
            component = COMPONENT,
            service = self.metadata.load().service.as_str(),
            endpoint_count = state.endpoints.len(),
            concurrency = ?self.dispatcher.mode(),
            "service host open"
        );
        Ok(())
    }

    async fn shutdown_locked(&self, state: &mut HostState) {
        let endpoints: Vec<OpenEndpoint> = state.endpoints.drain(..).collect();
        for endpoint in &endpoints {
            let _ = endpoint.shutdown.send(true);
        }
        let (specs, tasks): (Vec<EndpointSpec>, Vec<JoinHandle<()>>) = endpoints
            .into_iter()
            .map(|endpoint| (endpoint.data.spec, endpoint.task))
            .unzip();

        for (spec, joined) in specs.iter().zip(join_all(tasks).await) {
            if let Err(err) = joined {
                warn!(
                    event = events::ENDPOINT_CLOSED,
                    component = COMPONENT,
                    endpoint = %spec,
                    err = %err,
                    "endpoint task ended abnormally"
                );
                continue;
            }
            info!(
                event = events::ENDPOINT_CLOSED,
                component = COMPONENT,
                endpoint = %spec,
                "endpoint closed"
            );
        }

        for name in state.created_queues.drain(..) {
            match self.broker.delete(&name).await {
                Ok(()) => {
                    debug!(
                        event = events::QUEUE_DELETED,
                        component = COMPONENT,
                        queue = name.as_str(),
                        "queue deleted"
                    );
                }
                Err(err) => {
                    warn!(
                        event = events::QUEUE_DELETE_FAILED,
                        component = COMPONENT,
                        queue = name.as_str(),
                        err = %err,
                        "queue delete failed; continuing shutdown"
                    );
                }
            }
        }
        state.open = false;
    }

    /// Stops every endpoint and deletes the queues this host created. Never fails.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        self.shutdown_locked(&mut state).await;
        info!(
            event = events::HOST_CLOSE,
            component = COMPONENT,
            "service host closed"
        );
    }

    fn reachable_addresses(
        &self,
        ip: Ipv4Addr,
        endpoints: &[EndpointData],
        scheme: Option<Scheme>,
    ) -> Vec<String> {
        endpoints
            .iter()
            .filter(|data| scheme.map_or(true, |scheme| scheme == data.spec.scheme))
            .map(|data| match data.spec.scheme {
                Scheme::Tcp => format!("tcp://{ip}:{}", data.bound_port),
                Scheme::Http => format!(
                    "http://{ip}:{}/{}",
                    data.bound_port,
                    data.spec.http_mount(&self.config.interface_name)
                ),
                Scheme::Queue => format!(
                    "queue://{ip}/{}",
                    data.queue_name.as_deref().unwrap_or_default()
                ),
            })
            .collect()
    }

    /// Externally reachable address of every endpoint with `scheme` (all when `None`).
    ///
    /// Before [`open`](Self::open) the configured ports are reported.
    pub async fn resolve_reachable_addresses(
        &self,
        scheme: Option<Scheme>,
    ) -> Result<Vec<String>, CoreError> {
        let ip = self.address_source.local_ipv4().ok_or_else(|| {
            CoreError::HostResolution("local host has no IPv4 address".to_string())
        })?;

        let state = self.state.lock().await;
        let endpoints: Vec<EndpointData> = if state.open {
            state.endpoints.iter().map(|e| e.data.clone()).collect()
        } else {
            self.specs
                .iter()
                .map(|spec| EndpointData {
                    spec: spec.clone(),
                    bound_port: spec.port,
                    queue_name: (spec.scheme == Scheme::Queue).then(|| {
                        queue_name(&self.config.app_name, spec.port, &self.config.interface_name)
                    }),
                })
                .collect()
        };
        Ok(self.reachable_addresses(ip, &endpoints, scheme))
    }
}

#[cfg(test)]
mod tests {
    use super::{FixedAddressSource, ServiceHost};
    use crate::data_plane::ReplySink;
    use crate::error::CoreError;
    use crate::host::config::ServiceHostConfig;
    use crate::host::endpoint::Scheme;
    use crate::host::queue::{InMemoryQueueBroker, QueueBroker};
    use crate::host::service::HostedService;
    use crate::wire::WireMessage;
    use async_trait::async_trait;
    use std::net::Ipv4Addr;
    use std::sync::Arc;
    use tokio::sync::Notify;

    struct SilentService;

    #[async_trait]
    impl HostedService for SilentService {
        fn service_name(&self) -> String {
            "silent".to_string()
        }

        fn contract_names(&self) -> Vec<String> {
            vec!["transfer/3.4".to_string()]
        }

        async fn receive(&self, _message: WireMessage, _sink: Arc<dyn ReplySink>) -> Option<WireMessage> {
            None
        }
    }

    /// Broker whose deletes always fail.
    struct StickyBroker(InMemoryQueueBroker);

    #[async_trait]
    impl QueueBroker for StickyBroker {
        async fn exists(&self, name: &str) -> Result<bool, CoreError> {
            self.0.exists(name).await
        }

        async fn create(&self, name: &str) -> Result<(), CoreError> {
            self.0.create(name).await
        }

        async fn delete(&self, name: &str) -> Result<(), CoreError> {
            Err(CoreError::Queue(format!("{name} is locked")))
        }

        async fn send(&self, name: &str, message: String) -> Result<(), CoreError> {
            self.0.send(name, message).await
        }

        async fn receive(&self, name: &str) -> Result<Option<String>, CoreError> {
            self.0.receive(name).await
        }
    }

    /// Broker whose creates wait until the test releases them.
    struct GatedBroker {
        inner: InMemoryQueueBroker,
        create_started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl QueueBroker for GatedBroker {
        async fn exists(&self, name: &str) -> Result<bool, CoreError> {
            self.inner.exists(name).await
        }

        async fn create(&self, name: &str) -> Result<(), CoreError> {
            self.create_started.notify_one();
            self.release.notified().await;
            self.inner.create(name).await
        }

        async fn delete(&self, name: &str) -> Result<(), CoreError> {
            self.inner.delete(name).await
        }

        async fn send(&self, name: &str, message: String) -> Result<(), CoreError> {
            self.inner.send(name, message).await
        }

        async fn receive(&self, name: &str) -> Result<Option<String>, CoreError> {
            self.inner.receive(name).await
        }
    }

    fn config(endpoints: &str) -> ServiceHostConfig {
        ServiceHostConfig {
            app_name: "Core".to_string(),
            interface_name: "transfer".to_string(),
            endpoints: endpoints.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn empty_endpoint_list_fails_construction() {
        let result = ServiceHost::new(
            config(" ; "),
            Arc::new(SilentService),
            Arc::new(InMemoryQueueBroker::new()),
        );
        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }

    #[tokio::test]
    async fn open_creates_queue_and_close_deletes_it() {
        let broker = Arc::new(InMemoryQueueBroker::new());
        let host = ServiceHost::new(
            config("queue:9500;tcp://127.0.0.1:0;http://127.0.0.1:0"),
            Arc::new(SilentService),
            broker.clone(),
        )
        .unwrap()
        .with_address_source(Arc::new(FixedAddressSource(Some(Ipv4Addr::new(10, 1, 2, 3)))));

        host.open().await.unwrap();
        assert_eq!(broker.queue_names(), vec!["core.9500.transfer".to_string()]);

        let endpoints = host.endpoints().await;
        assert_eq!(endpoints.len(), 3);
        let tcp_port = endpoints[1].bound_port;
        assert_ne!(tcp_port, 0);
        assert_eq!(
            host.resolve_reachable_addresses(Some(Scheme::Tcp)).await.unwrap(),
            vec![format!("tcp://10.1.2.3:{tcp_port}")]
        );
        assert_eq!(host.metadata().endpoints.len(), 3);
        assert_eq!(host.metadata().contracts, vec!["transfer/3.4".to_string()]);

        host.close().await;
        assert!(broker.queue_names().is_empty());
        assert!(host.endpoints().await.is_empty());
    }

    #[tokio::test]
    async fn no_endpoint_accepts_traffic_before_queues_exist() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let broker = Arc::new(GatedBroker {
            inner: InMemoryQueueBroker::new(),
            create_started: Notify::new(),
            release: Notify::new(),
        });
        let host = Arc::new(
            ServiceHost::new(
                config(&format!("tcp://127.0.0.1:{port};queue:9700")),
                Arc::new(SilentService),
                broker.clone(),
            )
            .unwrap(),
        );

        let opening = tokio::spawn({
            let host = host.clone();
            async move { host.open().await }
        });
        broker.create_started.notified().await;
        assert!(!broker.exists("core.9700.transfer").await.unwrap());
        assert!(tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_err());

        broker.release.notify_one();
        opening.await.unwrap().unwrap();
        assert!(broker.exists("core.9700.transfer").await.unwrap());
        assert!(tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_ok());
        host.close().await;
    }

    #[tokio::test]
    async fn existing_queue_is_left_in_place() {
        let broker = Arc::new(InMemoryQueueBroker::new());
        broker.create("core.9500.transfer").await.unwrap();
        let host = ServiceHost::new(config("queue:9500"), Arc::new(SilentService), broker.clone())
            .unwrap();

        host.open().await.unwrap();
        host.close().await;

        assert_eq!(broker.queue_names(), vec!["core.9500.transfer".to_string()]);
    }

    #[tokio::test]
    async fn queue_delete_failure_does_not_block_close() {
        let broker = Arc::new(StickyBroker(InMemoryQueueBroker::new()));
        let host = ServiceHost::new(config("queue:9600"), Arc::new(SilentService), broker.clone())
            .unwrap();

        host.open().await.unwrap();
        host.close().await;

        assert!(broker.exists("core.9600.transfer").await.unwrap());
        assert!(host.endpoints().await.is_empty());
    }

    #[tokio::test]
    async fn resolution_without_ipv4_fails() {
        let host = ServiceHost::new(
            config("tcp:9400"),
            Arc::new(SilentService),
            Arc::new(InMemoryQueueBroker::new()),
        )
        .unwrap()
        .with_address_source(Arc::new(FixedAddressSource(None)));

        assert!(matches!(
            host.resolve_reachable_addresses(None).await,
            Err(CoreError::HostResolution(_))
        ));
    }

    #[tokio::test]
    async fn addresses_before_open_use_configured_ports() {
        let host = ServiceHost::new(
            config("tcp:9400;queue:9401;http:8080"),
            Arc::new(SilentService),
            Arc::new(InMemoryQueueBroker::new()),
        )
        .unwrap()
        .with_address_source(Arc::new(FixedAddressSource(Some(Ipv4Addr::LOCALHOST))));

        assert_eq!(
            host.resolve_reachable_addresses(None).await.unwrap(),
            vec![
                "tcp://127.0.0.1:9400".to_string(),
                "queue://127.0.0.1/core.9401.transfer".to_string(),
                "http://127.0.0.1:8080/transfer".to_string(),
            ]
        );
    }
}
