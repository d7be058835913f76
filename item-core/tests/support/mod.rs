use item_core::discovery::ServiceAddress;
use item_core::host::{
    FixedAddressSource, InMemoryQueueBroker, Scheme, ServiceHost, ServiceHostConfig,
};
use item_core::model::{CompletionResult, Item, Transfer};
use item_core::store::ItemStore;
use item_core::subscription::EngineConfig;
use item_core::{ClientReply, CoreClient, CoreService};
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) struct RunningHost {
    pub host: ServiceHost,
    pub service: Arc<CoreService>,
    pub broker: Arc<InMemoryQueueBroker>,
}

impl RunningHost {
    /// Port the first endpoint with `scheme` is bound to.
    pub async fn port_of(&self, scheme: Scheme) -> u16 {
        self.host
            .endpoints()
            .await
            .into_iter()
            .find(|endpoint| endpoint.spec.scheme == scheme)
            .map(|endpoint| endpoint.bound_port)
            .expect("endpoint with scheme should be open")
    }

    pub async fn tcp_address(&self) -> ServiceAddress {
        ServiceAddress::new("127.0.0.1", self.port_of(Scheme::Tcp).await)
    }
}

/// Opens a core service on loopback endpoints with OS-assigned ports.
pub(crate) async fn start_host(endpoints: &str) -> RunningHost {
    let store = Arc::new(ItemStore::new(1024));
    let service = Arc::new(
        CoreService::new("core", store, &EngineConfig::default())
            .expect("core service should start"),
    );
    let broker = Arc::new(InMemoryQueueBroker::new());
    let config = ServiceHostConfig {
        endpoints: endpoints.to_string(),
        ..Default::default()
    };

    let host = ServiceHost::new(config, service.clone(), broker.clone())
        .expect("endpoint list should parse")
        .with_address_source(Arc::new(FixedAddressSource(Some(Ipv4Addr::LOCALHOST))));
    host.open().await.expect("host should open");

    RunningHost {
        host,
        service,
        broker,
    }
}

pub(crate) async fn next_reply(client: &mut CoreClient) -> ClientReply {
    tokio::time::timeout(REPLY_TIMEOUT, client.next_reply())
        .await
        .expect("reply should arrive in time")
        .expect("connection should stay open")
}

/// Waits for the completion of `request_id`, collecting notified items on the way.
pub(crate) async fn completion_of(
    client: &mut CoreClient,
    request_id: Uuid,
    notified: &mut Vec<Item>,
) -> CompletionResult {
    loop {
        let reply = next_reply(client).await;
        match reply.transfer {
            Transfer::Completion(result) if reply.request_id == Some(request_id) => return result,
            Transfer::Notify { items, .. } => notified.extend(items),
            _ => {}
        }
    }
}

/// Waits for the next completion of any request.
pub(crate) async fn next_completion(
    client: &mut CoreClient,
    notified: &mut Vec<Item>,
) -> CompletionResult {
    loop {
        match next_reply(client).await.transfer {
            Transfer::Completion(result) => return result,
            Transfer::Notify { items, .. } => notified.extend(items),
            _ => {}
        }
    }
}

/// Collects notified items until `count` have arrived.
pub(crate) async fn notified_items(client: &mut CoreClient, count: usize) -> Vec<Item> {
    let mut items = Vec::new();
    while items.len() < count {
        if let Transfer::Notify { items: batch, .. } = next_reply(client).await.transfer {
            items.extend(batch);
        }
    }
    items
}

pub(crate) async fn connected_session(address: &ServiceAddress) -> CoreClient {
    let mut client = CoreClient::connect(address)
        .await
        .expect("client should connect");
    let request_id = client
        .begin_session("integration")
        .await
        .expect("begin session should be written");
    let result = completion_of(&mut client, request_id, &mut Vec::new()).await;
    assert!(result.success, "begin session failed: {}", result.message);
    client
}
