//! Transport bindings. Each one decodes inbound messages, routes them through the
//! host's [`CallDispatcher`] and supplies the [`ReplySink`] that reaches its peer.

pub(crate) mod http;
pub(crate) mod queue;
pub(crate) mod tcp;

use crate::data_plane::ReplySink;
use crate::host::dispatch::CallDispatcher;
use crate::host::service::HostedService;
use crate::observability::events;
use crate::wire::WireMessage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};
use uuid::Uuid;

const COMPONENT: &str = "binding";
const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(100);

#[derive(Clone)]
pub(crate) struct BindingContext {
    pub(crate) service: Arc<dyn HostedService>,
    pub(crate) dispatcher: CallDispatcher,
    /// How long a session on a connectionless binding may stay silent.
    pub(crate) session_idle_timeout: Duration,
}

impl BindingContext {
    pub(crate) async fn handle(
        &self,
        message: WireMessage,
        sink: Arc<dyn ReplySink>,
    ) -> Option<WireMessage> {
        match self
            .dispatcher
            .dispatch(self.service.receive(message, sink))
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                warn!(
                    event = events::REQUEST_UNSUPPORTED,
                    component = COMPONENT,
                    err = %err,
                    "call dispatch failed"
                );
                None
            }
        }
    }
}

struct SeenSession {
    last_seen: Instant,
    sink: Arc<dyn ReplySink>,
}

/// Sessions of a binding without connections, each with the one sink its replies use.
///
/// A session that stays silent for the idle timeout counts as disconnected.
pub(crate) struct IdleSessions {
    idle_timeout: Duration,
    seen: Mutex<HashMap<Uuid, SeenSession>>,
}

impl IdleSessions {
    pub(crate) fn new(idle_timeout: Duration) -> Self {
        Self {
            idle_timeout,
            seen: Mutex::new(HashMap::new()),
        }
    }

    fn seen(&self) -> MutexGuard<'_, HashMap<Uuid, SeenSession>> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sink of `session_id`, made on first sight. Counts as activity.
    ///
    /// The nil session (discovery) is never tracked.
    pub(crate) fn touch(
        &self,
        session_id: Uuid,
        make_sink: impl FnOnce() -> Arc<dyn ReplySink>,
    ) -> Arc<dyn ReplySink> {
        if session_id.is_nil() {
            return make_sink();
        }
        let mut seen = self.seen();
        let entry = seen.entry(session_id).or_insert_with(|| SeenSession {
            last_seen: Instant::now(),
            sink: make_sink(),
        });
        entry.last_seen = Instant::now();
        entry.sink.clone()
    }

    /// Marks a known session active without creating it.
    pub(crate) fn refresh(&self, session_id: &Uuid) {
        if let Some(entry) = self.seen().get_mut(session_id) {
            entry.last_seen = Instant::now();
        }
    }

    fn take(&self, idle_since: Option<Instant>) -> Vec<(Uuid, Arc<dyn ReplySink>)> {
        let mut seen = self.seen();
        let expired: Vec<Uuid> = seen
            .iter()
            .filter(|(_, entry)| idle_since.map_or(true, |cutoff| entry.last_seen <= cutoff))
            .map(|(session_id, _)| *session_id)
            .collect();
        expired
            .into_iter()
            .filter_map(|session_id| seen.remove(&session_id).map(|entry| (session_id, entry.sink)))
            .collect()
    }

    /// Removes and returns every session silent for the idle timeout as of `now`.
    pub(crate) fn take_idle(&self, now: Instant) -> Vec<(Uuid, Arc<dyn ReplySink>)> {
        match now.checked_sub(self.idle_timeout) {
            Some(cutoff) => self.take(Some(cutoff)),
            None => Vec::new(),
        }
    }

    pub(crate) fn take_all(&self) -> Vec<(Uuid, Arc<dyn ReplySink>)> {
        self.take(None)
    }

    pub(crate) fn contains(&self, session_id: &Uuid) -> bool {
        self.seen().contains_key(session_id)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.seen().len()
    }

    fn sweep_period(&self) -> Duration {
        (self.idle_timeout / 2).max(MIN_SWEEP_PERIOD)
    }
}

async fn disconnect_sessions(
    context: &BindingContext,
    sessions: Vec<(Uuid, Arc<dyn ReplySink>)>,
    reason: &str,
) {
    for (session_id, sink) in sessions {
        debug!(
            event = events::SESSION_IDLE,
            component = COMPONENT,
            session_id = %session_id,
            sink = sink.describe().as_str(),
            reason,
            "session released by binding"
        );
        context.service.disconnected(session_id, &sink).await;
    }
}

/// Releases idle sessions until shutdown, then every session left.
///
/// `prune` runs after each sweep so the binding can drop state of sessions no
/// longer tracked.
pub(crate) async fn expire_idle_sessions(
    context: BindingContext,
    sessions: Arc<IdleSessions>,
    mut shutdown: watch::Receiver<bool>,
    prune: impl Fn(&IdleSessions) + Send + Sync,
) {
    let mut sweeps = tokio::time::interval(sessions.sweep_period());
    sweeps.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = sweeps.tick() => {}
        }
        let idle = sessions.take_idle(Instant::now());
        disconnect_sessions(&context, idle, "idle").await;
        prune(&sessions);
    }
    disconnect_sessions(&context, sessions.take_all(), "endpoint_closed").await;
    prune(&sessions);
}
