//! Session table: protocol generation and reply channel per client session.

use crate::data_plane::outbound::OutboundWorker;
use crate::data_plane::{ReplySender, ReplySink};
use crate::error::CoreError;
use crate::observability::events;
use crate::wire::ProtocolVersion;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

const COMPONENT: &str = "session_table";

struct Session {
    version: ProtocolVersion,
    outbound: ReplySender,
    /// Channel the session was started on.
    sink: Arc<dyn ReplySink>,
    // Finishes on its own once `outbound` and every subscription clone are dropped.
    _worker: JoinHandle<()>,
}

#[derive(Default)]
pub(crate) struct SessionTable {
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl SessionTable {
    fn sessions(&self) -> MutexGuard<'_, HashMap<Uuid, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `session_id`, replacing any session with the same id.
    pub(crate) fn begin(
        &self,
        session_id: Uuid,
        version: ProtocolVersion,
        sink: Arc<dyn ReplySink>,
    ) -> ReplySender {
        let (outbound, worker) = OutboundWorker::spawn(session_id, version, sink.clone());
        let replaced = self.sessions().insert(
            session_id,
            Session {
                version,
                outbound: outbound.clone(),
                sink,
                _worker: worker,
            },
        );
        if replaced.is_some() {
            debug!(
                event = events::SESSION_BEGIN,
                component = COMPONENT,
                session_id = %session_id,
                "session restarted"
            );
        }
        outbound
    }

    /// Reply channel of an existing session. Generations without sessions get one
    /// implicitly; later generations must have called `BeginSession`.
    pub(crate) fn resolve(
        &self,
        session_id: Uuid,
        version: ProtocolVersion,
        sink: &Arc<dyn ReplySink>,
    ) -> Result<ReplySender, CoreError> {
        if let Some(session) = self.sessions().get(&session_id) {
            return Ok(session.outbound.clone());
        }
        if version.has_sessions() {
            return Err(CoreError::UnknownSession(session_id));
        }
        debug!(
            event = events::SESSION_IMPLICIT,
            component = COMPONENT,
            session_id = %session_id,
            protocol = version.as_str(),
            "implicit session created"
        );
        Ok(self.begin(session_id, version, sink.clone()))
    }

    #[cfg(test)]
    pub(crate) fn version_of(&self, session_id: &Uuid) -> Option<ProtocolVersion> {
        self.sessions().get(session_id).map(|session| session.version)
    }

    pub(crate) fn remove(&self, session_id: &Uuid) -> Option<ReplySender> {
        self.sessions()
            .remove(session_id)
            .map(|session| session.outbound)
    }

    /// Removes `session_id` only while it still replies through `sink`.
    pub(crate) fn remove_owned(
        &self,
        session_id: &Uuid,
        sink: &Arc<dyn ReplySink>,
    ) -> Option<ReplySender> {
        let mut sessions = self.sessions();
        let owned = sessions
            .get(session_id)
            .is_some_and(|session| {
                std::ptr::addr_eq(Arc::as_ptr(&session.sink), Arc::as_ptr(sink))
            });
        if !owned {
            return None;
        }
        sessions.remove(session_id).map(|session| session.outbound)
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions().len()
    }
}

#[cfg(test)]
mod tests {
    use super::SessionTable;
    use crate::data_plane::outbound::tests::RecordingSink;
    use crate::data_plane::ReplySink;
    use crate::error::CoreError;
    use crate::wire::ProtocolVersion;
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn sessionless_generation_gets_implicit_session() {
        let table = SessionTable::default();
        let sink: Arc<dyn ReplySink> = Arc::new(RecordingSink::default());
        let session_id = Uuid::new_v4();

        table.resolve(session_id, ProtocolVersion::V1_1, &sink).unwrap();

        assert_eq!(table.version_of(&session_id), Some(ProtocolVersion::V1_1));
    }

    #[tokio::test]
    async fn session_generations_require_begin() {
        let table = SessionTable::default();
        let sink: Arc<dyn ReplySink> = Arc::new(RecordingSink::default());
        let session_id = Uuid::new_v4();

        assert!(matches!(
            table.resolve(session_id, ProtocolVersion::V3_4, &sink),
            Err(CoreError::UnknownSession(id)) if id == session_id
        ));

        table.begin(session_id, ProtocolVersion::V3_4, sink.clone());
        assert!(table.resolve(session_id, ProtocolVersion::V3_4, &sink).is_ok());
        assert!(table.remove(&session_id).is_some());
        assert_eq!(table.len(), 0);
    }

    #[tokio::test]
    async fn only_the_starting_channel_removes_a_session() {
        let table = SessionTable::default();
        let owner: Arc<dyn ReplySink> = Arc::new(RecordingSink::default());
        let other: Arc<dyn ReplySink> = Arc::new(RecordingSink::default());
        let session_id = Uuid::new_v4();
        table.begin(session_id, ProtocolVersion::V3_4, owner.clone());

        assert!(table.remove_owned(&session_id, &other).is_none());
        assert_eq!(table.len(), 1);

        assert!(table.remove_owned(&session_id, &owner).is_some());
        assert_eq!(table.len(), 0);
    }
}
