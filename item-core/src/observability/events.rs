//! Canonical structured event names used across `item-core`.

// Store events.
pub const ITEM_WRITE: &str = "item_write";
pub const ITEM_SELECT: &str = "item_select";
pub const ITEM_PUBLISH_FAILED: &str = "item_publish_failed";

// Subscription engine events.
pub const SUBSCRIPTION_CREATED: &str = "subscription_created";
pub const SUBSCRIPTION_REPLACED: &str = "subscription_replaced";
pub const SUBSCRIPTION_EXTENDED: &str = "subscription_extended";
pub const SUBSCRIPTION_EXTEND_REJECTED: &str = "subscription_extend_rejected";
pub const SUBSCRIPTION_CANCELLED: &str = "subscription_cancelled";
pub const SUBSCRIPTION_EXPIRED: &str = "subscription_expired";
pub const SUBSCRIPTION_SNAPSHOT_SENT: &str = "subscription_snapshot_sent";
pub const NOTIFY_BATCH_SENT: &str = "notify_batch_sent";
pub const NOTIFY_DROPPED_CLOSED: &str = "notify_dropped_closed";
pub const WRITE_STREAM_LAGGED: &str = "write_stream_lagged";
pub const WRITE_STREAM_CATCH_UP: &str = "write_stream_catch_up";
pub const WRITE_STREAM_CATCH_UP_FAILED: &str = "write_stream_catch_up_failed";
pub const WRITE_STREAM_CLOSED: &str = "write_stream_closed";
pub const ENGINE_SHUTDOWN: &str = "engine_shutdown";

// Session and outbound reply events.
pub const SESSION_BEGIN: &str = "session_begin";
pub const SESSION_IMPLICIT: &str = "session_implicit";
pub const SESSION_CLOSE: &str = "session_close";
pub const SESSION_UNKNOWN: &str = "session_unknown";
pub const SESSION_IDLE: &str = "session_idle";
pub const REQUEST_RECEIVED: &str = "request_received";
pub const REQUEST_DECODE_FAILED: &str = "request_decode_failed";
pub const REQUEST_UNSUPPORTED: &str = "request_unsupported";
pub const CLIENT_COMPLETION: &str = "client_completion";
pub const OUTBOUND_SEND_OK: &str = "outbound_send_ok";
pub const OUTBOUND_SEND_FAILED: &str = "outbound_send_failed";
pub const OUTBOUND_ENCODE_FAILED: &str = "outbound_encode_failed";
pub const OUTBOUND_CLOSED: &str = "outbound_closed";

// Service host events.
pub const HOST_OPEN: &str = "host_open";
pub const HOST_CLOSE: &str = "host_close";
pub const ENDPOINT_OPENED: &str = "endpoint_opened";
pub const ENDPOINT_CLOSED: &str = "endpoint_closed";
pub const ENDPOINT_ACCEPT_FAILED: &str = "endpoint_accept_failed";
pub const CONNECTION_OPENED: &str = "connection_opened";
pub const CONNECTION_CLOSED: &str = "connection_closed";
pub const CONNECTION_READ_FAILED: &str = "connection_read_failed";
pub const QUEUE_CREATED: &str = "queue_created";
pub const QUEUE_DELETED: &str = "queue_deleted";
pub const QUEUE_DELETE_FAILED: &str = "queue_delete_failed";
pub const QUEUE_RECEIVE_FAILED: &str = "queue_receive_failed";
pub const QUEUE_REPLY_DROPPED: &str = "queue_reply_dropped";

// Discovery events.
pub const DISCOVERY_PROBE: &str = "discovery_probe";
pub const DISCOVERY_CANDIDATE_SCORED: &str = "discovery_candidate_scored";
pub const DISCOVERY_CANDIDATE_REJECTED: &str = "discovery_candidate_rejected";
pub const DISCOVERY_RESOLVED: &str = "discovery_resolved";
pub const DISCOVERY_NONE_AVAILABLE: &str = "discovery_none_available";

// Runtime events.
pub const RUNTIME_THREAD_NAME_FALLBACK: &str = "runtime_thread_name_fallback";
pub const RUNTIME_SPAWN_START: &str = "runtime_spawn_start";
pub const RUNTIME_SPAWN_OK: &str = "runtime_spawn_ok";
pub const RUNTIME_SPAWN_FAILED: &str = "runtime_spawn_failed";
