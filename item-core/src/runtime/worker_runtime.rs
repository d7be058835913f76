//! Runtime helper for spawning long-lived loops on dedicated threads.
//!
//! Each loop gets its own current-thread Tokio runtime, so a busy match pass never
//! competes with request handling on the host runtime.

use crate::error::CoreError;
use crate::observability::{events, fields};
use std::future::Future;
use std::thread;
use tokio::runtime::Builder;
use tracing::{debug, error, warn};

pub(crate) const DEFAULT_WORKER_RUNTIME_THREAD_NAME: &str = "item-core-worker";
const COMPONENT: &str = "worker_runtime";

/// Owns the spawned loop thread.
pub(crate) struct WorkerLoopHandle {
    worker_thread: String,
    join_handle: Option<thread::JoinHandle<()>>,
}

impl WorkerLoopHandle {
    pub(crate) fn worker_thread(&self) -> &str {
        &self.worker_thread
    }

    /// Waits for the loop to return. The loop must already have been told to stop.
    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            if handle.join().is_err() {
                warn!(
                    event = events::RUNTIME_SPAWN_FAILED,
                    component = COMPONENT,
                    worker_thread = self.worker_thread.as_str(),
                    "worker loop panicked"
                );
            }
        }
    }
}

fn sanitize_thread_name(thread_name: String) -> String {
    if thread_name.is_empty() || thread_name.contains('\0') {
        warn!(
            event = events::RUNTIME_THREAD_NAME_FALLBACK,
            component = COMPONENT,
            reason = fields::REASON_INVALID_THREAD_NAME,
            fallback = DEFAULT_WORKER_RUNTIME_THREAD_NAME,
            "worker thread name rejected; using fallback"
        );
        DEFAULT_WORKER_RUNTIME_THREAD_NAME.to_string()
    } else {
        thread_name
    }
}

pub(crate) fn spawn_worker_loop<F, Fut>(
    thread_name: String,
    run_loop: F,
) -> Result<WorkerLoopHandle, CoreError>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + 'static,
{
    let worker_thread = sanitize_thread_name(thread_name);
    debug!(
        event = events::RUNTIME_SPAWN_START,
        component = COMPONENT,
        worker_thread = worker_thread.as_str(),
        "spawning worker loop"
    );

    let thread_label = worker_thread.clone();
    let join_handle = thread::Builder::new()
        .name(worker_thread.clone())
        .spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!(
                        event = events::RUNTIME_SPAWN_FAILED,
                        component = COMPONENT,
                        worker_thread = thread_label.as_str(),
                        err = %err,
                        "unable to build worker runtime"
                    );
                    return;
                }
            };
            runtime.block_on(run_loop());
        })
        .map_err(|err| {
            error!(
                event = events::RUNTIME_SPAWN_FAILED,
                component = COMPONENT,
                worker_thread = worker_thread.as_str(),
                err = %err,
                "unable to spawn worker thread"
            );
            CoreError::Runtime(format!("failed to spawn {worker_thread}: {err}"))
        })?;

    debug!(
        event = events::RUNTIME_SPAWN_OK,
        component = COMPONENT,
        worker_thread = worker_thread.as_str(),
        "worker loop spawned"
    );
    Ok(WorkerLoopHandle {
        worker_thread,
        join_handle: Some(join_handle),
    })
}

#[cfg(test)]
mod tests {
    use super::{spawn_worker_loop, DEFAULT_WORKER_RUNTIME_THREAD_NAME};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn loop_runs_on_named_thread() {
        let ran = Arc::new(AtomicBool::new(false));
        let seen = ran.clone();

        let mut handle = spawn_worker_loop("core-test-loop".to_string(), move || async move {
            assert_eq!(std::thread::current().name(), Some("core-test-loop"));
            tokio::task::yield_now().await;
            seen.store(true, Ordering::SeqCst);
        })
        .expect("worker loop should spawn");

        handle.join();
        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(handle.worker_thread(), "core-test-loop");
    }

    #[test]
    fn invalid_thread_name_falls_back() {
        let mut handle = spawn_worker_loop("bad\0name".to_string(), || async {})
            .expect("worker loop should spawn");

        handle.join();
        assert_eq!(handle.worker_thread(), DEFAULT_WORKER_RUNTIME_THREAD_NAME);
    }
}
