//! Tokio Runtime Bridge
//!
//! One process-wide runtime hosts store calls that outlive the caller,
//! such as persisting a dragged marker after the gesture has ended.
//!
//! ```text
//! MapState::end_marker_drag
//!       │
//!       ▼
//! spawn_named_in_tokio("persist_position", ...)
//!       │
//!       ▼
//! BinRegistry::update_position  ──►  ServiceEvent
//! ```

use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::{Builder, Runtime};

/// Global tokio runtime instance
static TOKIO_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Get or initialize the global tokio runtime
fn get_runtime() -> &'static Runtime {
    TOKIO_RUNTIME.get_or_init(|| {
        Builder::new_multi_thread()
            .enable_all()
            .thread_name("smartbin-worker")
            .build()
            .expect("Failed to create tokio runtime")
    })
}

/// Spawn a detached, named task on the global runtime
pub fn spawn_named_in_tokio<F>(name: &'static str, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::debug!("Spawning tokio task: {}", name);
    get_runtime().spawn(async move {
        future.await;
        tracing::debug!("Tokio task completed: {}", name);
    });
}

/// Block on a future synchronously
///
/// Only for process startup; panics if called from inside a runtime.
pub fn block_on<F, T>(future: F) -> T
where
    F: Future<Output = T>,
{
    get_runtime().block_on(future)
}
