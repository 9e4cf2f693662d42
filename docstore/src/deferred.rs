//! Handles to operations running in the background.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};

use crate::error::{Error, Result};

/// The eventual result of a store operation started with one of the
/// `*_deferred` methods.
///
/// The operation runs on the store's runtime whether or not the handle is
/// polled. Dropping the handle detaches the operation; it still completes.
#[must_use = "dropping a Deferred detaches the operation and discards its result"]
pub struct Deferred<T> {
    handle: JoinHandle<Result<T>>,
}

impl<T: Send + 'static> Deferred<T> {
    pub(crate) fn spawn<F>(runtime: &Handle, operation: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            handle: runtime.spawn(operation),
        }
    }

    /// Returns true once the operation has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the operation and returns its result.
    pub async fn result(self) -> Result<T> {
        self.handle.await.unwrap_or_else(|e| Err(join_error(e)))
    }

    /// Blocks the current thread until the operation finishes.
    ///
    /// For callers outside of async code. Must not be called from a task
    /// running on the store's runtime, and the runtime must be driving
    /// tasks on its own (a multi-threaded runtime, or a current-thread one
    /// being polled elsewhere).
    pub fn wait(self) -> Result<T> {
        futures::executor::block_on(self.result())
    }
}

fn join_error(err: JoinError) -> Error {
    if err.is_cancelled() {
        Error::Unavailable("operation cancelled before completion".to_string())
    } else {
        Error::Internal(format!("operation panicked: {}", err))
    }
}
