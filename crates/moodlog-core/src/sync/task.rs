//! Handles for remote operations running in the background.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::models::NoteId;
use crate::{Error, Result};

/// Outcome of a one-record remote push or delete.
///
/// Await [`RemoteTask::wait`] to observe the result, or drop the handle to
/// fire and forget. Either way the operation runs to completion and failures
/// are logged.
#[must_use = "drop the task explicitly to fire and forget"]
#[derive(Debug)]
pub struct RemoteTask {
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    Running(JoinHandle<Result<()>>),
    Done(Result<()>),
}

impl RemoteTask {
    /// Spawn `operation` on the current Tokio runtime.
    ///
    /// Outside a runtime nothing is sent and the task fails with
    /// [`Error::Task`].
    pub(crate) fn spawn<F>(operation: &'static str, id: NoteId, future: F) -> Self
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            let error = Error::Task("no Tokio runtime to run on".to_string());
            return Self::failed(operation, &id, error);
        };

        let handle = runtime.spawn(async move {
            let result = future.await;
            match &result {
                Ok(()) => tracing::debug!(operation, note = %id, "Remote operation completed"),
                Err(error) => {
                    tracing::warn!(operation, note = %id, %error, "Remote operation failed");
                }
            }
            result
        });
        Self {
            inner: Inner::Running(handle),
        }
    }

    /// A task that failed before any network call was made.
    pub(crate) fn failed(operation: &'static str, id: &NoteId, error: Error) -> Self {
        tracing::warn!(operation, note = %id, %error, "Remote operation not attempted");
        Self {
            inner: Inner::Done(Err(error)),
        }
    }

    /// A task with nothing to do (no remote store configured).
    pub(crate) const fn skipped() -> Self {
        Self {
            inner: Inner::Done(Ok(())),
        }
    }

    /// Whether the outcome is already known.
    pub fn is_finished(&self) -> bool {
        match &self.inner {
            Inner::Running(handle) => handle.is_finished(),
            Inner::Done(_) => true,
        }
    }

    /// Wait for the remote operation to finish.
    pub async fn wait(self) -> Result<()> {
        match self.inner {
            Inner::Running(handle) => handle
                .await
                .map_err(|error| Error::Task(error.to_string()))?,
            Inner::Done(result) => result,
        }
    }
}
