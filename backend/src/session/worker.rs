//! One-at-a-time background execution of session commands.
//!
//! Commands run on tokio's blocking pool so a caller's runtime stays
//! responsive during a large join. A command issued while another one holds
//! the session is rejected with [`EngineError::Busy`] instead of queued.

use std::sync::Arc;
use tokio::sync::Mutex;

use super::{FilterOutcome, Session};
use crate::error::{EngineError, EngineResult, OperationError};
use crate::logs::log_error;
use crate::models::{JoinSpec, JoinStats, Table};
use crate::transform::{CleanupOp, FilterSpec, SortSpec};

/// Cloneable handle to a session shared between tasks.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// A command is currently running.
    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_err()
    }

    /// Run `command` on the blocking pool with exclusive access to the session.
    pub async fn run<T, F>(&self, operation: &'static str, command: F) -> EngineResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Session) -> EngineResult<T> + Send + 'static,
    {
        let mut guard = self
            .inner
            .clone()
            .try_lock_owned()
            .map_err(|_| EngineError::Busy)?;

        match tokio::task::spawn_blocking(move || command(&mut *guard)).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => {
                log_error(format!("{} panicked", operation));
                Err(OperationError::Failed {
                    operation: operation.to_string(),
                    message: "worker panicked".to_string(),
                }
                .into())
            }
            Err(e) => Err(OperationError::Aborted(e.to_string()).into()),
        }
    }

    /// Copy of the current table, waiting for a running command to finish.
    pub async fn snapshot(&self) -> Option<Table> {
        self.inner.lock().await.current().cloned()
    }

    pub async fn run_join(&self, left: Table, right: Table, spec: JoinSpec) -> EngineResult<JoinStats> {
        self.run("join", move |s| s.run_join(&left, &right, &spec)).await
    }

    pub async fn apply_filter(&self, spec: FilterSpec) -> EngineResult<FilterOutcome> {
        self.run("filter", move |s| s.apply_filter(&spec)).await
    }

    pub async fn apply_sort(&self, spec: SortSpec) -> EngineResult<()> {
        self.run("sort", move |s| s.apply_sort(&spec)).await
    }

    pub async fn apply_cleanup(&self, op: CleanupOp) -> EngineResult<usize> {
        self.run("cleanup", move |s| s.apply_cleanup(&op)).await
    }

    pub async fn undo(&self) -> EngineResult<String> {
        self.run("undo", |s| s.undo()).await
    }

    pub async fn redo(&self) -> EngineResult<String> {
        self.run("redo", |s| s.redo()).await
    }
}
