//! Background task runner abstraction.
//!
//! The analysis coordinator never runs the expensive computation on the
//! request path; it hands a future to a `TaskRunner` and polls the task's
//! liveness later to detect stale locks. The production implementation spawns
//! onto the Tokio runtime; tests substitute a recording runner that captures
//! dispatches without executing them.

use async_trait::async_trait;
use dashmap::DashMap;
use plenum_core::{new_entity_id, PlenumResult};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Opaque identifier of a dispatched task.
pub type TaskId = Uuid;

/// Boxed unit-of-work future handed to a runner.
pub type TaskFuture = Pin<Box<dyn Future<Output = PlenumResult<()>> + Send + 'static>>;

/// Generate a fresh task id.
pub fn new_task_id() -> TaskId {
    new_entity_id()
}

/// Fire-and-forget task dispatch with liveness queries.
///
/// `is_finished` answering `true` for an id the runner has never seen is
/// deliberate: a lock referencing a task nobody is running is stale.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// Dispatch a task. Must not block on the task's completion.
    async fn dispatch(&self, task_id: TaskId, label: &str, work: TaskFuture) -> PlenumResult<()>;

    /// Whether the referenced task has finished (or was never started here).
    async fn is_finished(&self, task_id: TaskId) -> PlenumResult<bool>;

    /// Signal the generic "pending heavy work" watchdog. Fired alongside
    /// every dispatch; implementations may fan this out to an external
    /// checker or just count it.
    fn notify_pending(&self);
}

/// Tokio-backed `TaskRunner`.
///
/// Tracks join handles so `is_finished` can answer liveness queries. Liveness
/// is process-local: in a multi-worker deployment the runner must be backed
/// by a shared task queue instead.
#[derive(Debug, Default)]
pub struct TokioTaskRunner {
    handles: DashMap<TaskId, tokio::task::JoinHandle<()>>,
    pending_signals: AtomicU64,
}

impl TokioTaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of watchdog signals fired since startup.
    pub fn pending_signals(&self) -> u64 {
        self.pending_signals.load(Ordering::Relaxed)
    }

    /// Drop handles of finished tasks. Returns how many were reaped.
    pub fn reap(&self) -> usize {
        let finished: Vec<TaskId> = self
            .handles
            .iter()
            .filter(|entry| entry.value().is_finished())
            .map(|entry| *entry.key())
            .collect();
        for id in &finished {
            self.handles.remove(id);
        }
        finished.len()
    }
}

#[async_trait]
impl TaskRunner for TokioTaskRunner {
    async fn dispatch(&self, task_id: TaskId, label: &str, work: TaskFuture) -> PlenumResult<()> {
        let label = label.to_string();
        let handle = tokio::spawn(async move {
            if let Err(error) = work.await {
                // The task already cached its error payload; this log is for
                // the runner's own observability.
                tracing::error!(%task_id, task = %label, %error, "Background task failed");
            }
        });
        self.handles.insert(task_id, handle);
        Ok(())
    }

    async fn is_finished(&self, task_id: TaskId) -> PlenumResult<bool> {
        Ok(self
            .handles
            .get(&task_id)
            .map(|handle| handle.is_finished())
            .unwrap_or(true))
    }

    fn notify_pending(&self) {
        self.pending_signals.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Pending heavy work signal fired");
    }
}
