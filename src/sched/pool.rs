// src/sched/pool.rs

//! Fixed-size worker pool on top of a Tokio [`JoinSet`].
//!
//! Every job is its own task; a semaphore bounds how many run at once and a
//! free list hands each running job a stable [`WorkerId`] in `0..size`.
//! Results come back in completion order. Dropping the pool aborts every job
//! still in flight.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};

use crate::types::WorkerId;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("did not finish within {}s", .0.as_secs())]
    TimedOut(Duration),
    #[error("panicked: {0}")]
    Panicked(String),
    #[error("was cancelled")]
    Cancelled,
    #[error("pool was shut down before the job started")]
    Closed,
}

#[derive(Debug)]
pub struct WorkerPool<T> {
    permits: Arc<Semaphore>,
    free: Arc<Mutex<Vec<WorkerId>>>,
    jobs: JoinSet<Option<T>>,
    labels: HashMap<Id, String>,
}

impl<T: Send + 'static> WorkerPool<T> {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        // Popped from the back, so worker 0 is handed out first.
        let free = (0..size).rev().map(WorkerId).collect();
        Self {
            permits: Arc::new(Semaphore::new(size)),
            free: Arc::new(Mutex::new(free)),
            jobs: JoinSet::new(),
            labels: HashMap::new(),
        }
    }

    /// Queue `job` under `label`; it starts as soon as a worker is free.
    pub fn spawn<F, Fut>(&mut self, label: impl Into<String>, job: F)
    where
        F: FnOnce(WorkerId) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let free = Arc::clone(&self.free);

        let handle = self.jobs.spawn(async move {
            let _permit = permits.acquire_owned().await.ok()?;
            let slot = Slot::claim(free)?;
            Some(job(slot.id).await)
        });
        self.labels.insert(handle.id(), label.into());
    }

    /// Jobs queued or running and not yet joined.
    pub fn pending(&self) -> usize {
        self.jobs.len()
    }

    /// The next job to finish, with the label it was queued under.
    ///
    /// `None` once every job has been joined.
    pub async fn join_next(&mut self) -> Option<(String, Result<T, JobError>)> {
        let (id, result) = match self.jobs.join_next_with_id().await? {
            Ok((id, Some(value))) => (id, Ok(value)),
            Ok((id, None)) => (id, Err(JobError::Closed)),
            Err(e) => (e.id(), Err(job_error(e))),
        };
        let label = self.labels.remove(&id).unwrap_or_default();
        Some((label, result))
    }

    /// Cancel every job not yet joined. Children they spawned are killed
    /// when their handles drop.
    pub fn abort_all(&mut self) {
        self.jobs.abort_all();
    }
}

/// A claimed worker id, returned to the free list on drop.
struct Slot {
    free: Arc<Mutex<Vec<WorkerId>>>,
    id: WorkerId,
}

impl Slot {
    fn claim(free: Arc<Mutex<Vec<WorkerId>>>) -> Option<Self> {
        let id = free.lock().unwrap_or_else(PoisonError::into_inner).pop()?;
        Some(Self { free, id })
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(self.id);
    }
}

/// Bound `fut` by `limit`; the future is dropped when the limit is hit.
pub async fn within<F: Future>(limit: Duration, fut: F) -> Result<F::Output, JobError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| JobError::TimedOut(limit))
}

fn job_error(err: JoinError) -> JobError {
    if err.is_panic() {
        JobError::Panicked(panic_message(err.into_panic()))
    } else {
        JobError::Cancelled
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
