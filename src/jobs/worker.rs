//! # Worker
//! src/jobs/worker.rs
//!
//! Loop de un thread del pool: desencola, ejecuta la tarea aislando
//! cualquier fallo, registra el resultado y lo archiva.

use crate::jobs::queue::{QueuedJob, WorkQueue};
use crate::jobs::registry::JobRegistry;
use crate::jobs::storage::ResultArchiver;
use crate::jobs::types::{JobOutcome, TaskFailure};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Reporta `task_done` a la cola aunque el procesamiento haga panic
struct TaskDoneGuard<'a>(&'a WorkQueue);

impl Drop for TaskDoneGuard<'_> {
    fn drop(&mut self) {
        self.0.task_done();
    }
}

/// Un worker del pool, ligado a un thread
pub struct Worker {
    name: String,
    queue: WorkQueue,
    registry: Arc<JobRegistry>,
    archiver: Arc<dyn ResultArchiver>,
    shutdown: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(
        name: String,
        queue: WorkQueue,
        registry: Arc<JobRegistry>,
        archiver: Arc<dyn ResultArchiver>,
        shutdown: Arc<AtomicBool>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            name,
            queue,
            registry,
            archiver,
            shutdown,
            poll_interval,
        }
    }

    /// Lanza el loop en un thread con nombre propio
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || self.run())
    }

    /// Itera hasta que el shutdown esté activo y la cola vacía
    pub fn run(self) {
        tracing::debug!(worker = %self.name, "worker started");

        loop {
            if self.shutdown.load(Ordering::SeqCst) && self.queue.is_empty() {
                break;
            }

            // Espera acotada para volver a revisar el flag de shutdown
            let Some(job) = self.queue.dequeue_timeout(self.poll_interval) else {
                continue;
            };

            let _done = TaskDoneGuard(&self.queue);
            let job_id = job.id.clone();
            if panic::catch_unwind(AssertUnwindSafe(|| self.process(job))).is_err() {
                tracing::error!(
                    worker = %self.name,
                    job_id = %job_id,
                    "internal failure while recording job outcome"
                );
            }
        }

        tracing::debug!(worker = %self.name, "worker stopped");
    }

    fn process(&self, job: QueuedJob) {
        let QueuedJob { id, task, payload } = job;
        let started = Instant::now();

        tracing::debug!(worker = %self.name, job_id = %id, "job started");

        let result = panic::catch_unwind(AssertUnwindSafe(|| task(&payload)))
            .unwrap_or_else(|panic| Err(TaskFailure::from_panic(panic)));
        let outcome = JobOutcome::from(result);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            JobOutcome::Done(_) => {
                tracing::debug!(worker = %self.name, job_id = %id, elapsed_ms, "job done");
            }
            JobOutcome::Error(failure) => {
                tracing::warn!(
                    worker = %self.name,
                    job_id = %id,
                    kind = %failure.kind,
                    error = %failure.message,
                    elapsed_ms,
                    "job failed"
                );
            }
        }

        // Primero el registro: el archivo nunca afecta el estado en memoria
        match outcome.clone() {
            JobOutcome::Done(value) => self.registry.mark_done(&id, value),
            JobOutcome::Error(failure) => self.registry.mark_error(&id, failure),
        }

        if let Err(err) = self.archiver.archive(&id, &outcome) {
            tracing::warn!(job_id = %id, error = %err, "failed to persist job result");
        }
    }
}
