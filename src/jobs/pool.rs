//! # Pool de Workers
//! src/jobs/pool.rs
//!
//! Coordina la ejecución de jobs: admisión, workers, consultas y shutdown
//! ordenado (dejar de admitir, vaciar la cola, unir los threads).

use crate::config::Config;
use crate::error::{PoolError, QueryError, SubmitError};
use crate::jobs::id::JobIdGenerator;
use crate::jobs::queue::{QueuedJob, WorkQueue};
use crate::jobs::registry::JobRegistry;
use crate::jobs::storage::{FileArchiver, NullArchiver, ResultArchiver};
use crate::jobs::types::{JobOutcome, JobStatus, Payload, Task};
use crate::jobs::worker::Worker;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Cada cuánto se revisa si un worker terminó durante el join
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Pool de tamaño fijo que ejecuta jobs en paralelo
pub struct WorkerPool {
    ids: JobIdGenerator,
    queue: WorkQueue,
    registry: Arc<JobRegistry>,

    /// Flag que leen los workers para saber cuándo terminar
    shutdown: Arc<AtomicBool>,

    /// Admisión cerrada. Los submits toman el lock de lectura durante
    /// registro + encolado, así el shutdown no puede colarse entre ambos.
    closed: RwLock<bool>,

    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
    join_timeout: Duration,
    drain_timeout: Option<Duration>,
}

impl WorkerPool {
    /// Crea el pool con el archiver que indique la configuración
    pub fn new(config: &Config) -> Result<Self, PoolError> {
        let archiver: Arc<dyn ResultArchiver> = if config.archive_results {
            Arc::new(FileArchiver::new(&config.results_dir))
        } else {
            Arc::new(NullArchiver)
        };
        Self::with_archiver(config, archiver)
    }

    /// Crea el pool y arranca todos sus workers.
    ///
    /// Falla si la configuración no es válida o si no se pudo lanzar
    /// algún thread.
    pub fn with_archiver(
        config: &Config,
        archiver: Arc<dyn ResultArchiver>,
    ) -> Result<Self, PoolError> {
        config.validate()?;

        let worker_count = config.effective_workers();
        let queue = WorkQueue::new();
        let registry = Arc::new(JobRegistry::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::with_capacity(worker_count);
        for i in 0..worker_count {
            let worker = Worker::new(
                format!("worker-{}", i),
                queue.clone(),
                Arc::clone(&registry),
                Arc::clone(&archiver),
                Arc::clone(&shutdown),
                config.poll_interval(),
            );

            match worker.spawn() {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    // Liberar los workers ya lanzados antes de fallar
                    shutdown.store(true, Ordering::SeqCst);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(err.into());
                }
            }
        }

        tracing::info!(workers = worker_count, "worker pool started");

        Ok(Self {
            ids: JobIdGenerator::new(),
            queue,
            registry,
            shutdown,
            closed: RwLock::new(false),
            workers: Mutex::new(handles),
            worker_count,
            join_timeout: config.join_timeout(),
            drain_timeout: config.drain_timeout(),
        })
    }

    /// Número de workers del pool
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Genera el siguiente id de job ("1", "2", ...)
    pub fn next_id(&self) -> String {
        self.ids.next_id()
    }

    /// Admite un job con un id dado por el llamador.
    ///
    /// Falla con `Rejected` si el shutdown ya empezó y con `DuplicateId`
    /// si el id ya existe; en ambos casos no se encola nada.
    pub fn submit(
        &self,
        task: Task,
        payload: Payload,
        id: impl Into<String>,
    ) -> Result<(), SubmitError> {
        let id = id.into();
        let closed = self.closed.read().unwrap_or_else(PoisonError::into_inner);
        if *closed {
            tracing::info!(job_id = %id, "shutdown active, rejecting job");
            return Err(SubmitError::Rejected);
        }

        self.registry.register(&id)?;
        self.queue.enqueue(QueuedJob {
            id: id.clone(),
            task,
            payload,
        });

        tracing::debug!(job_id = %id, "job queued");
        Ok(())
    }

    /// Genera un id nuevo y admite el job con él
    pub fn submit_new(&self, task: Task, payload: Payload) -> Result<String, SubmitError> {
        let id = self.next_id();
        self.submit(task, payload, id.clone())?;
        Ok(id)
    }

    pub fn status(&self, id: &str) -> Result<JobStatus, QueryError> {
        self.registry.get_status(id)
    }

    pub fn result(&self, id: &str) -> Result<JobOutcome, QueryError> {
        self.registry.get_result(id)
    }

    /// Estado de todos los jobs conocidos
    pub fn statuses(&self) -> BTreeMap<String, JobStatus> {
        self.registry.statuses()
    }

    /// Resultados de todos los jobs terminados
    pub fn outcomes(&self) -> BTreeMap<String, JobOutcome> {
        self.registry.outcomes()
    }

    /// Jobs registrados desde que arrancó el pool
    pub fn job_count(&self) -> usize {
        self.registry.len()
    }

    /// Jobs encolados o en ejecución
    pub fn pending(&self) -> usize {
        self.queue.outstanding()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Shutdown ordenado: cerrar admisión, esperar a que se vacíe la cola
    /// y unir los workers con un timeout por worker.
    ///
    /// Llamarlo de nuevo no hace nada.
    pub fn shutdown(&self) {
        {
            let mut closed = self.closed.write().unwrap_or_else(PoisonError::into_inner);
            if *closed {
                tracing::warn!("shutdown already in progress");
                return;
            }
            *closed = true;
            self.shutdown.store(true, Ordering::SeqCst);
        }
        tracing::info!(pending = self.pending(), "shutdown initiated");

        if self.queue.wait_drained(self.drain_timeout) {
            tracing::info!("all pending jobs finished");
        } else {
            tracing::warn!(
                pending = self.pending(),
                "drain timed out, joining workers anyway"
            );
        }

        self.join_workers();
    }

    fn join_workers(&self) {
        let handles: Vec<_> = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        let mut stopped = 0;
        for handle in handles {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if Self::join_with_timeout(handle, self.join_timeout) {
                stopped += 1;
            } else {
                tracing::warn!(worker = %name, "worker did not stop in time, detaching");
            }
        }

        tracing::info!(stopped, total = self.worker_count, "workers stopped");
    }

    /// Espera a que el thread termine como máximo `timeout`.
    ///
    /// `JoinHandle` no tiene join con timeout, así que se revisa
    /// `is_finished` periódicamente y solo se hace join cuando ya terminó.
    fn join_with_timeout(handle: JoinHandle<()>, timeout: Duration) -> bool {
        let start = Instant::now();

        while start.elapsed() < timeout {
            if handle.is_finished() {
                if handle.join().is_err() {
                    tracing::error!("worker thread panicked");
                }
                return true;
            }
            thread::sleep(JOIN_POLL_INTERVAL);
        }

        false
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Sin shutdown explícito los workers quedarían esperando para siempre
        let closed = *self.closed.read().unwrap_or_else(PoisonError::into_inner);
        if !closed {
            self.shutdown();
        }
    }
}
