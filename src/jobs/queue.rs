//! # Cola FIFO de Jobs
//! src/jobs/queue.rs
//!
//! Cola thread-safe sin límite de capacidad. Además de los jobs pendientes
//! lleva la cuenta de los jobs "sin terminar" (encolados + en ejecución)
//! para poder esperar a que el sistema se vacíe durante el shutdown.

use crate::jobs::types::{Payload, Task};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Job pendiente: (tarea, payload, id)
pub struct QueuedJob {
    pub id: String,
    pub task: Task,
    pub payload: Payload,
}

impl fmt::Debug for QueuedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedJob")
            .field("id", &self.id)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

/// Estado protegido por el Mutex
#[derive(Default)]
struct QueueState {
    items: VecDeque<QueuedJob>,

    /// Jobs encolados que todavía no reportaron `task_done`
    unfinished: usize,
}

/// Cola FIFO compartida entre el pool y sus workers
#[derive(Default)]
pub struct WorkQueue {
    state: Arc<Mutex<QueueState>>,

    /// Notifica a workers esperando cuando llega un job
    available: Arc<Condvar>,

    /// Notifica cuando `unfinished` llega a cero
    drained: Arc<Condvar>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola un job. Nunca bloquea al llamador.
    pub fn enqueue(&self, job: QueuedJob) {
        let mut state = self.lock();
        state.items.push_back(job);
        state.unfinished += 1;

        self.available.notify_one();
    }

    /// Desencola el job más antiguo, esperando como máximo `timeout`.
    ///
    /// Retorna `None` si no llegó nada dentro del plazo.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<QueuedJob> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();

        loop {
            if let Some(job) = state.items.pop_front() {
                return Some(job);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }

            state = self
                .available
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Reporta que un job desencolado terminó (con éxito o no)
    pub fn task_done(&self) {
        let mut state = self.lock();
        if state.unfinished == 0 {
            tracing::warn!("task_done called more times than jobs were enqueued");
            return;
        }

        state.unfinished -= 1;
        if state.unfinished == 0 {
            self.drained.notify_all();
        }
    }

    /// Bloquea hasta que no queden jobs encolados ni en ejecución.
    ///
    /// Con `timeout` la espera está acotada; retorna `false` si el plazo
    /// venció antes de vaciarse.
    pub fn wait_drained(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.lock();

        while state.unfinished > 0 {
            state = match deadline {
                None => self
                    .drained
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return false;
                    }
                    self.drained
                        .wait_timeout(state, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }

        true
    }

    /// Jobs esperando a un worker
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Jobs encolados + en ejecución
    pub fn outstanding(&self) -> usize {
        self.lock().unfinished
    }
}

impl Clone for WorkQueue {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            available: Arc::clone(&self.available),
            drained: Arc::clone(&self.drained),
        }
    }
}
