//! # Registro de Jobs
//! src/jobs/registry.rs
//!
//! Mapa compartido id -> estado/resultado, protegido por un único Mutex.
//! El lock se mantiene solo durante la operación sobre el mapa, nunca
//! mientras se ejecuta una tarea.

use crate::error::{QueryError, SubmitError};
use crate::jobs::types::{JobOutcome, JobStatus, TaskFailure};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Estado interno de una entrada: el resultado existe solo si es terminal
#[derive(Debug, Clone)]
enum Entry {
    Running,
    Finished(JobOutcome),
}

impl Entry {
    fn status(&self) -> JobStatus {
        match self {
            Entry::Running => JobStatus::Running,
            Entry::Finished(outcome) => outcome.status(),
        }
    }
}

/// Registro thread-safe del ciclo de vida de cada job
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, Entry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // Un panic con el lock tomado no debe inutilizar el registro
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registra un job como `running`.
    ///
    /// Verificación e inserción ocurren en la misma sección crítica.
    pub fn register(&self, id: &str) -> Result<(), SubmitError> {
        let mut jobs = self.lock();
        if jobs.contains_key(id) {
            return Err(SubmitError::DuplicateId(id.to_string()));
        }
        jobs.insert(id.to_string(), Entry::Running);
        Ok(())
    }

    /// Guarda el resultado terminal de un job. Un job ya terminado no cambia.
    fn finish(&self, id: &str, outcome: JobOutcome) {
        let mut jobs = self.lock();
        match jobs.get_mut(id) {
            Some(entry) if matches!(entry, Entry::Running) => {
                *entry = Entry::Finished(outcome);
            }
            Some(_) => {
                tracing::warn!(job_id = id, "ignoring second terminal transition");
            }
            None => {
                tracing::warn!(job_id = id, "finished job was never registered");
            }
        }
    }

    /// Marca el job como completado con su valor
    pub fn mark_done(&self, id: &str, value: serde_json::Value) {
        self.finish(id, JobOutcome::Done(value));
    }

    /// Marca el job como fallido
    pub fn mark_error(&self, id: &str, failure: TaskFailure) {
        self.finish(id, JobOutcome::Error(failure));
    }

    pub fn get_status(&self, id: &str) -> Result<JobStatus, QueryError> {
        self.lock()
            .get(id)
            .map(Entry::status)
            .ok_or_else(|| QueryError::NotFound(id.to_string()))
    }

    pub fn get_result(&self, id: &str) -> Result<JobOutcome, QueryError> {
        match self.lock().get(id) {
            Some(Entry::Finished(outcome)) => Ok(outcome.clone()),
            Some(Entry::Running) => Err(QueryError::NotReady(id.to_string())),
            None => Err(QueryError::NotFound(id.to_string())),
        }
    }

    /// Snapshot del estado de todos los jobs
    pub fn statuses(&self) -> BTreeMap<String, JobStatus> {
        self.lock()
            .iter()
            .map(|(id, entry)| (id.clone(), entry.status()))
            .collect()
    }

    /// Snapshot de los resultados de los jobs terminados
    pub fn outcomes(&self) -> BTreeMap<String, JobOutcome> {
        self.lock()
            .iter()
            .filter_map(|(id, entry)| match entry {
                Entry::Finished(outcome) => Some((id.clone(), outcome.clone())),
                Entry::Running => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
