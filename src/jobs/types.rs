//! # Tipos del Sistema de Jobs
//! src/jobs/types.rs
//!
//! Define el estado de un job, el resultado terminal y la firma de las
//! tareas que ejecutan los workers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

/// Entrada opaca de una tarea. El motor nunca la inspecciona.
pub type Payload = Value;

/// Tarea ejecutable asociada a un job.
///
/// Recibe el payload y produce un valor JSON o un `TaskFailure`.
/// Se comparte entre threads, por eso va detrás de un `Arc`.
pub type Task = Arc<dyn Fn(&Payload) -> Result<Value, TaskFailure> + Send + Sync>;

/// Envuelve un closure como `Task`
pub fn task<F>(f: F) -> Task
where
    F: Fn(&Payload) -> Result<Value, TaskFailure> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Estado de un job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Aceptado y pendiente o en ejecución
    Running,

    /// Completado exitosamente
    Done,

    /// Falló durante la ejecución
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

/// Descripción estructurada de una tarea que falló
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct TaskFailure {
    /// Mensaje legible del fallo
    #[serde(rename = "error")]
    pub message: String,

    /// Categoría del fallo (p. ej. "panic", "ValueError")
    #[serde(rename = "type")]
    pub kind: String,
}

impl TaskFailure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Convierte cualquier error en un fallo de categoría "error"
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        Self::new("error", err.to_string())
    }

    /// Construye el fallo a partir del payload de un panic
    pub(crate) fn from_panic(panic: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = panic.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = panic.downcast_ref::<String>() {
            s.clone()
        } else {
            "task panicked".to_string()
        };
        Self::new("panic", message)
    }
}

/// Resultado terminal de un job.
///
/// Serializa como el valor de la tarea cuando terminó bien, o como
/// `{"error": ..., "type": ...}` cuando falló.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobOutcome {
    Done(Value),
    Error(TaskFailure),
}

impl JobOutcome {
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Done(_) => JobStatus::Done,
            JobOutcome::Error(_) => JobStatus::Error,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            JobOutcome::Done(value) => Some(value),
            JobOutcome::Error(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        match self {
            JobOutcome::Done(_) => None,
            JobOutcome::Error(failure) => Some(failure),
        }
    }
}

impl From<Result<Value, TaskFailure>> for JobOutcome {
    fn from(result: Result<Value, TaskFailure>) -> Self {
        match result {
            Ok(value) => JobOutcome::Done(value),
            Err(failure) => JobOutcome::Error(failure),
        }
    }
}
