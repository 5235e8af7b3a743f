//! # Errores del Motor de Jobs
//! src/error.rs
//!
//! Todas las condiciones esperadas (id duplicado, pool cerrado, job
//! inexistente) son variantes ordinarias de retorno, nunca panics.

use std::io;
use thiserror::Error;

/// Errores al admitir un job nuevo
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// Ya existe un job registrado con ese id
    #[error("Duplicate job ID: {0}")]
    DuplicateId(String),

    /// El pool ya inició el shutdown y no admite más trabajo
    #[error("Pool is shutting down, job rejected")]
    Rejected,
}

/// Errores al consultar el estado o resultado de un job
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Job not found: {0}")]
    NotFound(String),

    /// El job existe pero todavía no llegó a un estado terminal
    #[error("Job {0} is still running")]
    NotReady(String),
}

/// Fallo al persistir el resultado de un job en disco
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to write result for job {job_id}: {source}")]
    Io {
        job_id: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize result for job {job_id}: {source}")]
    Serialize {
        job_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuración inválida
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidValue(String),
}

/// Errores al construir el pool de workers
#[derive(Debug, Error)]
pub enum PoolError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// El sistema operativo no pudo lanzar un thread
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
}
