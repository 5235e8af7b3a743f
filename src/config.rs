//! # Configuración del Pool
//! src/config.rs
//!
//! Configuración del motor de jobs con soporte para argumentos CLI y
//! variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./app --threads 4 --results-dir ./results --poll-interval-ms 500
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! TP_NUM_OF_THREADS=4 RESULTS_DIR=./results ./app
//! ```

use crate::error::ConfigError;
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// Configuración del pool de workers
#[derive(Debug, Clone, Parser)]
#[command(name = "task_runner")]
#[command(about = "Motor de ejecución asíncrona de jobs")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Número preferido de workers. Se acota a [1, núcleos disponibles];
    /// si falta o no es un entero se usan todos los núcleos.
    #[arg(long = "threads", env = "TP_NUM_OF_THREADS")]
    pub num_threads: Option<String>,

    /// Directorio donde se archivan los resultados (`job_<id>.json`)
    #[arg(long = "results-dir", default_value = "results", env = "RESULTS_DIR")]
    pub results_dir: PathBuf,

    /// Archivar en disco el resultado de cada job
    #[arg(long = "no-archive", action = clap::ArgAction::SetFalse)]
    pub archive_results: bool,

    // === Tiempos ===

    /// Espera máxima de un worker en la cola antes de revisar el shutdown
    #[arg(long = "poll-interval-ms", default_value = "1000", env = "POLL_INTERVAL_MS")]
    pub poll_interval_ms: u64,

    /// Timeout del join de cada worker durante el shutdown
    #[arg(long = "join-timeout-ms", default_value = "5000", env = "JOIN_TIMEOUT_MS")]
    pub join_timeout_ms: u64,

    /// Espera máxima a que se vacíe la cola en el shutdown (0 = sin límite)
    #[arg(long = "drain-timeout-ms", default_value = "600000", env = "DRAIN_TIMEOUT_MS")]
    pub drain_timeout_ms: u64,

    // === Logging ===

    /// Filtro de logs cuando RUST_LOG no está definido
    #[arg(long = "log", default_value = "info", env = "LOG_FILTER")]
    pub log_filter: String,
}

/// Acota la preferencia de workers a `[1, available]`.
///
/// Una preferencia ausente o que no parsea como entero usa `available`.
pub fn worker_count(preference: Option<&str>, available: usize) -> usize {
    let available = available.max(1);
    match preference.map(|p| p.trim().parse::<i64>()) {
        Some(Ok(n)) => n.clamp(1, available as i64) as usize,
        _ => available,
    }
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI y entorno
    pub fn new() -> Self {
        Config::parse()
    }

    /// Workers efectivos según los núcleos de esta máquina
    pub fn effective_workers(&self) -> usize {
        let available = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        worker_count(self.num_threads.as_deref(), available)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Option<Duration> {
        (self.drain_timeout_ms > 0).then(|| Duration::from_millis(self.drain_timeout_ms))
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "poll interval must be > 0".to_string(),
            ));
        }
        if self.join_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "join timeout must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Loguea un resumen de la configuración
    pub fn log_summary(&self) {
        tracing::info!(
            workers = self.effective_workers(),
            requested = self.num_threads.as_deref().unwrap_or("auto"),
            results_dir = %self.results_dir.display(),
            archive = self.archive_results,
            poll_interval_ms = self.poll_interval_ms,
            join_timeout_ms = self.join_timeout_ms,
            drain_timeout_ms = self.drain_timeout_ms,
            "task runner configuration"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            num_threads: None,
            results_dir: PathBuf::from("results"),
            archive_results: true,
            poll_interval_ms: 1_000,
            join_timeout_ms: 5_000,
            drain_timeout_ms: 600_000,
            log_filter: "info".to_string(),
        }
    }
}
