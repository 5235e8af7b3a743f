//! # Task Runner
//! src/lib.rs
//!
//! Motor de ejecución asíncrona de jobs: una cola FIFO, un pool fijo de
//! workers, un registro de estados/resultados y un shutdown ordenado que
//! vacía la cola antes de detener los threads.
//!
//! ## Arquitectura
//!
//! - `jobs`: cola, workers, registro, archivo de resultados y el pool
//! - `config`: configuración por CLI y variables de entorno
//! - `error`: errores tipados del motor
//! - `logging`: inicialización de `tracing`
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use serde_json::json;
//! use task_runner::config::Config;
//! use task_runner::jobs::{task, WorkerPool};
//!
//! let config = Config::default();
//! task_runner::logging::init_logging(&config.log_filter);
//!
//! let pool = WorkerPool::new(&config).expect("Error al iniciar el pool");
//! let double = task(|p| Ok(json!(p["n"].as_i64().unwrap_or(0) * 2)));
//! let id = pool.submit_new(double, json!({"n": 21})).unwrap();
//!
//! pool.shutdown();
//! println!("{:?}", pool.result(&id));
//! ```

pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;

pub use config::Config;
pub use error::{ArchiveError, ConfigError, PoolError, QueryError, SubmitError};
pub use jobs::{JobOutcome, JobStatus, Task, TaskFailure, WorkerPool};
