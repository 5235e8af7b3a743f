//! # Sistema de Jobs
//!
//! Ejecuta tareas en un pool fijo de threads sin bloquear al llamador.
//!
//! ## Flujo
//!
//! `submit` → registro (`running`) → cola FIFO → worker libre → tarea →
//! registro (`done` / `error`) → archivo `job_<id>.json`.

pub mod id;
pub mod pool;
pub mod queue;
pub mod registry;
pub mod storage;
pub mod types;
pub mod worker;

pub use id::JobIdGenerator;
pub use pool::WorkerPool;
pub use queue::WorkQueue;
pub use registry::JobRegistry;
pub use storage::{FileArchiver, NullArchiver, ResultArchiver};
pub use types::{task, JobOutcome, JobStatus, Payload, Task, TaskFailure};
