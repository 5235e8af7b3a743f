//! # Generador de IDs de Jobs
//! src/jobs/id.rs
//!
//! Contador monótono compartido: "1", "2", "3", ...

use std::sync::atomic::{AtomicU64, Ordering};

/// Genera ids únicos y estrictamente crecientes, seguro entre threads
#[derive(Debug, Default)]
pub struct JobIdGenerator {
    counter: AtomicU64,
}

impl JobIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Avanza el contador y retorna el nuevo valor en decimal
    pub fn next_id(&self) -> String {
        let id = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        id.to_string()
    }
}
