//! # Logging
//! src/logging.rs
//!
//! Inicializa `tracing-subscriber`. `RUST_LOG` tiene prioridad sobre el
//! filtro configurado.

use tracing_subscriber::EnvFilter;

/// Instala el subscriber global de logs.
///
/// Si ya hay uno instalado (p. ej. en tests) no hace nada.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false)
        .try_init();
}
