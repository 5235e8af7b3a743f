//! # Archivo de Resultados
//! src/jobs/storage.rs
//!
//! Persistencia best-effort del resultado terminal de cada job: un archivo
//! JSON por id (`job_{id}.json`). Un fallo aquí se loguea y no altera el
//! estado en memoria del job.

use crate::error::ArchiveError;
use crate::jobs::types::JobOutcome;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Destino donde se escribe cada resultado terminal
pub trait ResultArchiver: Send + Sync {
    fn archive(&self, job_id: &str, outcome: &JobOutcome) -> Result<(), ArchiveError>;
}

/// Escribe cada resultado en `<dir>/job_<id>.json`
#[derive(Debug, Clone)]
pub struct FileArchiver {
    dir: PathBuf,
}

impl FileArchiver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Ruta del registro de un job
    pub fn path_for(&self, job_id: &str) -> PathBuf {
        self.dir.join(format!("job_{}.json", job_id))
    }

    fn write(&self, job_id: &str, outcome: &JobOutcome) -> Result<(), ArchiveError> {
        let io_err = |source: std::io::Error| ArchiveError::Io {
            job_id: job_id.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;

        // Escribir a un temporal y renombrar (atómico en sistemas Unix)
        let path = self.path_for(job_id);
        let temp_path = path.with_extension("json.tmp");
        let file = File::create(&temp_path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, outcome).map_err(|source| {
            ArchiveError::Serialize {
                job_id: job_id.to_string(),
                source,
            }
        })?;
        writer.flush().map_err(io_err)?;
        drop(writer);

        fs::rename(&temp_path, &path).map_err(io_err)?;
        Ok(())
    }
}

impl ResultArchiver for FileArchiver {
    fn archive(&self, job_id: &str, outcome: &JobOutcome) -> Result<(), ArchiveError> {
        self.write(job_id, outcome)
    }
}

/// Descarta los resultados
#[derive(Debug, Clone, Copy, Default)]
pub struct NullArchiver;

impl ResultArchiver for NullArchiver {
    fn archive(&self, _job_id: &str, _outcome: &JobOutcome) -> Result<(), ArchiveError> {
        Ok(())
    }
}
