//! # Resultados de Jobs
//! src/results.rs
//!
//! Un archivo JSON por job: `<dir>/<job_id>`. La escritura es atómica
//! (archivo temporal + rename), así un lector nunca ve un JSON a medias.

use crate::jobs::JobId;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt result file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Directorio de resultados
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    /// Crea el directorio si no existe
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, job_id: JobId) -> PathBuf {
        self.dir.join(job_id.to_string())
    }

    /// Guarda el resultado de un job
    ///
    /// Si algo falla no queda `<job_id>.tmp` en el directorio.
    pub fn write(&self, job_id: JobId, value: &Value) -> Result<(), StoreError> {
        let path = self.path_for(job_id);
        let temp_path = self.dir.join(format!("{}.tmp", job_id));

        let written = write_json(&temp_path, value).and_then(|()| {
            fs::rename(&temp_path, &path).map_err(|e| StoreError::io(&path, e))
        });

        if written.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        written
    }

    /// Lee el resultado; `None` si el archivo no existe
    pub fn read(&self, job_id: JobId) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(job_id);

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        serde_json::from_reader(BufReader::new(file))
            .map(Some)
            .map_err(|source| StoreError::Corrupt { path, source })
    }
}

fn write_json(path: &Path, value: &Value) -> Result<(), StoreError> {
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, value).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|e| StoreError::io(path, e))
}
