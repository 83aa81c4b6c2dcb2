//! # Tipos del Motor de Jobs
//! src/jobs/types.rs
//!
//! Define los tipos compartidos por el pool, el registro y el motor.

use serde::{Deserialize, Serialize};

/// Identificador de job.
///
/// Lo asigna el front end (entero positivo, estrictamente creciente);
/// el motor nunca genera identificadores, solo los usa como clave.
pub type JobId = u64;

/// Estado observable de un job
///
/// El motor no distingue entre "en cola" y "ejecutándose", ni entre
/// "terminó bien" y "terminó con error".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job enviado y todavía sin terminar
    Running,

    /// Job terminado, reclamado o desconocido
    Done,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Done => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, JobStatus::Done)
    }
}

impl From<bool> for JobStatus {
    /// `true` significa terminado, igual que `check_job`
    fn from(done: bool) -> Self {
        if done {
            JobStatus::Done
        } else {
            JobStatus::Running
        }
    }
}

/// Etiqueta pública de un job en los listados (`job_id_<n>`)
pub fn job_label(job_id: JobId) -> String {
    format!("job_id_{}", job_id)
}

/// Errores del motor de jobs
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// El motor (o su pool) ya empezó a apagarse
    #[error("job engine is shutting down")]
    ShutDown,

    /// El id todavía está registrado con un handle vivo
    #[error("job {0} is already registered")]
    DuplicateJob(JobId),

    /// No se pudo crear un thread del pool o del reclaimer
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Contadores acumulados del motor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Jobs aceptados por `submit`
    pub submitted: u64,

    /// Handles retirados del registro (una vez por job)
    pub reclaimed: u64,

    /// De los reclamados, cuántos terminaron con error
    pub failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_serialization() {
        let json = serde_json::to_string(&JobStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");

        let json = serde_json::to_string(&JobStatus::Done).unwrap();
        assert_eq!(json, "\"done\"");
    }

    #[test]
    fn test_job_status_from_bool() {
        assert_eq!(JobStatus::from(true), JobStatus::Done);
        assert_eq!(JobStatus::from(false), JobStatus::Running);
        assert!(JobStatus::Done.is_done());
        assert!(!JobStatus::Running.is_done());
    }

    #[test]
    fn test_job_label() {
        assert_eq!(job_label(1), "job_id_1");
        assert_eq!(job_label(42), "job_id_42");
    }

    #[test]
    fn test_engine_error_messages() {
        assert_eq!(EngineError::ShutDown.to_string(), "job engine is shutting down");
        assert_eq!(
            EngineError::DuplicateJob(7).to_string(),
            "job 7 is already registered"
        );
    }
}
