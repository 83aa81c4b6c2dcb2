//! # Handle de Job
//! src/jobs/handle.rs
//!
//! Token de ejecución que devuelve el pool al despachar un trabajo.
//! Se escribe una sola vez (desde el worker) y se lee desde el registro.
//!
//! ```text
//!   worker ──Completion::complete()──▶ [OnceLock<outcome>] ◀──is_finished()── registro
//! ```

use std::sync::{Arc, OnceLock};

/// Resultado capturado de un job
type Outcome = Result<(), anyhow::Error>;

/// Handle de un job despachado
///
/// Expone exactamente tres hechos: sin terminar, terminado bien,
/// terminado con error (y en ese caso el error capturado).
#[derive(Debug)]
pub struct JobHandle {
    outcome: Arc<OnceLock<Outcome>>,
}

/// Mitad escritora del handle, la consume el worker al terminar
#[derive(Debug)]
pub struct Completion {
    outcome: Arc<OnceLock<Outcome>>,
}

impl JobHandle {
    /// Crea un par handle/completion vacío
    pub fn pair() -> (JobHandle, Completion) {
        let outcome = Arc::new(OnceLock::new());
        (
            JobHandle { outcome: Arc::clone(&outcome) },
            Completion { outcome },
        )
    }

    /// Verifica si el job ya terminó (bien o con error)
    pub fn is_finished(&self) -> bool {
        self.outcome.get().is_some()
    }

    /// Error capturado, solo si el job terminó y falló
    pub fn error(&self) -> Option<&anyhow::Error> {
        match self.outcome.get() {
            Some(Err(error)) => Some(error),
            _ => None,
        }
    }
}

impl Completion {
    /// Publica el resultado del job. Consume la completion: no hay segunda escritura.
    pub fn complete(self, outcome: Result<(), anyhow::Error>) {
        // Solo existe una Completion por handle, así que el set no puede fallar
        let _ = self.outcome.set(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::thread;

    #[test]
    fn test_new_handle_is_unfinished() {
        let (handle, _completion) = JobHandle::pair();
        assert!(!handle.is_finished());
        assert!(handle.error().is_none());
    }

    #[test]
    fn test_completed_ok() {
        let (handle, completion) = JobHandle::pair();
        completion.complete(Ok(()));

        assert!(handle.is_finished());
        assert!(handle.error().is_none());
    }

    #[test]
    fn test_completed_with_error() {
        let (handle, completion) = JobHandle::pair();
        completion.complete(Err(anyhow!("bad input")));

        assert!(handle.is_finished());
        assert_eq!(handle.error().unwrap().to_string(), "bad input");
    }

    #[test]
    fn test_complete_from_other_thread() {
        let (handle, completion) = JobHandle::pair();

        thread::spawn(move || completion.complete(Ok(())))
            .join()
            .unwrap();

        assert!(handle.is_finished());
    }

    #[test]
    fn test_dropped_completion_leaves_handle_unfinished() {
        let (handle, completion) = JobHandle::pair();
        drop(completion);
        assert!(!handle.is_finished());
    }
}
