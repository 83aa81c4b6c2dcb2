//! # Reclaimer
//! src/jobs/reclaimer.rs
//!
//! Thread de fondo que cada `interval` barre el registro y retira los
//! jobs terminados, aunque nadie haya consultado su estado.
//! La espera ocurre fuera del lock del registro; el barrido toma el lock
//! una sola vez por tick.

use crate::jobs::registry::{JobRegistry, Reclaimed};
use crate::jobs::types::EngineError;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// Señal de parada compartida con el thread
#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

impl StopSignal {
    fn stop(&self) {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.condvar.notify_all();
    }

    /// Espera hasta `timeout` o hasta la señal. Retorna `true` si hay que parar.
    fn wait(&self, timeout: Duration) -> bool {
        let stopped = self.stopped.lock().unwrap_or_else(PoisonError::into_inner);
        let (stopped, _) = self
            .condvar
            .wait_timeout_while(stopped, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *stopped
    }
}

/// Barredor periódico del registro
pub struct Reclaimer {
    signal: Arc<StopSignal>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Reclaimer {
    /// Arranca el thread de barrido
    ///
    /// `on_reclaim` recibe cada lote retirado, ya fuera del lock.
    pub fn spawn<F>(
        registry: Arc<JobRegistry>,
        interval: Duration,
        on_reclaim: F,
    ) -> Result<Self, EngineError>
    where
        F: Fn(Vec<Reclaimed>) + Send + 'static,
    {
        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);

        let thread = thread::Builder::new()
            .name("job-reclaimer".to_string())
            .spawn(move || {
                debug!(interval_ms = interval.as_millis() as u64, "reclaimer started");

                while !thread_signal.wait(interval) {
                    let reclaimed = registry.sweep();
                    if !reclaimed.is_empty() {
                        debug!(count = reclaimed.len(), "reclaimer sweep");
                        on_reclaim(reclaimed);
                    }
                }

                debug!("reclaimer stopped");
            })?;

        Ok(Self {
            signal,
            thread: Mutex::new(Some(thread)),
        })
    }

    /// Señala la parada y espera a que el thread termine. Idempotente.
    pub fn stop(&self) {
        self.signal.stop();

        let thread = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(thread) = thread {
            let _ = thread.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }
}
