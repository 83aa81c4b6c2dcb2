//! # Motor de Ejecución de Jobs
//! src/jobs/engine.rs
//!
//! Coordina el pool de workers, el registro y el reclaimer. Es la frontera
//! de sincronización entre los threads del front end (submit/consultas) y
//! el reclaimer.
//!
//! ## Ciclo de vida de un job
//!
//! ```text
//! SUBMITTED -> RUNNING -> (COMPLETED | FAILED) -> RECLAIMED
//! ```
//!
//! Hacia afuera solo existen dos estados: `running` y `done`. Un job que
//! falló se reporta como `done`; su error solo se ve en el log, una vez,
//! al reclamarlo.

use crate::jobs::pool::{ThreadPool, WorkerPool};
use crate::jobs::reclaimer::Reclaimer;
use crate::jobs::registry::{JobRegistry, Reclaimed};
use crate::jobs::types::{EngineError, EngineStats, JobId, JobStatus};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Intervalo por defecto entre barridos del reclaimer
pub const RECLAIM_INTERVAL: Duration = Duration::from_secs(2);

/// Configuración del motor
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Número de workers del pool
    pub workers: usize,

    /// Intervalo entre barridos del reclaimer
    pub reclaim_interval: Duration,
}

impl EngineConfig {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            reclaim_interval: RECLAIM_INTERVAL,
        }
    }
}

/// Contadores compartidos con el reclaimer
#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    reclaimed: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    /// Registra en el log cada handle retirado. Se llama fuera del lock.
    fn record(&self, reclaimed: Vec<Reclaimed>) {
        for (job_id, handle) in reclaimed {
            self.reclaimed.fetch_add(1, Ordering::Relaxed);

            match handle.error() {
                Some(err) => {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    error!(job_id, error = %format!("{:#}", err), "job finished with error");
                }
                None => debug!(job_id, "job reclaimed"),
            }
        }
    }

    fn snapshot(&self) -> EngineStats {
        EngineStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            reclaimed: self.reclaimed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Motor de jobs asíncronos
pub struct JobEngine<P: WorkerPool = ThreadPool> {
    pool: P,
    registry: Arc<JobRegistry>,
    reclaimer: Reclaimer,
    counters: Arc<Counters>,
    shutting_down: AtomicBool,
}

impl JobEngine<ThreadPool> {
    /// Crea el motor con un `ThreadPool` de `config.workers` threads
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let pool = ThreadPool::new(config.workers)?;
        Self::with_pool(pool, config.reclaim_interval)
    }

    pub fn workers(&self) -> usize {
        self.pool.size()
    }
}

impl<P: WorkerPool> JobEngine<P> {
    /// Crea el motor sobre cualquier ejecutor que implemente `WorkerPool`
    pub fn with_pool(pool: P, reclaim_interval: Duration) -> Result<Self, EngineError> {
        let registry = Arc::new(JobRegistry::new());
        let counters = Arc::new(Counters::default());

        let reclaimer = {
            let counters = Arc::clone(&counters);
            Reclaimer::spawn(Arc::clone(&registry), reclaim_interval, move |batch| {
                counters.record(batch)
            })
        };

        let reclaimer = match reclaimer {
            Ok(reclaimer) => reclaimer,
            Err(e) => {
                pool.shutdown();
                return Err(e);
            }
        };

        Ok(Self {
            pool,
            registry,
            reclaimer,
            counters,
            shutting_down: AtomicBool::new(false),
        })
    }

    /// Despacha `work(job_id)` al pool y registra su handle
    ///
    /// No espera a que el job termine. El id lo asigna el llamador.
    ///
    /// # Errores
    /// - `EngineError::ShutDown` si `shutdown()` ya empezó
    /// - `EngineError::DuplicateJob` si el id todavía está registrado
    pub fn submit<F>(&self, job_id: JobId, work: F) -> Result<(), EngineError>
    where
        F: FnOnce(JobId) -> anyhow::Result<()> + Send + 'static,
    {
        // El flag se lee bajo el lock del registro: un shutdown que ya lo
        // levantó hace su barrido final después de este alta
        let admitted = self.registry.admit(job_id, || {
            if self.shutting_down.load(Ordering::SeqCst) {
                return Err(EngineError::ShutDown);
            }
            let handle = self.pool.dispatch(Box::new(move || work(job_id)))?;
            self.counters.submitted.fetch_add(1, Ordering::Relaxed);
            Ok(handle)
        });

        if let Err(EngineError::ShutDown) = admitted {
            warn!(job_id, "submit rejected: engine is shutting down");
        }
        admitted?;

        debug!(job_id, "job submitted");
        Ok(())
    }

    /// `true` si el job terminó o nunca existió, `false` si sigue corriendo
    ///
    /// Si lo encuentra terminado lo reclama (y registra su error, si hubo).
    pub fn check_job(&self, job_id: JobId) -> bool {
        let (status, reclaimed) = self.registry.poll(job_id);
        if let Some(entry) = reclaimed {
            self.counters.record(vec![entry]);
        }
        status.is_done()
    }

    /// Estado de cada id en `[1, max_exclusive)`, reclamando los terminados
    pub fn list_statuses(&self, max_exclusive: JobId) -> BTreeMap<JobId, JobStatus> {
        let (statuses, reclaimed) = self.registry.poll_range(1..max_exclusive.max(1));
        self.counters.record(reclaimed);
        statuses
    }

    /// Jobs registrados que todavía no terminaron
    pub fn pending_jobs(&self) -> usize {
        self.registry.pending()
    }

    /// Entradas en el registro, terminadas sin reclamar incluidas
    pub fn tracked_jobs(&self) -> usize {
        self.registry.len()
    }

    pub fn stats(&self) -> EngineStats {
        self.counters.snapshot()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Apaga el motor
    ///
    /// Bloquea hasta que el pool drene todos los jobs despachados (también
    /// los que seguían en cola) y el reclaimer termine. Después hace un
    /// último barrido para registrar los errores del drenaje. Llamarlo
    /// otra vez no bloquea ni falla.
    pub fn shutdown(&self) {
        let first = !self.shutting_down.swap(true, Ordering::SeqCst);
        if first {
            info!("job engine shutting down");
        }

        self.pool.shutdown();
        self.reclaimer.stop();
        self.counters.record(self.registry.sweep());

        if !first {
            return;
        }
        let stats = self.stats();
        info!(
            submitted = stats.submitted,
            reclaimed = stats.reclaimed,
            failed = stats.failed,
            "job engine stopped"
        );
    }
}

impl<P: WorkerPool> Drop for JobEngine<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
