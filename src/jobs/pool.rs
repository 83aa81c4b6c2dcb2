//! # Pool de Workers
//! src/jobs/pool.rs
//!
//! Conjunto fijo de threads que ejecutan los trabajos despachados.
//! Un trabajo que falla (error o panic) no afecta a los demás: el error
//! queda capturado en su handle y el worker toma el siguiente trabajo.

use crate::jobs::handle::JobHandle;
use crate::jobs::queue::{QueuedTask, TaskQueue, WorkItem};
use crate::jobs::types::EngineError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// Operaciones que el motor consume de un ejecutor
///
/// Cualquier sustituto debe aislar fallos por trabajo y drenar la cola
/// al apagarse.
pub trait WorkerPool: Send + Sync {
    /// Encola un trabajo y retorna de inmediato con su handle
    fn dispatch(&self, work: WorkItem) -> Result<JobHandle, EngineError>;

    /// Deja de aceptar trabajos y bloquea hasta que terminen los ya despachados
    fn shutdown(&self);
}

/// Pool de threads de tamaño fijo
pub struct ThreadPool {
    queue: TaskQueue,

    /// Handles de los threads, se vacía en el primer shutdown
    workers: Mutex<Vec<JoinHandle<()>>>,

    size: usize,
}

impl ThreadPool {
    /// Crea el pool y arranca `size` workers (mínimo 1)
    pub fn new(size: usize) -> Result<Self, EngineError> {
        let size = size.max(1);
        let queue = TaskQueue::new();
        let mut workers = Vec::with_capacity(size);

        for i in 0..size {
            let worker_queue = queue.clone();
            let name = format!("job-worker-{}", i);

            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || Self::worker_loop(name, worker_queue));

            match handle {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // No dejar workers huérfanos esperando en la cola
                    queue.close();
                    for worker in workers {
                        let _ = worker.join();
                    }
                    return Err(EngineError::Spawn(e));
                }
            }
        }

        info!(workers = size, "thread pool started");

        Ok(Self {
            queue,
            workers: Mutex::new(workers),
            size,
        })
    }

    /// Número de workers
    pub fn size(&self) -> usize {
        self.size
    }

    /// Trabajos encolados que todavía no tomó ningún worker
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Loop principal del worker
    fn worker_loop(name: String, queue: TaskQueue) {
        debug!(worker = %name, "worker started");

        while let Some(task) = queue.pop() {
            let QueuedTask { work, completion } = task;
            completion.complete(run_isolated(work));
        }

        debug!(worker = %name, "worker stopped");
    }
}

impl WorkerPool for ThreadPool {
    fn dispatch(&self, work: WorkItem) -> Result<JobHandle, EngineError> {
        let (handle, completion) = JobHandle::pair();

        self.queue
            .push(QueuedTask { work, completion })
            .map_err(|_| EngineError::ShutDown)?;

        Ok(handle)
    }

    fn shutdown(&self) {
        self.queue.close();

        // El lock se mantiene durante el join: un segundo llamador
        // concurrente espera el drenaje en vez de volver antes
        let mut guard = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        let workers = std::mem::take(&mut *guard);
        if workers.is_empty() {
            return;
        }

        for worker in workers {
            // worker_loop no hace panic: los trabajos corren dentro de catch_unwind
            let _ = worker.join();
        }

        info!("thread pool drained");
    }
}

/// Ejecuta un trabajo capturando tanto el `Err` como un panic
fn run_isolated(work: WorkItem) -> anyhow::Result<()> {
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(outcome) => outcome,
        Err(payload) => Err(anyhow::anyhow!("job panicked: {}", panic_message(&*payload))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
