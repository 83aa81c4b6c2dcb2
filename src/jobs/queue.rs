//! # Cola de Trabajos del Pool
//! src/jobs/queue.rs
//!
//! Cola FIFO thread-safe entre `dispatch` y los workers.
//! Una vez cerrada no acepta más trabajos, pero los workers siguen
//! sacando los que ya estaban encolados hasta vaciarla.

use crate::jobs::handle::Completion;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// Cuerpo de un trabajo ya ligado a sus argumentos
pub type WorkItem = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// Trabajo encolado junto con la mitad escritora de su handle
pub struct QueuedTask {
    pub work: WorkItem,
    pub completion: Completion,
}

/// Estado protegido por el mutex
struct QueueState {
    tasks: VecDeque<QueuedTask>,
    closed: bool,
}

/// Cola FIFO con cierre
pub struct TaskQueue {
    state: Arc<Mutex<QueueState>>,

    /// Condvar para despertar workers cuando hay trabajo o se cierra
    condvar: Arc<Condvar>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                tasks: VecDeque::new(),
                closed: false,
            })),
            condvar: Arc::new(Condvar::new()),
        }
    }

    /// Encola un trabajo
    ///
    /// Si la cola ya está cerrada devuelve el trabajo al llamador.
    pub fn push(&self, task: QueuedTask) -> Result<(), QueuedTask> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.closed {
            return Err(task);
        }

        state.tasks.push_back(task);
        self.condvar.notify_one();

        Ok(())
    }

    /// Desencola el siguiente trabajo
    ///
    /// Bloquea mientras la cola esté vacía y abierta.
    /// Retorna `None` cuando está cerrada y vacía.
    pub fn pop(&self) -> Option<QueuedTask> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }
            if state.closed {
                return None;
            }

            state = self
                .condvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Cierra la cola y despierta a todos los workers
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.closed = true;
        self.condvar.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }

    /// Trabajos esperando un worker
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tasks
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TaskQueue {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            condvar: Arc::clone(&self.condvar),
        }
    }
}
