//! # Sistema de Jobs
//!
//! Motor asíncrono que ejecuta los trabajos largos sin bloquear las
//! conexiones HTTP: el front end hace `submit` con un id, recibe el id
//! de inmediato y después consulta el estado.
//!
//! ## Componentes
//!
//! - `pool`: workers de tamaño fijo
//! - `registry`: mapa id -> handle bajo un mutex
//! - `reclaimer`: barrido periódico de jobs terminados
//! - `engine`: submit / check_job / list_statuses / shutdown

pub mod engine;
pub mod handle;
pub mod pool;
pub mod queue;
pub mod reclaimer;
pub mod registry;
pub mod types;

pub use engine::{EngineConfig, JobEngine, RECLAIM_INTERVAL};
pub use handle::JobHandle;
pub use pool::{ThreadPool, WorkerPool};
pub use types::{job_label, EngineError, EngineStats, JobId, JobStatus};
