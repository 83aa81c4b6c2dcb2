//! # Registro de Jobs
//! src/jobs/registry.rs
//!
//! Mapa `JobId -> JobHandle` protegido por un único mutex. Es la única
//! fuente de verdad de "el job X sigue corriendo".
//!
//! Reclamar = verificar que el handle terminó y sacarlo del mapa, todo en
//! la misma sección crítica. Quien toma el lock primero se lo lleva; el
//! otro observador ve la entrada ausente, que también significa "done".
//! Los handles reclamados se devuelven al llamador para que registre los
//! errores fuera del lock.

use crate::jobs::handle::JobHandle;
use crate::jobs::types::{EngineError, JobId, JobStatus};
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Handle retirado del registro, pendiente de log
pub type Reclaimed = (JobId, JobHandle);

/// Registro de jobs en vuelo
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<JobId, JobHandle>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, JobHandle>> {
        // Con el lock tomado solo se encola; nunca corre lógica de jobs
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registra el handle de un job recién despachado
    pub fn insert(&self, job_id: JobId, handle: JobHandle) -> Result<(), EngineError> {
        let mut jobs = self.lock();

        if jobs.contains_key(&job_id) {
            return Err(EngineError::DuplicateJob(job_id));
        }

        jobs.insert(job_id, handle);
        Ok(())
    }

    /// Admite un job: chequeo de duplicado, despacho y alta en una sola
    /// sección crítica
    ///
    /// `dispatch` corre con el lock tomado y solo debe encolar. Si falla,
    /// el registro no cambia.
    pub fn admit<F>(&self, job_id: JobId, dispatch: F) -> Result<(), EngineError>
    where
        F: FnOnce() -> Result<JobHandle, EngineError>,
    {
        let mut jobs = self.lock();

        if jobs.contains_key(&job_id) {
            return Err(EngineError::DuplicateJob(job_id));
        }

        let handle = dispatch()?;
        jobs.insert(job_id, handle);
        Ok(())
    }

    pub fn contains(&self, job_id: JobId) -> bool {
        self.lock().contains_key(&job_id)
    }

    /// Estado de un job, reclamándolo si ya terminó
    pub fn poll(&self, job_id: JobId) -> (JobStatus, Option<Reclaimed>) {
        let mut jobs = self.lock();

        match jobs.get(&job_id) {
            None => (JobStatus::Done, None),
            Some(handle) if !handle.is_finished() => (JobStatus::Running, None),
            Some(_) => {
                let reclaimed = jobs.remove(&job_id).map(|handle| (job_id, handle));
                (JobStatus::Done, reclaimed)
            }
        }
    }

    /// Versión masiva de `poll` para un rango de ids, con un solo lock
    pub fn poll_range(
        &self,
        ids: Range<JobId>,
    ) -> (BTreeMap<JobId, JobStatus>, Vec<Reclaimed>) {
        let mut jobs = self.lock();
        let mut statuses = BTreeMap::new();
        let mut reclaimed = Vec::new();

        for job_id in ids {
            let status = match jobs.get(&job_id) {
                Some(handle) if !handle.is_finished() => JobStatus::Running,
                Some(_) => {
                    if let Some(handle) = jobs.remove(&job_id) {
                        reclaimed.push((job_id, handle));
                    }
                    JobStatus::Done
                }
                None => JobStatus::Done,
            };
            statuses.insert(job_id, status);
        }

        (statuses, reclaimed)
    }

    /// Retira todas las entradas terminadas
    pub fn sweep(&self) -> Vec<Reclaimed> {
        let mut jobs = self.lock();

        let finished: Vec<JobId> = jobs
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(job_id, _)| *job_id)
            .collect();

        finished
            .into_iter()
            .filter_map(|job_id| jobs.remove(&job_id).map(|handle| (job_id, handle)))
            .collect()
    }

    /// Entradas registradas que todavía no terminaron
    pub fn pending(&self) -> usize {
        self.lock()
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Tamaño del registro (terminados sin reclamar incluidos)
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
