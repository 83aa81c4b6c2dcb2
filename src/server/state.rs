//! # Estado Compartido del Servidor
//! src/server/state.rs
//!
//! Lo que ven todos los threads de conexión: el motor de jobs, el dataset,
//! el directorio de resultados y el contador de ids.

use crate::analysis::{DataIngestor, Query, QueryRequest};
use crate::http::Method;
use crate::jobs::{job_label, EngineError, JobEngine, JobId};
use crate::results::ResultStore;
use anyhow::Context;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

pub struct AppState {
    engine: JobEngine,
    data: Arc<DataIngestor>,
    results: ResultStore,

    /// Próximo id a entregar; el mayor entregado es `next - 1`
    next_job_id: Mutex<JobId>,
    running: AtomicBool,
    routes: Vec<(Method, String)>,
}

impl AppState {
    pub fn new(
        engine: JobEngine,
        data: Arc<DataIngestor>,
        results: ResultStore,
        routes: Vec<(Method, String)>,
    ) -> Self {
        Self {
            engine,
            data,
            results,
            next_job_id: Mutex::new(1),
            running: AtomicBool::new(true),
            routes,
        }
    }

    pub fn engine(&self) -> &JobEngine {
        &self.engine
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    pub fn data(&self) -> &DataIngestor {
        &self.data
    }

    pub fn routes(&self) -> &[(Method, String)] {
        &self.routes
    }

    /// Próximo id; ningún id `>=` a este fue entregado
    pub fn next_job_id(&self) -> JobId {
        *self.next_job_id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Entrega un id nuevo y despacha la consulta
    ///
    /// El contador solo avanza si el motor aceptó el job, así que un
    /// submit rechazado no consume id. El job escribe su resultado en
    /// `<results>/<job_id>`.
    pub fn submit_query(&self, query: Query, request: QueryRequest) -> Result<JobId, EngineError> {
        let mut next = self.next_job_id.lock().unwrap_or_else(PoisonError::into_inner);
        let job_id = *next;

        let data = Arc::clone(&self.data);
        let results = self.results.clone();

        self.engine.submit(job_id, move |job_id| {
            let value = query.evaluate(&data, &request);
            results
                .write(job_id, &value)
                .with_context(|| format!("failed to store result of {}", job_label(job_id)))
        })?;

        *next += 1;
        info!(job_id, query = query.name(), "query submitted");
        Ok(job_id)
    }

    /// Marca el servidor como apagándose y espera a que el motor drene
    ///
    /// Devuelve `false` si ya se había pedido antes.
    pub fn shutdown(&self) -> bool {
        let first = self.running.swap(false, Ordering::SeqCst);
        if first {
            info!("graceful shutdown requested");
        }
        self.engine.shutdown();
        first
    }
}
