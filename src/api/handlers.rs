//! # Handlers de la API
//! src/api/handlers.rs
//!
//! - `POST /api/<consulta>`: encola una de las nueve consultas
//! - `GET /api/get_results/<id>`: estado o resultado de un job
//! - `GET /api/jobs`: estado de todos los ids entregados
//! - `GET /api/num_jobs`: cantidad de ids entregados
//! - `GET /api/graceful_shutdown`: apaga el motor de jobs
//! - `GET /` y `/index`: lista de rutas

use crate::analysis::{Query, QueryRequest};
use crate::http::{Request, Response, StatusCode};
use crate::jobs::{job_label, EngineError, JobId};
use crate::server::AppState;
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

pub const RESULTS_PREFIX: &str = "/api/get_results/";

/// Handler común de las nueve consultas; la ruta decide cuál
///
/// # Ejemplo de response
/// ```json
/// {"job_id": 1}
/// ```
pub fn query_handler(req: &Request, state: &AppState) -> Response {
    let name = req.path().trim_start_matches("/api/");
    let query = match Query::from_name(name) {
        Some(query) => query,
        None => {
            return Response::error(
                StatusCode::NotFound,
                &format!("Unknown query: {}", name),
            )
        }
    };

    let body: QueryRequest = match req.json() {
        Ok(body) => body,
        Err(e) => {
            warn!(path = req.path(), error = %e, "rejected request body");
            return Response::error(StatusCode::BadRequest, "Invalid JSON body");
        }
    };

    info!(path = req.path(), question = ?body.question, state = ?body.state, "query request");

    match state.submit_query(query, body) {
        Ok(job_id) => Response::json(&json!({ "job_id": job_id })),
        Err(EngineError::ShutDown) => {
            Response::error(StatusCode::ServiceUnavailable, "shutting down")
        }
        Err(e) => {
            error!(error = %e, "failed to submit query");
            Response::error(StatusCode::InternalServerError, &e.to_string())
        }
    }
}

/// `GET /api/get_results/<id>`
pub fn get_results_handler(req: &Request, state: &AppState) -> Response {
    let raw_id = req.path().trim_start_matches(RESULTS_PREFIX);
    info!(job_id = raw_id, "result request");

    if !state.is_running() {
        return Response::json(&json!({ "status": "shutting down" }));
    }

    let job_id = match parse_job_id(raw_id, state.next_job_id()) {
        Some(job_id) => job_id,
        None => return invalid_job_id(),
    };

    if !state.engine().check_job(job_id) {
        return Response::json(&json!({ "status": "running" }));
    }

    match state.results().read(job_id) {
        Ok(Some(data)) => Response::json(&json!({ "status": "done", "data": data })),
        Ok(None) => Response::json(&json!({ "status": "error", "reason": "File not found" })),
        Err(e) => {
            error!(job_id, error = %e, "failed to read result");
            Response::error(StatusCode::InternalServerError, &e.to_string())
        }
    }
}

/// `GET /api/jobs`
///
/// ```json
/// {"job_id_1": "done", "job_id_2": "running"}
/// ```
pub fn jobs_handler(_req: &Request, state: &AppState) -> Response {
    let statuses: Map<String, Value> = state
        .engine()
        .list_statuses(state.next_job_id())
        .into_iter()
        .map(|(job_id, status)| (job_label(job_id), Value::from(status.as_str())))
        .collect();

    Response::json(&Value::Object(statuses))
}

/// `GET /api/num_jobs`
///
/// Tamaño del mismo listado que `/api/jobs`, terminados incluidos
pub fn num_jobs_handler(_req: &Request, state: &AppState) -> Response {
    let issued = state.engine().list_statuses(state.next_job_id()).len();
    Response::json(&json!({ "num_jobs": issued }))
}

/// `GET /api/graceful_shutdown`
///
/// Bloquea hasta que el motor drene la cola. El listener sigue atendiendo.
pub fn graceful_shutdown_handler(_req: &Request, state: &AppState) -> Response {
    state.shutdown();
    Response::json(&json!({ "status": "shutting down" }))
}

/// `GET /` y `GET /index`
pub fn index_handler(_req: &Request, state: &AppState) -> Response {
    let mut body = String::from(
        "Hello, World!\n Interact with the webserver using one of the defined routes:\n",
    );
    for (method, path) in state.routes() {
        body.push_str(&format!(
            "<p>Endpoint: \"{}\" Methods: \"{}\"</p>",
            path, method
        ));
    }
    Response::html(&body)
}

/// Id numérico, mayor que cero y ya entregado
fn parse_job_id(raw: &str, next_job_id: JobId) -> Option<JobId> {
    raw.parse::<JobId>()
        .ok()
        .filter(|&job_id| job_id >= 1 && job_id < next_job_id)
}

fn invalid_job_id() -> Response {
    Response::json(&json!({ "status": "error", "reason": "Invalid job_id" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_id() {
        assert_eq!(parse_job_id("1", 2), Some(1));
        assert_eq!(parse_job_id("0", 5), None);
        assert_eq!(parse_job_id("5", 5), None);
        assert_eq!(parse_job_id("abc", 5), None);
        assert_eq!(parse_job_id("-1", 5), None);
        assert_eq!(parse_job_id("", 5), None);
    }
}
