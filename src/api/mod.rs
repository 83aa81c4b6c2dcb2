//! # API HTTP
//!
//! Front end del motor de jobs. Entrega los ids, decodifica los bodies y
//! responde estados y resultados.

pub mod handlers;

use crate::analysis::Query;
use crate::http::Method;
use crate::router::Router;
use crate::server::AppState;

/// Router con todas las rutas de la API
pub fn router() -> Router<AppState> {
    let mut router = Router::new();

    for query in Query::ALL {
        router.register(
            Method::POST,
            &format!("/api/{}", query.name()),
            handlers::query_handler,
        );
    }

    router.register_prefix(Method::GET, handlers::RESULTS_PREFIX, handlers::get_results_handler);
    router.register(Method::GET, "/api/jobs", handlers::jobs_handler);
    router.register(Method::GET, "/api/num_jobs", handlers::num_jobs_handler);
    router.register(
        Method::GET,
        "/api/graceful_shutdown",
        handlers::graceful_shutdown_handler,
    );
    // Nombre histórico del endpoint, los clientes viejos lo usan
    router.register(
        Method::GET,
        "/api/gracefull_shutdown",
        handlers::graceful_shutdown_handler,
    );
    router.register(Method::GET, "/", handlers::index_handler);
    router.register(Method::GET, "/index", handlers::index_handler);

    router
}
