//! # Sistema de Routing
//! src/router/mod.rs
//!
//! ```text
//! Request → Router → Handler(request, estado) → Response
//! ```
//!
//! Cada ruta tiene método y patrón. El patrón es exacto (`/api/jobs`) o
//! un prefijo (`/api/get_results/`) cuyo resto lee el handler. Sin ruta
//! para el path → 404; path conocido con otro método → 405.

use crate::http::{Method, Request, Response, StatusCode};

/// Un handler recibe el request y el estado compartido del servidor
pub type Handler<S> = fn(&Request, &S) -> Response;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Exact(String),
    Prefix(String),
}

impl Pattern {
    fn matches(&self, path: &str) -> bool {
        match self {
            Pattern::Exact(p) => p == path,
            Pattern::Prefix(p) => path.starts_with(p.as_str()),
        }
    }

    /// Forma legible, `<id>` marca el segmento variable
    pub fn display(&self) -> String {
        match self {
            Pattern::Exact(p) => p.clone(),
            Pattern::Prefix(p) => format!("{}<id>", p),
        }
    }
}

struct Route<S> {
    method: Method,
    pattern: Pattern,
    handler: Handler<S>,
}

/// Router genérico sobre el estado que reciben los handlers
pub struct Router<S> {
    routes: Vec<Route<S>>,
}

impl<S> Router<S> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta exacta
    ///
    /// ```
    /// use stats_server::router::Router;
    /// use stats_server::http::{Method, Request, Response};
    /// use serde_json::json;
    ///
    /// fn hello(_req: &Request, _state: &()) -> Response {
    ///     Response::json(&json!({"message": "hello"}))
    /// }
    ///
    /// let mut router = Router::new();
    /// router.register(Method::GET, "/hello", hello);
    ///
    /// let request = Request::parse(b"GET /hello HTTP/1.0\r\n\r\n").unwrap();
    /// assert!(router.route(&request, &()).status().is_success());
    /// ```
    pub fn register(&mut self, method: Method, path: &str, handler: Handler<S>) {
        self.routes.push(Route {
            method,
            pattern: Pattern::Exact(path.to_string()),
            handler,
        });
    }

    /// Registra una ruta por prefijo (`/api/get_results/` atiende `/api/get_results/7`)
    pub fn register_prefix(&mut self, method: Method, prefix: &str, handler: Handler<S>) {
        self.routes.push(Route {
            method,
            pattern: Pattern::Prefix(prefix.to_string()),
            handler,
        });
    }

    /// Ejecuta el handler que corresponde al request
    ///
    /// Las rutas exactas tienen prioridad sobre los prefijos.
    pub fn route(&self, request: &Request, state: &S) -> Response {
        let path = request.path();

        let candidates: Vec<&Route<S>> = {
            let exact: Vec<&Route<S>> = self
                .routes
                .iter()
                .filter(|r| matches!(r.pattern, Pattern::Exact(_)) && r.pattern.matches(path))
                .collect();
            if exact.is_empty() {
                self.routes
                    .iter()
                    .filter(|r| r.pattern.matches(path))
                    .collect()
            } else {
                exact
            }
        };

        let mut response = if candidates.is_empty() {
            Response::error(StatusCode::NotFound, &format!("Route not found: {}", path))
        } else {
            match candidates.iter().find(|r| r.method == request.method()) {
                Some(route) => (route.handler)(request, state),
                None => Response::error(
                    StatusCode::MethodNotAllowed,
                    &format!("Method {} not allowed for {}", request.method(), path),
                ),
            }
        };

        Self::add_common_headers(&mut response);
        response
    }

    /// Rutas registradas, en orden de registro
    pub fn describe(&self) -> Vec<(Method, String)> {
        self.routes
            .iter()
            .map(|r| (r.method, r.pattern.display()))
            .collect()
    }

    fn add_common_headers(response: &mut Response) {
        response.add_header("Server", "StatsServer-HTTP/1.0");
        response.add_header("Connection", "close");
    }
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}
