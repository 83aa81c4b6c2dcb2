//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Un thread por conexión. Cada thread lee un request completo (headers
//! y body según `Content-Length`), lo pasa al router y cierra.

use crate::analysis::DataIngestor;
use crate::api;
use crate::config::Config;
use crate::http::{head_end, Request, Response, StatusCode};
use crate::jobs::{EngineConfig, JobEngine};
use crate::results::ResultStore;
use crate::router::Router;
use crate::server::AppState;
use anyhow::Context;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, error, info, warn};

/// Tamaño máximo aceptado para un request
const MAX_REQUEST_BYTES: usize = 1024 * 1024;

const READ_CHUNK: usize = 8192;

const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Servidor HTTP/1.0
pub struct Server {
    listener: TcpListener,
    router: Arc<Router<AppState>>,
    state: Arc<AppState>,
}

impl Server {
    /// Abre el listener; `127.0.0.1:0` elige un puerto libre
    pub fn bind<A: ToSocketAddrs>(
        address: A,
        router: Router<AppState>,
        state: Arc<AppState>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(address)?;
        Ok(Self {
            listener,
            router: Arc::new(router),
            state,
        })
    }

    /// Arma el servidor completo: dataset, resultados, motor y rutas
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let workers = config.worker_count();
        let data = DataIngestor::from_path(&config.data_file)?;
        let results = ResultStore::new(&config.results_dir)?;
        let engine = JobEngine::new(EngineConfig::new(workers))?;
        info!(workers, "job engine started");

        let router = api::router();
        let state = AppState::new(engine, Arc::new(data), results, router.describe());

        Self::bind(config.address(), router, Arc::new(state))
            .with_context(|| format!("failed to bind {}", config.address()))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Acepta conexiones hasta que el listener falle
    ///
    /// Después de un graceful shutdown sigue atendiendo, para que los
    /// clientes vean `{"status": "shutting down"}`.
    pub fn run(&self) -> io::Result<()> {
        info!(address = %self.local_addr()?, "server listening");

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let router = Arc::clone(&self.router);
                    let state = Arc::clone(&self.state);

                    let peer = stream
                        .peer_addr()
                        .map(|addr| addr.to_string())
                        .unwrap_or_else(|_| "unknown".to_string());
                    debug!(peer = %peer, "connection accepted");

                    thread::spawn(move || {
                        if let Err(e) = handle_connection(stream, &router, &state) {
                            warn!(peer = %peer, error = %e, "connection error");
                        }
                    });
                }
                Err(e) => error!(error = %e, "failed to accept connection"),
            }
        }

        Ok(())
    }
}

fn request_id() -> String {
    let mut hasher = DefaultHasher::new();
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
        .hash(&mut hasher);
    thread::current().id().hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Lee headers y, si hay `Content-Length`, el body completo
fn read_request(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    let wanted = loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Ok(buffer);
        }
        buffer.extend_from_slice(&chunk[..n]);

        if let Some(end) = head_end(&buffer) {
            let body_len = Request::parse(&buffer[..end])
                .ok()
                .and_then(|head| head.content_length())
                .unwrap_or(0);
            break (end + body_len).min(MAX_REQUEST_BYTES);
        }
        if buffer.len() >= MAX_REQUEST_BYTES {
            return Ok(buffer);
        }
    };

    while buffer.len() < wanted {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }

    Ok(buffer)
}

pub(crate) fn handle_connection(
    mut stream: TcpStream,
    router: &Router<AppState>,
    state: &AppState,
) -> io::Result<()> {
    let start = Instant::now();
    let request_id = request_id();

    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    let buffer = read_request(&mut stream)?;

    if buffer.is_empty() {
        debug!("connection closed without data");
        return Ok(());
    }

    let (mut response, method, path) = match Request::parse(&buffer) {
        Ok(request) => {
            let response = router.route(&request, state);
            (response, request.method().as_str(), request.path().to_string())
        }
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "malformed request");
            (
                Response::error(StatusCode::BadRequest, &format!("Invalid: {}", e)),
                "-",
                String::new(),
            )
        }
    };

    response.add_header("X-Request-Id", &request_id);

    stream.write_all(&response.to_bytes())?;
    stream.flush()?;

    info!(
        request_id = %request_id,
        method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_secs_f64() * 1000.0,
        "request served"
    );

    Ok(())
}
