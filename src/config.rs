//! # Configuración del Servidor
//! src/config.rs
//!
//! Argumentos CLI con respaldo en variables de entorno.
//!
//! ### CLI
//! ```bash
//! ./stats_server --port 8080 --threads 8 \
//!   --data-file ./nutrition_activity_obesity_usa_subset.csv
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 TP_NUM_OF_THREADS=8 RESULTS_DIR=/tmp/results ./stats_server
//! ```

use clap::Parser;
use std::num::NonZeroUsize;
use std::thread;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("port must be > 0")]
    InvalidPort,

    #[error("data file path must not be empty")]
    MissingDataFile,

    #[error("results directory must not be empty")]
    MissingResultsDir,
}

/// Configuración del servidor de estadísticas
#[derive(Debug, Clone, Parser)]
#[command(name = "stats_server")]
#[command(about = "Servidor HTTP/1.0 de estadísticas con motor de jobs asíncrono")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "5000", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// CSV con el dataset
    #[arg(
        long = "data-file",
        default_value = "./nutrition_activity_obesity_usa_subset.csv",
        env = "DATA_FILE"
    )]
    pub data_file: String,

    /// Directorio donde se guarda un resultado por job
    #[arg(long = "results-dir", default_value = "./results", env = "RESULTS_DIR")]
    pub results_dir: String,

    /// Workers del pool; si falta o no es válido se usa el número de CPUs
    #[arg(long = "threads", env = "TP_NUM_OF_THREADS")]
    pub threads: Option<String>,

    /// Archivo de log; sin él se escribe a stderr
    #[arg(long = "log-file", env = "LOG_FILE")]
    pub log_file: Option<String>,

    /// Nivel de log (`RUST_LOG` tiene prioridad)
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    pub fn new() -> Self {
        Config::parse()
    }

    /// Dirección para bind (host:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.data_file.trim().is_empty() {
            return Err(ConfigError::MissingDataFile);
        }
        if self.results_dir.trim().is_empty() {
            return Err(ConfigError::MissingResultsDir);
        }
        Ok(())
    }

    /// Workers efectivos del pool
    pub fn worker_count(&self) -> usize {
        resolve_worker_count(self.threads.as_deref())
    }

    /// Resumen de arranque
    pub fn print_summary(&self) {
        println!("=================================");
        println!("  Stats HTTP/1.0 Server");
        println!("=================================");
        println!("   Address:      {}", self.address());
        println!("   Data file:    {}", self.data_file);
        println!("   Results dir:  {}", self.results_dir);
        println!(
            "   Workers:      {}",
            self.threads.as_deref().unwrap_or("auto (CPU count)")
        );
        println!(
            "   Log:          {} ({})",
            self.log_file.as_deref().unwrap_or("stderr"),
            self.log_level
        );
        println!();
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "127.0.0.1".to_string(),
            data_file: "./nutrition_activity_obesity_usa_subset.csv".to_string(),
            results_dir: "./results".to_string(),
            threads: None,
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

/// Número de CPUs, o 1 si no se puede consultar
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Interpreta `TP_NUM_OF_THREADS`
///
/// Un entero `>= 1` gana. Vacío, cero, negativo o no numérico cae al
/// número de CPUs y deja un warning.
pub fn resolve_worker_count(raw: Option<&str>) -> usize {
    let raw = match raw.map(str::trim) {
        None | Some("") => return default_worker_count(),
        Some(raw) => raw,
    };

    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => n,
        _ => {
            let fallback = default_worker_count();
            warn!(value = raw, fallback, "ignoring invalid TP_NUM_OF_THREADS");
            fallback
        }
    }
}
