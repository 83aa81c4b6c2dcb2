//! # Stats Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 que responde consultas estadísticas sobre un dataset
//! CSV. Las consultas son lentas, así que cada una corre como job en un
//! pool de workers: el cliente recibe un `job_id` al instante y después
//! pregunta por el resultado.
//!
//! ## Arquitectura
//!
//! - `jobs`: motor de jobs (pool, registro, reclaimer)
//! - `analysis`: ingesta del CSV y las nueve consultas
//! - `results`: un archivo JSON por job
//! - `http`: parsing y construcción de mensajes HTTP/1.0
//! - `router`: método + path → handler
//! - `api`: endpoints
//! - `server`: listener TCP y estado compartido
//! - `config`, `logging`: ambiente del proceso
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use stats_server::config::Config;
//! use stats_server::server::Server;
//!
//! let config = Config::default();
//! let server = Server::from_config(&config).expect("startup failed");
//! server.run().expect("server error");
//! ```

pub mod analysis;
pub mod api;
pub mod config;
pub mod http;
pub mod jobs;
pub mod logging;
pub mod results;
pub mod router;
pub mod server;
