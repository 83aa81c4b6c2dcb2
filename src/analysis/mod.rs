//! # Análisis del Dataset
//!
//! Lo que ejecutan los jobs: carga del CSV (`ingestor`), agregaciones
//! puras (`stats`) y las consultas expuestas por la API (`queries`).

pub mod ingestor;
pub mod queries;
pub mod stats;

pub use ingestor::{DataIngestor, IngestError, Row};
pub use queries::{Query, QueryRequest};
