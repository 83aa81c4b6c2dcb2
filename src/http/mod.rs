//! # Módulo HTTP
//!
//! Protocolo HTTP/1.0 implementado a mano: parsing de requests (con body
//! para los POST de la API), construcción de responses y status codes.
//!
//! HTTP/1.0 (RFC 1945) no requiere `Host`, no tiene chunked transfer
//! encoding y cierra la conexión después de cada respuesta.

pub mod request;
pub mod response;
pub mod status;

pub use request::{head_end, Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
