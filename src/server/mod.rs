//! # Servidor HTTP
//! src/server/mod.rs
//!
//! Listener TCP con un thread por conexión (`tcp`) y el estado que
//! comparten esos threads (`state`).

pub mod state;
pub mod tcp;

pub use state::AppState;
pub use tcp::Server;
