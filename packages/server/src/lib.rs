//! Murmur: a broadcast chat hub.
//!
//! Every message a client sends is delivered to every other connected
//! client. Clients are identified by a self-declared name; a newer
//! connection under the same name supersedes the older one.
//!
//! Layers:
//! - `domain`: value objects, entities, endpoints and the registry trait
//! - `infrastructure`: the in-memory registry and wire DTOs
//! - `usecase`: sessions, broadcast, listeners and the `ChatHub` facade
//! - `ui`: the axum HTTP/WebSocket transport

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::{HelloPolicy, HubConfig, ServerConfig};
pub use error::ServerError;
pub use ui::{build_router, run, serve};
pub use usecase::ChatHub;
