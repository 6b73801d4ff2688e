//! Handler modules for HTTP and WebSocket endpoints.

pub mod http;
pub mod websocket;

// Re-export HTTP handlers
pub use http::{get_names, health_check, post_message};

// Re-export WebSocket handlers
pub use websocket::{chat_handler, listen_handler};
