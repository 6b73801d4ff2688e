//! Command line client for the Murmur chat hub.

pub mod address;
pub mod api;
pub mod app;
pub mod error;
pub mod prompt;
pub mod socket;

pub use address::ServerAddr;
pub use api::ApiClient;
pub use app::{ClientOptions, run_chat, run_listen, run_names};
pub use error::ClientError;
