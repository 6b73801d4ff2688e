//! Axum transport for the chat hub.

mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{build_router, run, serve};
