//! Shared application state.

use std::sync::Arc;

use serde::Deserialize;

use crate::usecase::ChatHub;

/// Query parameters of `GET /ws/listen`
#[derive(Debug, Deserialize)]
pub struct ListenQuery {
    pub name: String,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Hub facade (owns the registry and the shutdown signal)
    pub hub: Arc<ChatHub>,
}

impl AppState {
    pub fn new(hub: Arc<ChatHub>) -> Self {
        Self { hub }
    }
}
