//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use murmur_server::{ChatHub, HubConfig, ServerError};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

/// A real server on an ephemeral port
pub struct TestServer {
    addr: SocketAddr,
    hub: Arc<ChatHub>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(HubConfig::default()).await
    }

    pub async fn start_with(config: HubConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let hub = Arc::new(ChatHub::new(config));
        let (shutdown, signal) = oneshot::channel();

        let task = tokio::spawn(murmur_server::serve(listener, Arc::clone(&hub), async {
            let _ = signal.await;
        }));

        Self {
            addr,
            hub,
            shutdown: Some(shutdown),
            task,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    pub fn hub(&self) -> &Arc<ChatHub> {
        &self.hub
    }

    /// Fire the shutdown signal without waiting for the server to stop.
    pub fn trigger_shutdown(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }

    /// Poll `GET /api/names` until it equals `expected`.
    pub async fn wait_for_names(&self, expected: &[&str]) {
        let client = reqwest::Client::new();
        let url = format!("{}/api/names", self.base_url());
        let result = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let body: serde_json::Value = client
                    .get(&url)
                    .send()
                    .await
                    .expect("Failed to send request")
                    .json()
                    .await
                    .expect("Failed to parse JSON");
                if body["names"] == serde_json::json!(expected) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(result.is_ok(), "names never became {expected:?}");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.trigger_shutdown();
        self.task.abort();
    }
}
