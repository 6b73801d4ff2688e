//! Server address and URL construction.

use reqwest::Url;

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddr {
    pub host: String,
    pub port: u16,
}

impl ServerAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}:{}{}", self.host, self.port, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}:{}{}", self.host, self.port, path)
    }

    /// `ws://.../ws/listen?name=...` with the name percent-encoded
    pub fn listen_url(&self, name: &str) -> Result<String, ClientError> {
        let mut url =
            Url::parse(&self.ws_url("/ws/listen")).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("name", name);
        Ok(url.into())
    }
}
