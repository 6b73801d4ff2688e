//! Server and hub configuration.

use clap::ValueEnum;

/// Default bound of each recipient's outbound queue
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 64;

/// Default listening port of the server
pub const DEFAULT_PORT: u16 = 15001;

/// What a session does with the first message it receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum HelloPolicy {
    /// Register the sender, then broadcast the hello as its first chat message
    #[default]
    Broadcast,
    /// Only register the sender
    RegisterOnly,
}

/// Tuning of the broadcast hub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubConfig {
    /// Messages a recipient may have queued before it is pruned as too slow
    pub outbound_capacity: usize,
    pub hello_policy: HelloPolicy,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            hello_policy: HelloPolicy::default(),
        }
    }
}

/// Configuration of the network server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub hub: HubConfig,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            hub: HubConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr(), "127.0.0.1:15001");
        assert_eq!(config.hub.outbound_capacity, 64);
        assert_eq!(config.hub.hello_policy, HelloPolicy::Broadcast);
    }

    #[test]
    fn test_bind_addr_with_hostname() {
        let config = ServerConfig {
            host: "localhost".to_string(),
            port: 8080,
            ..ServerConfig::default()
        };

        assert_eq!(config.bind_addr(), "localhost:8080");
    }
}
