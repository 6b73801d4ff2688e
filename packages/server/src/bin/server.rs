//! Murmur chat hub server.
//!
//! Accepts WebSocket chat sessions and listeners, and broadcasts every
//! message to all other connected clients.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin murmur-server -- --port 15001
//! ```

use clap::Parser;
use murmur_server::{
    HelloPolicy, HubConfig, ServerConfig,
    config::{DEFAULT_OUTBOUND_CAPACITY, DEFAULT_PORT},
};
use murmur_shared::logger::setup_logger;

#[derive(Debug, Parser)]
#[command(name = "murmur-server", version, about = "Broadcast chat hub")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Messages a client may have queued before it is dropped as too slow
    #[arg(long, default_value_t = DEFAULT_OUTBOUND_CAPACITY)]
    outbound_capacity: usize,

    /// What to do with a session's first message
    #[arg(long, value_enum, default_value_t = HelloPolicy::Broadcast)]
    hello_policy: HelloPolicy,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            host: args.host,
            port: args.port,
            hub: HubConfig {
                outbound_capacity: args.outbound_capacity.max(1),
                hello_policy: args.hello_policy,
            },
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // Run the server
    if let Err(e) = murmur_server::run(args.into()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
