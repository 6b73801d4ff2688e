//! Murmur chat client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin murmur-client -- chat --name rouz
//! cargo run --bin murmur-client -- listen --name igor
//! cargo run --bin murmur-client -- names
//! ```

use clap::{Parser, Subcommand};
use murmur_client::{ClientOptions, ServerAddr, run_chat, run_listen, run_names};
use murmur_server::config::DEFAULT_PORT;
use murmur_shared::logger::setup_logger;

#[derive(Debug, Parser)]
#[command(name = "murmur-client", version, about = "Chat with a Murmur hub")]
struct Cli {
    /// Server host
    #[arg(long, global = true, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, global = true, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Show the receive time of each message
    #[arg(long, global = true)]
    timestamps: bool,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Join with a chat session; every line you type is broadcast
    Chat {
        /// Name to join as (prompted when omitted)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Receive as a listener; lines are sent through the HTTP API
    Listen {
        /// Name to listen as (prompted when omitted)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Print the names currently connected
    Names,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &cli.log_level);

    let options = ClientOptions {
        addr: ServerAddr::new(cli.host, cli.port),
        show_timestamps: cli.timestamps,
    };
    let result = match cli.command {
        Command::Chat { name } => run_chat(&options, name).await,
        Command::Listen { name } => run_listen(&options, name).await,
        Command::Names => run_names(&options).await,
    };

    if let Err(e) = result {
        tracing::error!("Client error: {}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
