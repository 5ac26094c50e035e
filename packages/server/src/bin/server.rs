//! geoduel room server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin geoduel-server
//! cargo run --bin geoduel-server -- --host 0.0.0.0 --port 3000 --room-ttl-secs 600
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use geoduel_server::{
    domain::RoomPolicy,
    infrastructure::{
        location::{HaversineDistance, RandomLocationGenerator},
        message_pusher::WebSocketMessagePusher,
        repository::InMemoryRoomRepository,
    },
    ui::{Server, ServerConfig},
};
use geoduel_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "geoduel-server")]
#[command(about = "Realtime room server for geoduel", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Maximum number of players per room
    #[arg(long, default_value = "10")]
    room_capacity: usize,

    /// Rooms older than this are hidden and removed
    #[arg(long, default_value = "3600")]
    room_ttl_secs: u64,

    /// How often expired rooms are removed
    #[arg(long, default_value = "60")]
    sweep_interval_secs: u64,

    /// Upper bound for `pre_generate_locations`
    #[arg(long, default_value = "50")]
    max_pre_generated: usize,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "debug")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = ServerConfig {
        policy: RoomPolicy {
            capacity: args.room_capacity,
            ttl: Duration::from_secs(args.room_ttl_secs),
            max_pre_generated: args.max_pre_generated,
        },
        sweep_interval: Duration::from_secs(args.sweep_interval_secs.max(1)),
    };
    tracing::debug!("Starting with {:?}", config);

    // Initialize dependencies in order:
    // 1. Repository
    // 2. MessagePusher
    // 3. Clock and location collaborators
    // 4. Server
    let repository = Arc::new(InMemoryRoomRepository::new());
    let message_pusher = Arc::new(WebSocketMessagePusher::default());

    let server = Server::new(
        repository,
        message_pusher,
        Arc::new(SystemClock),
        Arc::new(RandomLocationGenerator),
        Arc::new(HaversineDistance),
        config,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
