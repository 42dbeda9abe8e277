//! Octodock Server
//!
//! HTTP backend for auth, notes and media with a WebSocket broadcast channel.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use octodock_core::config::{MediaIndexBackend, default_database_path, load_config};
use octodock_core::tracing_init::init_tracing;
use octodock_server::server::{AppState, build_router};
use octodock_server::storage::ServerDatabase;

#[derive(Parser, Debug)]
#[command(name = "octodock-server")]
#[command(version, about = "Octodock server - auth, notes, media and WebSocket broadcast")]
struct Args {
    /// Path to a JSON settings file.
    #[arg(long, env = "OCTODOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Path to SQLite database file.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Directory uploaded media is stored in.
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Media metadata index backend (memory or sqlite).
    #[arg(long)]
    media_index: Option<MediaIndexBackend>,

    /// Hide internal error details from responses.
    #[arg(long)]
    production: bool,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing("octodock_server=info", args.log_json);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(path) = args.db_path {
        config.database.path = Some(path);
    }
    if let Some(dir) = args.upload_dir {
        config.media.upload_dir = dir;
    }
    if let Some(index) = args.media_index {
        config.media.index = index;
    }
    if args.production {
        config.server.production = true;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.addr,
        production = config.server.production,
        "Starting octodock-server"
    );

    let db_path = match config.database.path.clone() {
        Some(path) => path,
        None => default_database_path()
            .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?,
    };
    info!(path = %db_path.display(), "Opening server database");
    let db = ServerDatabase::open(&db_path).await?;

    let addr = config.server.addr;
    let state = AppState::new(config, db)?;
    let broadcast = state.broadcast.clone();
    let shutdown = CancellationToken::new();

    let heartbeat = broadcast.spawn_heartbeat();
    let sweeper = state.rate_limiter.spawn_sweeper(shutdown.clone());

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown({
        let broadcast = broadcast.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
            // Open sockets would otherwise hold the graceful drain forever.
            broadcast.close().await;
        }
    })
    .await?;

    shutdown.cancel();
    let _ = tokio::join!(heartbeat, sweeper);

    info!("Server stopped");
    Ok(())
}
