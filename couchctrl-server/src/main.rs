//! CouchCtrl backend entry point.
//!
//! Serves the discovery/control HTTP API and the `/ws` status-feed socket
//! for CouchCtrl clients.

mod messages;
mod registry;
mod routes;
mod session;
mod ws;

use std::net::{IpAddr, SocketAddr};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Backend for discovering and remote-controlling VLC players on the local
/// network.
#[derive(Debug, Parser)]
#[command(name = "couchctrl-server", version, about)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let state = routes::AppState::new();
    let addr = SocketAddr::new(args.bind, args.port);
    let (addr, server) =
        warp::serve(routes::routes(state)).bind_with_graceful_shutdown(addr, async {
            let _ = tokio::signal::ctrl_c().await;
        });
    info!(%addr, "couchctrl backend listening");
    server.await;
}
