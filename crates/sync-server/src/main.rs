//! TCP frame-synchronization server binary.

use tracing::info;

use sync_server::config::{self, Config};
use sync_server::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sync-server: {}\n", e);
            eprintln!("{}", config::USAGE);
            std::process::exit(1);
        }
    };

    let level = if config.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!(
        screens = config.screens,
        framerate = config.framerate,
        port = config.port,
        verbose = config.verbose,
        "starting sync-server"
    );

    server::run(config).await
}
