//! bizmodel-server - HTTP front end
//!
//! Serves the workbook generator and its static landing page.

use anyhow::Result;
use bizmodel_render::WorkbookGenerator;
use bizmodel_server::{router, AppState};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "bizmodel-server")]
#[command(author, version, about = "Business projection workbook server", long_about = None)]
struct ServerConfig {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Address to bind
    #[arg(long, env = "BIZMODEL_BIND", default_value = "0.0.0.0")]
    bind: std::net::IpAddr,

    /// Directory containing index.html and sherloc_logo.jpg
    #[arg(long, env = "BIZMODEL_STATIC_DIR", default_value = ".")]
    static_dir: PathBuf,

    /// Currency symbol for money columns
    #[arg(long, env = "BIZMODEL_CURRENCY", default_value = "")]
    currency: String,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();

    let default_level = match config.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    for file in ["index.html", "sherloc_logo.jpg"] {
        let path = config.static_dir.join(file);
        if !path.exists() {
            tracing::warn!(path = %path.display(), "static file missing; route will return 404");
        }
    }

    let generator = WorkbookGenerator::new().currency(config.currency.clone());
    let state = Arc::new(AppState::new(generator, config.static_dir.clone()));
    let app = router(state);

    let addr = SocketAddr::new(config.bind, config.port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        bind = %listener.local_addr()?,
        static_dir = %config.static_dir.display(),
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
