use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;

// RUST_LOG sobrepõe o filtro padrão "info".
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    info!("ScreenLink Client v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = app::run().await {
        error!("Fatal error: {:#}", e);
        return Err(e);
    }
    info!("ScreenLink exited cleanly.");
    Ok(())
}
