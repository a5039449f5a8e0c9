use lamp_schedule::{config, control};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let path = config::config_path()?;
    tracing::info!("reading config from {}", path.display());
    // invalid schedules never reach the scheduler
    let config = config::from_file(&path)?;

    control::main_loop(config).await
}
