//! Argus monitoring node entry point.

use color_eyre::Result;
use tracing::info;

use argus::device::StubDevice;
use argus::{MonitorNode, NodeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter("argus=debug")
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    info!("Argus launching...");

    let config = load_config()?;

    // The camera driver is an external collaborator; the synthetic
    // device keeps the node runnable without hardware attached.
    let device = StubDevice::from_config(&config.capture);
    let node = MonitorNode::start(device, config).await?;

    tokio::signal::ctrl_c().await?;
    info!("Argus shutting down");
    drop(node);
    Ok(())
}

/// Optional `argus.toml` layered under `ARGUS_`-prefixed environment
/// variables, e.g. `ARGUS_MOTION__SINK_URL`.
fn load_config() -> Result<NodeConfig, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::with_name("argus").required(false))
        .add_source(
            config::Environment::with_prefix("ARGUS")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
