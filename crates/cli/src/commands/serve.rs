//! `zabal serve`: Start the HTTP API server.

use super::{CmdResult, load_config};
use std::path::Path;

pub async fn run(config_path: Option<&Path>, port_override: Option<u16>) -> CmdResult {
    let mut config = load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🌐 ZABAL Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:  {}", config.default_provider);

    zabal_gateway::start(config).await?;

    Ok(())
}
