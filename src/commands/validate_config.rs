use crate::config::Config;
use anyhow::{Context, Result};
use std::path::Path;

/// Handle the validate-config command synchronously
#[allow(clippy::disallowed_methods)]
pub fn handle_validate_config(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;

    match config.validate() {
        Ok(()) => {
            println!("✅ Configuration is valid");
            println!("  Listen address: {}", config.server.bind);
            println!("  Max connections: {}", config.database.max_connections);
            println!(
                "  Connection timeout: {}s",
                config.database.connection_timeout_secs
            );
            Ok(())
        }
        Err(e) => {
            println!("❌ {e}");
            Err(e).context("Configuration has validation errors")
        }
    }
}
