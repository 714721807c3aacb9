//! Smart Parking CLI server
//!
//! ```sh
//! # Default config (~/.config/smart-parking/config.toml)
//! parking-service
//!
//! # Custom config, demo data, other port
//! parking-service --config /etc/smart-parking/config.toml --seed-demo --api-port 9090
//!
//! # Validate the config and exit
//! parking-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};

use smart_parking::config::AppConfig;
use smart_parking::server::{init_tracing, ServerHandle, ServerOptions};

#[derive(Parser, Debug)]
#[command(
    name = "parking-service",
    version,
    about = "Parking transaction lifecycle service",
    long_about = "REST API for vehicle entry, tariff resolution, exit validation and \
                  payment settlement.\n\n\
                  Default config: ~/.config/smart-parking/config.toml"
)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "SMART_PARKING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup
    #[arg(long)]
    no_migrate: bool,

    /// Seed a demo parking into an empty database
    #[arg(long)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(smart_parking::default_config_path);

    let (mut config, load_error) = if config_path.exists() {
        match AppConfig::load(&config_path) {
            Ok(cfg) => (cfg, None),
            Err(e) if cli.check => return Err(e.into()),
            Err(e) => (AppConfig::default(), Some(e)),
        }
    } else {
        (AppConfig::default(), None)
    };

    if let Some(port) = cli.api_port {
        config.server.api_port = port;
    }
    if let Some(level) = cli.log_level.clone() {
        config.logging.level = level;
    }

    if cli.check {
        config.validate()?;
        println!("Configuration is valid");
        println!("  file           : {}", config_path.display());
        println!("  api            : {}", config.server.address());
        println!("  database       : {}", config.database.url);
        println!("  payment policy : {}", config.parking.payment_policy.as_str());
        println!("  rounding       : {}", config.parking.rounding.as_str());
        return Ok(());
    }

    init_tracing(&config);
    match load_error {
        Some(e) => {
            error!("Cannot load {}: {}", config_path.display(), e);
            warn!("Falling back to the default configuration");
        }
        None if config_path.exists() => info!("Configuration loaded from {}", config_path.display()),
        None => info!("No config at {}, using defaults", config_path.display()),
    }

    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        seed_demo: cli.seed_demo,
    })
    .await?;
    handle.install_signal_handler();
    info!("Press Ctrl+C to stop");

    handle.shutdown_signal().wait().await;
    handle.wait().await;
    Ok(())
}
