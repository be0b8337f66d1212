//! Smart Parking CLI server
//!
//! ```sh
//! # Run with default config (~/.config/smart-parking/config.toml)
//! parking-service
//!
//! # Custom config path and port
//! parking-service --config /etc/smart-parking/config.toml --port 8080
//!
//! # Validate config without starting
//! parking-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use smart_parking::config::{default_config_path, AppConfig, ConfigError};
use smart_parking::server::{init_tracing, ServerHandle, ServerOptions};

/// Parking slot reservation, occupancy and billing service.
#[derive(Parser, Debug)]
#[command(
    name = "parking-service",
    version,
    about = "Smart parking slot service",
    long_about = "REST API for parking slot reservations, sensor-driven occupancy, \
                  billing and session history.\n\n\
                  Default config: ~/.config/smart-parking/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "PARKING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(port) = cli.port {
        info!("CLI override: port = {}", port);
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        info!("CLI override: log_level = {}", level);
        config.logging.level = level.clone();
    }
}

/// `--check`: a config that fails to load or validate is an error, never
/// replaced by defaults.
fn checked_config(
    loaded: Result<AppConfig, ConfigError>,
    cli: &Cli,
) -> Result<AppConfig, ConfigError> {
    let mut config = loaded?;
    apply_overrides(&mut config, cli);
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let loaded = AppConfig::load(&config_path);

    if cli.check {
        let config = match checked_config(loaded, &cli) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Invalid configuration in {}: {}", config_path.display(), e);
                return Err(e.into());
            }
        };
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}", config.server.address());
        println!("   Database    : {}", config.database.url);
        println!("   Slots       : {:?}", config.parking.slot_ids);
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    let mut config = match loaded {
        Ok(cfg) => {
            init_tracing(&cfg);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
            AppConfig::default()
        }
    };
    apply_overrides(&mut config, &cli);

    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await?;

    handle.install_signal_handler();

    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.wait().await;

    Ok(())
}
