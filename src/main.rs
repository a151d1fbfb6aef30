//! Products microservice CLI
//!
//! ```sh
//! # Run with default config (~/.config/products-ms/config.toml)
//! products-service
//!
//! # Custom config path and port
//! products-service --config /etc/products-ms/config.toml --port 4000
//!
//! # Validate config without starting
//! products-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use products_ms::config::{AppConfig, ConfigError};
use products_ms::server::{init_tracing, ServerHandle, ServerOptions};

/// Product catalog microservice speaking JSON RPC over TCP and NATS.
#[derive(Parser, Debug)]
#[command(
    name = "products-service",
    version,
    about = "Product catalog microservice",
    long_about = "Product catalog microservice. Serves create/list/find/update/delete \
                  and batch validation of products over TCP and a NATS bus.\n\n\
                  Default config: ~/.config/products-ms/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "PRODUCTS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(products_ms::default_config_path);

    let (mut config, missing) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, false),
        Err(ConfigError::Missing(_)) => (AppConfig::default(), true),
        Err(e) => return Err(e.into()),
    };
    config.apply_env()?;

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging);
    if missing {
        warn!(
            "Config file {} not found, using defaults",
            config_path.display()
        );
    } else {
        info!("Configuration loaded from {}", config_path.display());
    }

    config.validate()?;
    config.server.require_fixed_port()?;

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Address     : {}", config.server.address());
        println!("   Database    : {}", config.database.url);
        println!("   Log level   : {}", config.logging.level);
        println!("   Not found   : {}", config.rpc.not_found_status);
        if config.bus.servers.is_empty() {
            println!("   Bus         : in-process");
        } else {
            println!("   Bus         : {}", config.bus.servers.join(", "));
        }
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
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
