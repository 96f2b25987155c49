//! HITRAN XSC CLI application
//!
//! Command-line interface for browsing HITRAN absorption cross-section
//! metadata with a local, expiring disk cache.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use hitran_xsc::cli::{handle_cache, handle_xsc, Cli, Commands};
use hitran_xsc::config::AppConfig;
use hitran_xsc::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables (HITRAN_API_KEY) from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    if cli.global.config.is_none() {
        AppConfig::initialize_first_run().await?;
    }
    let mut config = AppConfig::load(cli.global.config.clone()).await?;
    if let Some(cache_dir) = &cli.global.cache_dir {
        config.cache.cache_root = Some(cache_dir.clone());
    }

    init_logging(&cli, &config);

    info!("HITRAN XSC v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Xsc(args) => {
            info!("Executing xsc command");
            handle_xsc(args, &config).await
        }
        Commands::Cache(args) => {
            info!("Executing cache command");
            handle_cache(args, &config).await
        }
    }
}

/// Initialize logging from CLI verbosity, falling back to the configured level
fn init_logging(cli: &Cli, config: &AppConfig) {
    let default_level = config
        .logging
        .level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::WARN);
    let log_level = cli.log_level_or(default_level);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("hitran_xsc={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
