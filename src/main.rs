//! Media Archiver CLI application
//!
//! Command-line interface for fetching a batch of remote media files into a
//! single ZIP archive.

use std::process;

use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use media_archiver::cli::{handle_archive, handle_config, Cli, Commands};
use media_archiver::config::AppConfig;
use media_archiver::errors::Result;

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
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // Errors are reported by the command that needs the configuration
    let config = AppConfig::load(cli.global.config.clone()).await;

    let level = cli.log_level().unwrap_or_else(|| {
        config
            .as_ref()
            .ok()
            .and_then(|config| config.logging.level.parse().ok())
            .unwrap_or(Level::WARN)
    });
    init_logging(&cli, level);

    info!("Media Archiver v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Archive(args) => {
            info!("Executing archive command");
            handle_archive(args, config?, &cli.global).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(args, config, &cli.global).await
        }
    }
}

/// Initialize logging at the given level
fn init_logging(cli: &Cli, level: Level) {
    let mut filter = EnvFilter::from_default_env();
    match format!("media_archiver={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring log directive: {}", e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
