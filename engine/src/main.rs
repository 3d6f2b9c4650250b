// Essaymark
// Main entry point for the essaymark binary

use clap::Parser;
use essaymark_engine::cli::{Cli, Command};
use essaymark_engine::config::Config;
use essaymark_engine::handlers::{handle_doctor, handle_export, handle_serve, OutputFormat};
use essaymark_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_config_path()?,
    };
    let config = if cli.config.is_some() {
        Config::load_from_path(&config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log beats the config file; RUST_LOG beats both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Essaymark v{} ({} - {})", version, commit, timestamp);

    // Handle commands
    match cli.command {
        Command::Serve { host, port } => {
            tracing::info!("Starting server...");
            handle_serve(&config, host, port).await
        }

        Command::Export { kind, out } => {
            tracing::info!("Exporting {}", kind.file_name());
            handle_export(&config, kind, out.as_deref()).await
        }

        Command::Doctor => {
            tracing::info!("Running diagnostics...");
            handle_doctor(&config, &config_path, format).await
        }
    }
}
