//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - serve: Run the HTTP server until Ctrl-C
//! - export: Dump accounts or essays
//! - doctor: Validate configuration and check the data directory

use anyhow::{Context, Result};
use api_server::{ApiServer, ServerSettings};
use sdk::records::format_accounts_text;
use sdk::Service;
use serde_json::json;
use std::path::Path;

use crate::cli::ExportKind;
use crate::config::Config;
use crate::context::Engine;
use crate::secrets::api_key_present;
use crate::store::{AccountStore, EssayStore, RecordKind};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Run the HTTP server
///
/// Fails before binding if the API key variable is unset or the data files
/// cannot be initialized. Runs until Ctrl-C, then shuts down gracefully.
pub async fn handle_serve(
    config: &Config,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let engine = Engine::from_config(config).context("Failed to initialize engine")?;

    let settings = ServerSettings {
        host: host.unwrap_or_else(|| config.server.host.clone()),
        port: port.unwrap_or(config.server.port),
        static_dir: config.server.static_dir.clone(),
    };

    let mut server = ApiServer::new(settings);
    let addr = server
        .start(engine.context())
        .await
        .context("Failed to start API server")?;

    println!("Server running on http://{}", addr);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutdown signal received");
    server.stop()?;

    Ok(())
}

/// Render one export
///
/// Produces the same bytes as the matching HTTP export endpoint.
pub fn render_export(
    kind: ExportKind,
    accounts: &AccountStore,
    essays: &EssayStore,
) -> Result<String> {
    let rendered = match kind {
        ExportKind::AccountsJson => serde_json::to_string(&accounts.load_all())?,
        ExportKind::AccountsText => format_accounts_text(&accounts.load_all()),
        ExportKind::EssaysJson => serde_json::to_string(&essays.load_all())?,
    };
    Ok(rendered)
}

/// Write an export to `out`, or stdout when `out` is `None`
pub async fn handle_export(config: &Config, kind: ExportKind, out: Option<&Path>) -> Result<()> {
    let accounts = AccountStore::open_in(&config.core.data_dir, RecordKind::Accounts)?;
    let essays = EssayStore::open_in(&config.core.data_dir, RecordKind::Essays)?;

    let rendered = render_export(kind, &accounts, &essays)?;

    match out {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {} to {}", kind.file_name(), path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Validate configuration and report on the data directory
///
/// Checks:
/// - Configuration (already validated when loaded)
/// - Data directory and each record file, with record counts
/// - API key environment variable
/// - Static file directory
pub async fn handle_doctor(
    config: &Config,
    config_path: &Path,
    format: OutputFormat,
) -> Result<()> {
    let mut issues = Vec::new();
    let mut checks: Vec<(String, String)> = Vec::new();

    // Check 1: Configuration
    checks.push(("Configuration".to_string(), config_path.display().to_string()));

    // Check 2: Data directory
    let data_dir = &config.core.data_dir;
    if data_dir.is_dir() {
        checks.push(("Data directory".to_string(), data_dir.display().to_string()));
    } else {
        checks.push(("Data directory".to_string(), "Missing".to_string()));
        issues.push(format!("Data directory does not exist: {:?}", data_dir));
    }

    // Check 3: Record files
    for kind in [RecordKind::Accounts, RecordKind::Essays] {
        let path = data_dir.join(kind.file_name());
        let label = format!("Records ({})", kind.file_name());

        if !path.exists() {
            checks.push((label, "Not initialized".to_string()));
            continue;
        }

        let count = match kind {
            RecordKind::Accounts => AccountStore::open_in(data_dir, kind)?.count(),
            RecordKind::Essays => EssayStore::open_in(data_dir, kind)?.count(),
        };

        match count {
            Ok(n) => checks.push((label, format!("{} record(s)", n))),
            Err(e) => {
                checks.push((label, "Unreadable".to_string()));
                issues.push(e.to_string());
            }
        }
    }

    // Check 4: API key
    let key_var = &config.llm.gemini.api_key_env;
    if api_key_present(key_var) {
        checks.push(("Gemini API key".to_string(), format!("{} is set", key_var)));
    } else {
        checks.push(("Gemini API key".to_string(), format!("{} is not set", key_var)));
        issues.push(format!(
            "{} is not set. `essaymark serve` will refuse to start.",
            key_var
        ));
    }

    checks.push(("Gemini model".to_string(), config.llm.gemini.model.clone()));

    // Check 5: Marking policy
    checks.push(("Scoring scale".to_string(), config.marking.policy()?.to_string()));

    // Check 6: Static files
    match &config.server.static_dir {
        Some(dir) if dir.is_dir() => {
            checks.push(("Static files".to_string(), dir.display().to_string()));
        }
        Some(dir) => {
            checks.push(("Static files".to_string(), "Missing".to_string()));
            issues.push(format!("Static directory does not exist: {:?}", dir));
        }
        None => checks.push(("Static files".to_string(), "Disabled".to_string())),
    }

    // Output results
    match format {
        OutputFormat::Text => {
            println!("Essaymark System Diagnostics");
            println!("============================");
            println!();

            println!("System Checks:");
            for (check, status) in &checks {
                println!("  {:<25} {}", format!("{}:", check), status);
            }

            println!();

            if issues.is_empty() {
                println!("✓ All checks passed!");
            } else {
                println!("⚠ Issues found:");
                println!();
                for (i, issue) in issues.iter().enumerate() {
                    println!("  {}. {}", i + 1, issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": checks.iter().map(|(name, status)| {
                    json!({
                        "name": name,
                        "status": status
                    })
                }).collect::<Vec<_>>(),
                "issues": issues,
                "healthy": issues.is_empty()
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
