//! ytblog CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ytblog::cli::{commands, Cli, Commands};
use ytblog::config::Settings;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging: -v flags win over the configured level
    let log_level = match cli.verbose {
        0 => "warn".to_string(),
        1 => settings.general.log_level.clone(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("ytblog={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Generate {
            url,
            output,
            max_revisions,
            provider,
            model,
        } => {
            let result = commands::run_generate(
                url,
                output.clone(),
                *max_revisions,
                provider.clone(),
                model.clone(),
                settings,
            )
            .await;

            match result {
                Err(e) if commands::is_reported(&e) => return Ok(ExitCode::FAILURE),
                other => other?,
            }
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, config_path).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
