//! `formkit` -- form validation and send-code countdown from the terminal.
//!
//! # Environment variables
//!
//! See [`config`] for the countdown settings. `RUST_LOG` controls logging
//! (default `formkit=info`). A `.env` file in the working directory is
//! loaded first.

mod commands;
mod config;

use std::process::ExitCode;

use commands::{countdown, id_check, validate, CommandLine, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formkit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let commands = CommandLine::parse_args();

    match commands.command {
        Commands::Validate {
            rules,
            model,
            field,
            surface_faults,
        } => {
            validate::validate(validate::ValidateArgs {
                rules: &rules,
                model: &model,
                field: field.as_deref(),
                surface_faults,
            })
            .await
        }
        Commands::IdCheck { value } => Ok(id_check::id_check(&value)),
        Commands::Countdown { seconds } => {
            let mut config = config::countdown_from_env()?;
            if let Some(secs) = seconds {
                config = config.with_duration_secs(secs);
            }
            tracing::info!(duration_secs = config.duration_secs, "Starting countdown");
            countdown::countdown(config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
