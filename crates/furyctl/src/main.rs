//! furyctl command-line entry point.

mod cli;
mod commands;
mod tracing;

use crate::cli::parse;
use crate::commands::{Command, Services};
use crate::tracing::{TracingConfig, TracingFormat};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("{report:?}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> miette::Result<()> {
    let cli = parse();

    crate::tracing::init_tracing(TracingConfig {
        format: if cli.json_logs {
            TracingFormat::Json
        } else {
            TracingFormat::Dev
        },
        level: cli.log_level.into(),
        ..Default::default()
    })?;

    let settings = cli.settings();
    let command: Command = cli.command.into();
    ::tracing::debug!(?command, outdir = %settings.outdir.display(), "Starting furyctl");

    let services = Services::new(settings)?;
    commands::execute(command, &services).await?;
    Ok(())
}
