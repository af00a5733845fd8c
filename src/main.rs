// ABOUTME: Entry point for the stagehand CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, RunArgs};
use commands::RunOptions;
use stagehand::config::{self, RunOverrides};
use stagehand::deploy::Stage;
use stagehand::error::{Error, Result};
use stagehand::output::{Output, OutputMode};
use stagehand::types::{ProfileId, RepositoryId};
use std::env;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbose flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = output_mode(&cli);

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping at the next poll");
            token.cancel();
        }
    });

    if let Err(e) = run(cli, mode, cancel).await {
        Output::new(mode).error(&error_message(&e));
        std::process::exit(1);
    }
}

fn output_mode(cli: &Cli) -> OutputMode {
    if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    }
}

async fn run(cli: Cli, mode: OutputMode, cancel: CancellationToken) -> Result<()> {
    let cwd = env::current_dir()?;
    let output = Output::new(mode);

    match cli.command {
        Commands::Init { group_id, force } => {
            config::init_config(&cwd, group_id.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Deploy {
            name,
            start_stage,
            end_stage,
            run: args,
        } => {
            let options = run_options(name, args, false, start_stage, end_stage);
            commands::deploy(&cwd, options, cancel, output).await
        }
        Commands::Drop { name, run: args } => {
            let options = run_options(name, args, true, None, None);
            commands::deploy(&cwd, options, cancel, output).await
        }
        Commands::Status {
            name,
            repository_id,
        } => commands::status(&cwd, &name, repository_id, output).await,
    }
}

fn run_options(
    name: String,
    args: RunArgs,
    drop: bool,
    start_stage: Option<Stage>,
    end_stage: Option<Stage>,
) -> RunOptions {
    RunOptions {
        name,
        overrides: RunOverrides {
            dry_run: args.dry_run,
            drop,
            start_stage,
            end_stage,
            profile_id: args.profile_id.map(ProfileId::new),
            repository_id: args.repository_id.map(RepositoryId::new),
        },
        resume: args.resume,
    }
}

fn error_message(error: &Error) -> String {
    let message = error.to_string();
    match error.staging_error() {
        Some(e) if e.is_unauthorized() || e.is_forbidden() => format!(
            "{message}\n  hint: check the username and password configured for this deployer"
        ),
        _ => message,
    }
}
