use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pipeline_provisioner::cli::commands::{
    CommandContext, ConfigCommand, handle_config, handle_plan, handle_probe, handle_provision,
};
use pipeline_provisioner::cli::output::get_formatter;
use pipeline_provisioner::cli::{Cli, Commands};
use pipeline_provisioner::models::{Config, Credentials};
use pipeline_provisioner::ProvisionError;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init()
        .ok();
}

/// Load `KEY=value` pairs from the env file without overriding the real environment.
fn load_env_file(path: &Path) {
    match dotenvy::from_path(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "loaded env file"),
        Err(e) if e.not_found() => {
            tracing::debug!(path = %path.display(), "no env file");
        }
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to load env file"),
    }
}

fn resolve_context(cli: &Cli) -> Result<CommandContext> {
    let mut config = match cli.command {
        Commands::Config(ConfigCommand::Init { .. }) => Config::default(),
        _ => Config::load(cli.config.as_deref())?,
    };
    if let Some(ref path) = cli.env_file {
        config.output.env_file.clone_from(path);
    }

    load_env_file(&config.output.env_file);
    config.apply_env_overrides(|key| std::env::var(key).ok());
    config.validate()?;

    Ok(CommandContext {
        config,
        credentials: Credentials::from_env(),
        config_path: cli.config.clone(),
        format: cli.format,
        verbose: cli.verbose,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let formatter = get_formatter(cli.format);

    let result = tokio::select! {
        result = run(cli) => result,
        () = shutdown_signal() => {
            eprintln!("\nInterrupted; env file left untouched.");
            return ExitCode::from(130);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let provision_error = e.downcast_ref::<ProvisionError>();
            let kind = provision_error.map(ProvisionError::kind);
            let code = provision_error.map_or(1, ProvisionError::exit_code);

            tracing::debug!(error = ?e, "command failed");
            eprint!("{}", formatter.format_error(kind, &format!("{e:#}")));
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = resolve_context(&cli)?;

    match cli.command {
        Commands::Provision => handle_provision(&ctx).await,
        Commands::Probe => handle_probe(&ctx).await,
        Commands::Plan => handle_plan(&ctx),
        Commands::Config(ref cmd) => handle_config(cmd, &ctx),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
