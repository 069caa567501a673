use anyhow::{Context, Result};
use clap::Subcommand;

use super::CommandContext;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Show the resolved configuration")]
    Show,
    #[command(about = "Show configuration file paths")]
    Path,
    #[command(about = "Write a default configuration file")]
    Init {
        #[arg(long, help = "Force overwrite existing config")]
        force: bool,
    },
}

pub fn handle_config(cmd: &ConfigCommand, ctx: &CommandContext) -> Result<()> {
    match cmd {
        ConfigCommand::Show => handle_show(ctx),
        ConfigCommand::Path => handle_path(ctx),
        ConfigCommand::Init { force } => handle_init(ctx, *force),
    }
}

fn handle_show(ctx: &CommandContext) -> Result<()> {
    if ctx.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&ctx.config)?);
        return Ok(());
    }

    let content = toml::to_string_pretty(&ctx.config).context("failed to render config")?;
    print!("{content}");
    Ok(())
}

fn handle_path(ctx: &CommandContext) -> Result<()> {
    let formatter = get_formatter(ctx.format);
    let path = ctx.config_path.clone().or_else(Config::config_path);

    let message = match path {
        Some(ref p) if p.exists() => format!("Config (active): {}", p.display()),
        Some(ref p) => format!("Config (would be): {}", p.display()),
        None => "Config: no config directory available".to_string(),
    };
    print!("{}", formatter.format_message(&message));
    print!(
        "{}",
        formatter.format_message(&format!(
            "Env file: {}",
            ctx.config.output.env_file.display()
        ))
    );
    Ok(())
}

fn handle_init(ctx: &CommandContext, force: bool) -> Result<()> {
    let formatter = get_formatter(ctx.format);
    let path = Config::init(ctx.config_path.as_deref(), force).context("failed to create config")?;
    print!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", path.display()))
    );
    Ok(())
}
