//! CLI module for the pipeline provisioner.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Provision a LlamaCloud ingestion pipeline backed by OpenAI embeddings.
#[derive(Debug, Parser)]
#[command(name = "provision-pipeline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        value_enum,
        ignore_case = true,
        default_value_t = OutputFormat::Text,
        help = "Output format"
    )]
    pub format: OutputFormat,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        env = "PROVISIONER_ENV_FILE",
        help = "Env file to read credentials from and write the pipeline id to"
    )]
    pub env_file: Option<PathBuf>,

    #[arg(long, short = 'c', global = true, help = "Path to a TOML config file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Probe the embeddings provider, upsert the pipeline and save its id
    Provision,

    /// Check the embeddings credential and list available models
    Probe,

    /// Print the pipeline request without sending it
    Plan,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}
