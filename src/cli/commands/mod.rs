mod config;
mod plan;
mod probe;
mod provision;

pub use config::ConfigCommand;

pub use config::handle_config;
pub use plan::handle_plan;
pub use probe::handle_probe;
pub use provision::handle_provision;

use crate::cli::output::Spinner;
use crate::models::{Config, Credentials, OutputFormat};
use crate::services::{NoProgress, ProgressSink};

/// Everything a command needs, resolved once in `main`.
#[derive(Debug)]
pub struct CommandContext {
    pub config: Config,
    pub credentials: Credentials,
    pub config_path: Option<std::path::PathBuf>,
    pub format: OutputFormat,
    pub verbose: bool,
}

impl CommandContext {
    /// Spinner for interactive text output; silent otherwise so logs and JSON stay clean.
    fn progress(&self) -> Box<dyn ProgressSink> {
        if self.format == OutputFormat::Text && !self.verbose {
            Box::new(Spinner::new())
        } else {
            Box::new(NoProgress)
        }
    }
}
