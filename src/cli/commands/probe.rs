use anyhow::Result;

use super::CommandContext;
use crate::cli::output::get_formatter;
use crate::models::OutputFormat;
use crate::services::run_probe;

/// Print key presence, then embed a short text and list the provider's models.
pub async fn handle_probe(ctx: &CommandContext) -> Result<()> {
    let formatter = get_formatter(ctx.format);

    if ctx.format == OutputFormat::Text {
        print!(
            "{}",
            formatter.format_credentials(&ctx.credentials.presence())
        );
    }

    let progress = ctx.progress();
    let report = run_probe(&ctx.config, &ctx.credentials, progress.as_ref()).await?;

    print!("{}", formatter.format_probe(&report));
    Ok(())
}
