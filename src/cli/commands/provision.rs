use anyhow::Result;

use super::CommandContext;
use crate::cli::output::get_formatter;
use crate::models::OutputFormat;
use crate::services::run_provision;

/// Run the full flow and report the pipeline id and what happened to the env file.
pub async fn handle_provision(ctx: &CommandContext) -> Result<()> {
    let formatter = get_formatter(ctx.format);

    if ctx.format == OutputFormat::Text {
        print!(
            "{}",
            formatter.format_credentials(&ctx.credentials.presence())
        );
    }

    let progress = ctx.progress();
    let report = run_provision(&ctx.config, &ctx.credentials, progress.as_ref()).await?;

    print!("{}", formatter.format_provision(&report));
    Ok(())
}
