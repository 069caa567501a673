use anyhow::Result;

use super::CommandContext;
use crate::cli::output::get_formatter;
use crate::error::ProvisionError;
use crate::models::PipelineCreate;

/// Gate on the embeddings key and print the request body. Makes no network calls.
pub fn handle_plan(ctx: &CommandContext) -> Result<()> {
    let formatter = get_formatter(ctx.format);
    let openai_api_key = ctx
        .credentials
        .require_openai()
        .map_err(ProvisionError::from)?;

    let request = PipelineCreate::build(openai_api_key);
    print!("{}", formatter.format_plan(&request));
    Ok(())
}
