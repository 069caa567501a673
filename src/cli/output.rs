use std::fmt::Write as FmtWrite;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::error::ErrorKind;
use crate::models::{
    CredentialPresence, LLAMACLOUD_API_KEY, OPENAI_API_KEY, OutputFormat, PipelineCreate,
    ProbeReport, ProvisionReport,
};
use crate::services::{PIPELINE_ID_KEY, ProgressSink, Step};
use crate::utils::PersistOutcome;

pub trait Formatter {
    fn format_credentials(&self, presence: &CredentialPresence) -> String;
    fn format_probe(&self, report: &ProbeReport) -> String;
    fn format_provision(&self, report: &ProvisionReport) -> String;
    fn format_plan(&self, request: &PipelineCreate) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, kind: Option<ErrorKind>, error: &str) -> String;
}

fn mark(ok: bool) -> console::StyledObject<&'static str> {
    if ok {
        style("✓").green()
    } else {
        style("✗").red()
    }
}

pub struct TextFormatter;

impl TextFormatter {
    fn write_probe(output: &mut String, report: &ProbeReport) {
        writeln!(
            output,
            "{} Embeddings provider reachable ({}, {} dimensions)",
            mark(true),
            report.embedding_model,
            report.dimensions
        )
        .ok();
        writeln!(output, "Available models ({}):", report.models.len()).ok();
        for model in &report.models {
            writeln!(output, "  - {model}").ok();
        }
    }
}

impl Formatter for TextFormatter {
    fn format_credentials(&self, presence: &CredentialPresence) -> String {
        let mut output = String::new();
        writeln!(output, "{} {OPENAI_API_KEY}", mark(presence.openai)).ok();
        writeln!(output, "{} {LLAMACLOUD_API_KEY}", mark(presence.llama_cloud)).ok();
        output
    }

    fn format_probe(&self, report: &ProbeReport) -> String {
        let mut output = String::new();
        Self::write_probe(&mut output, report);
        output
    }

    fn format_provision(&self, report: &ProvisionReport) -> String {
        let mut output = String::new();
        Self::write_probe(&mut output, &report.probe);
        writeln!(output).ok();

        let name = report.pipeline.name.as_deref().unwrap_or("-");
        writeln!(
            output,
            "{} Pipeline {} ({})",
            mark(true),
            style(&report.pipeline.id).bold(),
            name
        )
        .ok();

        let env_file = report.env_file.display();
        let action = match &report.persisted {
            PersistOutcome::Appended => format!("Added {PIPELINE_ID_KEY} to {env_file}"),
            PersistOutcome::Updated {
                previous,
                duplicates_removed,
            } => {
                let mut line = format!("Updated {PIPELINE_ID_KEY} in {env_file} (was {previous})");
                if *duplicates_removed > 0 {
                    write!(line, ", removed {duplicates_removed} duplicate entries").ok();
                }
                line
            }
            PersistOutcome::Unchanged => {
                format!("{PIPELINE_ID_KEY} in {env_file} already up to date")
            }
        };
        writeln!(output, "{} {action}", mark(true)).ok();
        output
    }

    fn format_plan(&self, request: &PipelineCreate) -> String {
        let body = serde_json::to_string_pretty(&request.redacted())
            .unwrap_or_else(|e| format!("<unserializable: {e}>"));
        format!("Pipeline request (not submitted):\n{body}\n")
    }

    fn format_message(&self, message: &str) -> String {
        format!("{message}\n")
    }

    fn format_error(&self, _kind: Option<ErrorKind>, error: &str) -> String {
        format!("{} {error}\n", mark(false))
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        let mut output = rendered.unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
        output.push('\n');
        output
    }
}

impl Formatter for JsonFormatter {
    fn format_credentials(&self, presence: &CredentialPresence) -> String {
        self.render(&serde_json::json!({ "credentials": presence }))
    }

    fn format_probe(&self, report: &ProbeReport) -> String {
        self.render(&serde_json::json!({ "probe": report }))
    }

    fn format_provision(&self, report: &ProvisionReport) -> String {
        self.render(report)
    }

    fn format_plan(&self, request: &PipelineCreate) -> String {
        self.render(&request.redacted())
    }

    fn format_message(&self, message: &str) -> String {
        self.render(&serde_json::json!({ "message": message }))
    }

    fn format_error(&self, kind: Option<ErrorKind>, error: &str) -> String {
        self.render(&serde_json::json!({
            "error": error,
            "kind": kind.map(|k| k.to_string()),
        }))
    }
}

/// Text output is plain, JSON output is pretty-printed.
pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}

/// Spinner on stderr showing the current step.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { bar }
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for Spinner {
    fn step(&self, step: Step) {
        self.bar.set_message(format!("{step}..."));
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
