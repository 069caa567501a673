mod embedding;
mod pipeline;
mod provisioner;

pub use embedding::{EmbeddingProvider, OpenAiClient};
pub use pipeline::{LlamaCloudClient, PipelineService};
pub use provisioner::{
    NoProgress, PIPELINE_ID_KEY, PROBE_TEXT, ProgressSink, Provisioner, Step, run_probe,
    run_provision,
};
