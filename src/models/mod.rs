mod config;
mod credentials;
mod format;
mod pipeline;
mod report;

pub use config::{
    Config, DEFAULT_ENV_FILE, DEFAULT_LLAMA_CLOUD_BASE_URL, DEFAULT_OPENAI_BASE_URL,
    LLAMA_CLOUD_BASE_URL_ENV, LlamaCloudConfig, OPENAI_BASE_URL_ENV, OpenAiConfig, OutputConfig,
};
pub use credentials::{
    CredentialPresence, Credentials, LLAMACLOUD_API_KEY, OPENAI_API_KEY, redact,
};
pub use format::OutputFormat;
pub use pipeline::{
    CHUNK_OVERLAP, CHUNK_SEPARATOR, CHUNK_SIZE, ChunkingConfig, EMBEDDING_MODEL, EmbeddingConfig,
    OpenAiEmbedding, PARAGRAPH_SEPARATOR, PIPELINE_NAME, Pipeline, PipelineCreate,
    SegmentationConfig, TransformConfig,
};
pub use report::{ProbeReport, ProvisionReport};
