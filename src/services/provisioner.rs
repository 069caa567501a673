//! The provisioning flow: gate, probe, build, submit, persist.

use crate::error::ProvisionError;
use crate::models::{
    Config, CredentialPresence, Credentials, EMBEDDING_MODEL, Pipeline, PipelineCreate,
    ProbeReport, ProvisionReport,
};
use crate::services::{EmbeddingProvider, LlamaCloudClient, OpenAiClient, PipelineService};
use crate::utils::{EnvFile, KeyValueStore, PersistOutcome};

/// Text embedded by the connectivity probe.
pub const PROBE_TEXT: &str = "test";

/// Env file key holding the provisioned pipeline id.
pub const PIPELINE_ID_KEY: &str = "LLAMACLOUD_PIPELINE_ID";

/// A step of the flow, reported before it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Embedding,
    ListingModels,
    Upserting,
    Persisting,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Embedding => write!(f, "Testing embeddings provider"),
            Step::ListingModels => write!(f, "Listing available models"),
            Step::Upserting => write!(f, "Upserting pipeline"),
            Step::Persisting => write!(f, "Saving pipeline id"),
        }
    }
}

/// Receives step notifications, e.g. to drive a spinner.
pub trait ProgressSink {
    fn step(&self, step: Step);

    fn finish(&self) {}
}

/// Sink that ignores every notification.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn step(&self, _step: Step) {}
}

pub struct Provisioner<'a> {
    embeddings: &'a dyn EmbeddingProvider,
    pipelines: &'a dyn PipelineService,
    store: &'a dyn KeyValueStore,
    progress: &'a dyn ProgressSink,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        embeddings: &'a dyn EmbeddingProvider,
        pipelines: &'a dyn PipelineService,
        store: &'a dyn KeyValueStore,
    ) -> Self {
        Self {
            embeddings,
            pipelines,
            store,
            progress: &NoProgress,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    /// Embed the probe text, then list models. No retry.
    pub async fn probe(
        &self,
        credentials: CredentialPresence,
    ) -> Result<ProbeReport, ProvisionError> {
        probe_provider(self.embeddings, credentials, self.progress).await
    }

    pub async fn submit(&self, request: &PipelineCreate) -> Result<Pipeline, ProvisionError> {
        self.progress.step(Step::Upserting);
        let pipeline = self.pipelines.upsert_pipeline(request).await?;
        tracing::info!(id = %pipeline.id, name = %request.name, "pipeline upserted");
        Ok(pipeline)
    }

    pub fn persist(&self, pipeline: &Pipeline) -> Result<PersistOutcome, ProvisionError> {
        self.progress.step(Step::Persisting);
        let outcome = self.store.upsert(PIPELINE_ID_KEY, &pipeline.id)?;
        tracing::info!(?outcome, "pipeline id persisted");
        Ok(outcome)
    }

    /// Gate on the embeddings key, then check connectivity, build, submit and persist in
    /// order, stopping at the first failure.
    pub async fn run(
        &self,
        credentials: &Credentials,
    ) -> Result<(ProbeReport, Pipeline, PersistOutcome), ProvisionError> {
        let result = self.run_steps(credentials).await;
        self.progress.finish();
        result
    }

    async fn run_steps(
        &self,
        credentials: &Credentials,
    ) -> Result<(ProbeReport, Pipeline, PersistOutcome), ProvisionError> {
        let openai_api_key = credentials.require_openai()?;
        let probe = self.probe(credentials.presence()).await?;
        let request = PipelineCreate::build(openai_api_key);
        let pipeline = self.submit(&request).await?;
        let persisted = self.persist(&pipeline)?;
        Ok((probe, pipeline, persisted))
    }
}

async fn probe_provider(
    embeddings: &dyn EmbeddingProvider,
    credentials: CredentialPresence,
    progress: &dyn ProgressSink,
) -> Result<ProbeReport, ProvisionError> {
    progress.step(Step::Embedding);
    let embedding = embeddings.embed_text(EMBEDDING_MODEL, PROBE_TEXT).await?;
    tracing::info!(dimensions = embedding.len(), "embeddings provider reachable");

    progress.step(Step::ListingModels);
    let models = embeddings.list_models().await?;
    tracing::debug!(count = models.len(), "listed models");

    Ok(ProbeReport {
        credentials,
        embedding_model: EMBEDDING_MODEL.to_string(),
        dimensions: embedding.len(),
        models,
    })
}

/// Credential gate followed by the connectivity probe against the configured provider.
pub async fn run_probe(
    config: &Config,
    credentials: &Credentials,
    progress: &dyn ProgressSink,
) -> Result<ProbeReport, ProvisionError> {
    let openai_api_key = credentials.require_openai()?;
    let client = OpenAiClient::new(&config.openai, openai_api_key.clone())?;
    let result = probe_provider(&client, credentials.presence(), progress).await;
    progress.finish();
    result
}

/// Full flow against the configured services, persisting into `config.output.env_file`.
pub async fn run_provision(
    config: &Config,
    credentials: &Credentials,
    progress: &dyn ProgressSink,
) -> Result<ProvisionReport, ProvisionError> {
    let openai_api_key = credentials.require_openai()?;

    let embeddings = OpenAiClient::new(&config.openai, openai_api_key.clone())?;
    let pipelines =
        LlamaCloudClient::new(&config.llama_cloud, credentials.llama_cloud_api_key().cloned())?;
    let store = EnvFile::new(&config.output.env_file);

    let (probe, pipeline, persisted) = Provisioner::new(&embeddings, &pipelines, &store)
        .with_progress(progress)
        .run(credentials)
        .await?;

    Ok(ProvisionReport {
        probe,
        pipeline,
        env_file: store.path().to_path_buf(),
        persisted,
    })
}
