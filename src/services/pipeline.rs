//! Client for the LlamaCloud pipeline service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret as _, SecretString};

use crate::error::PipelineError;
use crate::models::{LlamaCloudConfig, Pipeline, PipelineCreate};

/// Capability consumed from the managed pipeline service.
#[async_trait]
pub trait PipelineService: Send + Sync {
    /// Create or update the pipeline named in `request`.
    async fn upsert_pipeline(&self, request: &PipelineCreate) -> Result<Pipeline, PipelineError>;
}

#[derive(Debug, Clone)]
pub struct LlamaCloudClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    project_id: Option<String>,
    organization_id: Option<String>,
}

impl LlamaCloudClient {
    /// `api_key` may be `None`; the service then answers with an auth error.
    pub fn new(
        config: &LlamaCloudConfig,
        api_key: Option<SecretString>,
    ) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PipelineError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            project_id: config.project_id.clone(),
            organization_id: config.organization_id.clone(),
        })
    }

    /// Upsert endpoint, `{base_url}/api/v1/pipelines`.
    pub fn pipelines_url(&self) -> String {
        format!("{}/api/v1/pipelines", self.base_url)
    }

    fn scope_params(&self) -> Vec<(&'static str, &str)> {
        let mut params = Vec::new();
        if let Some(ref id) = self.project_id {
            params.push(("project_id", id.as_str()));
        }
        if let Some(ref id) = self.organization_id {
            params.push(("organization_id", id.as_str()));
        }
        params
    }
}

#[async_trait]
impl PipelineService for LlamaCloudClient {
    async fn upsert_pipeline(&self, request: &PipelineCreate) -> Result<Pipeline, PipelineError> {
        let url = self.pipelines_url();
        tracing::debug!(%url, name = %request.name, "upserting pipeline");

        let mut builder = self.client.put(&url).json(request);
        let params = self.scope_params();
        if !params.is_empty() {
            builder = builder.query(&params);
        }
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        } else {
            tracing::warn!("no pipeline service credential; sending unauthenticated request");
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                PipelineError::Timeout
            } else if e.is_connect() {
                PipelineError::ConnectionError(e.to_string())
            } else {
                PipelineError::RequestError(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::ServerError(format!(
                "status {status}: {body}"
            )));
        }

        let pipeline: Pipeline = response
            .json()
            .await
            .map_err(|e| PipelineError::InvalidResponse(e.to_string()))?;

        if pipeline.id.trim().is_empty() {
            return Err(PipelineError::InvalidResponse(
                "pipeline id is empty".to_string(),
            ));
        }

        Ok(pipeline)
    }
}
