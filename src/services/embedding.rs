//! Client for the OpenAI-compatible embeddings provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;
use crate::models::OpenAiConfig;

/// Capabilities consumed from the embeddings provider.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute the embedding of a single text.
    async fn embed_text(&self, model: &str, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// List model ids visible to the credential, in provider order.
    async fn list_models(&self) -> Result<Vec<String>, EmbeddingError>;
}

/// Request body for the /embeddings endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response from the /embeddings endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Response from the /models endpoint.
#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl OpenAiClient {
    /// Build a client for `config.base_url`, authenticating with `api_key`.
    pub fn new(config: &OpenAiConfig, api_key: SecretString) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, EmbeddingError> {
        let response = request
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else if e.is_connect() {
                    EmbeddingError::ConnectionError(e.to_string())
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {status}: {body}"
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed_text(&self, model: &str, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url);
        tracing::debug!(%url, model, "requesting embedding");

        let response = self
            .send(self.client.post(&url).json(&EmbedRequest { model, input: text }))
            .await?;

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        let embedding = embed_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))?;

        if embedding.is_empty() {
            return Err(EmbeddingError::InvalidResponse(
                "embedding has zero dimensions".to_string(),
            ));
        }

        Ok(embedding)
    }

    async fn list_models(&self) -> Result<Vec<String>, EmbeddingError> {
        let url = format!("{}/models", self.base_url);
        tracing::debug!(%url, "listing models");

        let response = self.send(self.client.get(&url)).await?;
        let models: ModelList = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        Ok(models.data.into_iter().map(|m| m.id).collect())
    }
}
