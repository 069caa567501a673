//! Pipeline configuration sent to the managed pipeline service.

use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};

use super::credentials::redact;

pub const PIPELINE_NAME: &str = "notebooklm_pipeline";
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const CHUNK_SIZE: u32 = 1024;
pub const CHUNK_OVERLAP: u32 = 200;
pub const CHUNK_SEPARATOR: &str = "<whitespace>";
pub const PARAGRAPH_SEPARATOR: &str = "\n\n\n";

/// Request body for the pipeline upsert endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PipelineCreate {
    pub name: String,
    pub embedding_config: EmbeddingConfig,
    pub transform_config: TransformConfig,
}

/// Embedding provider selection; the tag names the provider.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "component")]
pub enum EmbeddingConfig {
    #[serde(rename = "OPENAI_EMBEDDING")]
    OpenAi(OpenAiEmbedding),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OpenAiEmbedding {
    pub model_name: String,
    pub api_key: String,
    pub class_name: String,
}

impl OpenAiEmbedding {
    pub fn new(model_name: &str, api_key: &SecretString) -> Self {
        Self {
            model_name: model_name.to_string(),
            api_key: api_key.expose_secret().to_string(),
            class_name: "OpenAIEmbedding".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TransformConfig {
    Advanced {
        segmentation_config: SegmentationConfig,
        chunking_config: ChunkingConfig,
    },
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SegmentationConfig {
    Page,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ChunkingConfig {
    Sentence {
        chunk_size: u32,
        chunk_overlap: u32,
        separator: String,
        paragraph_separator: String,
    },
}

impl PipelineCreate {
    /// Build the fixed pipeline description around the embeddings key.
    pub fn build(openai_api_key: &SecretString) -> Self {
        Self {
            name: PIPELINE_NAME.to_string(),
            embedding_config: EmbeddingConfig::OpenAi(OpenAiEmbedding::new(
                EMBEDDING_MODEL,
                openai_api_key,
            )),
            transform_config: TransformConfig::Advanced {
                segmentation_config: SegmentationConfig::Page,
                chunking_config: ChunkingConfig::Sentence {
                    chunk_size: CHUNK_SIZE,
                    chunk_overlap: CHUNK_OVERLAP,
                    separator: CHUNK_SEPARATOR.to_string(),
                    paragraph_separator: PARAGRAPH_SEPARATOR.to_string(),
                },
            },
        }
    }

    /// Copy safe for display: the embedded API key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        let EmbeddingConfig::OpenAi(component) = &mut copy.embedding_config;
        component.api_key = redact(&SecretString::from(component.api_key.clone()));
        copy
    }
}

/// Pipeline returned by the service. Only the id is relied upon.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Pipeline {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub project_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn key() -> SecretString {
        SecretString::from("sk-test-key".to_string())
    }

    #[test]
    fn test_build_uses_fixed_chunking() {
        let request = PipelineCreate::build(&key());
        assert_eq!(request.name, PIPELINE_NAME);

        let TransformConfig::Advanced {
            segmentation_config,
            chunking_config,
        } = &request.transform_config;
        assert_eq!(*segmentation_config, SegmentationConfig::Page);

        let ChunkingConfig::Sentence {
            chunk_size,
            chunk_overlap,
            ..
        } = chunking_config;
        assert_eq!(*chunk_size, 1024);
        assert_eq!(*chunk_overlap, 200);
    }

    #[test]
    fn test_wire_format() {
        let value = serde_json::to_value(PipelineCreate::build(&key())).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "notebooklm_pipeline",
                "embedding_config": {
                    "type": "OPENAI_EMBEDDING",
                    "component": {
                        "model_name": "text-embedding-3-small",
                        "api_key": "sk-test-key",
                        "class_name": "OpenAIEmbedding"
                    }
                },
                "transform_config": {
                    "mode": "advanced",
                    "segmentation_config": { "mode": "page" },
                    "chunking_config": {
                        "mode": "sentence",
                        "chunk_size": 1024,
                        "chunk_overlap": 200,
                        "separator": "<whitespace>",
                        "paragraph_separator": "\n\n\n"
                    }
                }
            })
        );
    }

    #[test]
    fn test_redacted_masks_key_only() {
        let request = PipelineCreate::build(&key());
        let redacted = request.redacted();

        let EmbeddingConfig::OpenAi(component) = &redacted.embedding_config;
        assert_eq!(component.api_key, "sk-********");
        assert_eq!(redacted.transform_config, request.transform_config);
    }

    #[test]
    fn test_pipeline_response_ignores_unknown_fields() {
        let pipeline: Pipeline = serde_json::from_value(json!({
            "id": "abc123",
            "name": "notebooklm_pipeline",
            "pipeline_type": "MANAGED",
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(pipeline.id, "abc123");
        assert_eq!(pipeline.project_id, None);
    }
}
