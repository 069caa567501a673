//! Error types for the pipeline provisioner.

use thiserror::Error;

/// Errors raised while reading credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("missing required credential: {0}")]
    Missing(&'static str),
}

/// Errors related to the embeddings provider.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embeddings provider: {0}")]
    ConnectionError(String),

    #[error("embeddings provider error: {0}")]
    ServerError(String),

    #[error("embeddings request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embeddings response: {0}")]
    InvalidResponse(String),

    #[error("embeddings request timed out")]
    Timeout,
}

/// Errors related to the managed pipeline service.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to connect to pipeline service: {0}")]
    ConnectionError(String),

    #[error("pipeline service rejected upsert: {0}")]
    ServerError(String),

    #[error("pipeline request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid pipeline response: {0}")]
    InvalidResponse(String),

    #[error("pipeline request timed out")]
    Timeout,
}

/// Errors related to the local env file.
#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Coarse classification used for reporting and exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingCredential,
    RemoteCallFailure,
    LocalFailure,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::MissingCredential => write!(f, "missing_credential"),
            ErrorKind::RemoteCallFailure => write!(f, "remote_call_failure"),
            ErrorKind::LocalFailure => write!(f, "local_failure"),
        }
    }
}

/// Failure of one step of the provisioning flow.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("connectivity probe failed: {0}")]
    Probe(#[from] EmbeddingError),

    #[error("pipeline upsert failed: {0}")]
    Submission(#[from] PipelineError),

    #[error("failed to persist pipeline id: {0}")]
    Persistence(#[from] EnvFileError),
}

impl ProvisionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvisionError::Credential(_) => ErrorKind::MissingCredential,
            ProvisionError::Probe(_) | ProvisionError::Submission(_) => {
                ErrorKind::RemoteCallFailure
            }
            ProvisionError::Persistence(_) => ErrorKind::LocalFailure,
        }
    }

    /// Every failure terminates with status 1.
    pub fn exit_code(&self) -> u8 {
        1
    }
}
