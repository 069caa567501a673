//! Results of the provisioning steps, as shown to the user.

use serde::Serialize;

use super::credentials::CredentialPresence;
use super::pipeline::Pipeline;
use crate::utils::PersistOutcome;

/// Outcome of the connectivity probe.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProbeReport {
    /// Which keys were found in the environment.
    pub credentials: CredentialPresence,
    pub embedding_model: String,
    pub dimensions: usize,
    /// Model ids in the order the provider listed them.
    pub models: Vec<String>,
}

/// Outcome of a full provisioning run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProvisionReport {
    pub probe: ProbeReport,
    pub pipeline: Pipeline,
    pub env_file: std::path::PathBuf,
    pub persisted: PersistOutcome,
}
