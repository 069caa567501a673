//! API credentials read from the environment.

use secrecy::{ExposeSecret as _, SecretString};

use crate::error::CredentialError;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const LLAMACLOUD_API_KEY: &str = "LLAMACLOUD_API_KEY";

/// The two keys the provisioner needs. Either may be absent until the gate runs.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    openai_api_key: Option<SecretString>,
    llama_cloud_api_key: Option<SecretString>,
}

impl Credentials {
    pub fn new(openai_api_key: Option<String>, llama_cloud_api_key: Option<String>) -> Self {
        Self {
            openai_api_key: non_blank(openai_api_key),
            llama_cloud_api_key: non_blank(llama_cloud_api_key),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(lookup(OPENAI_API_KEY), lookup(LLAMACLOUD_API_KEY))
    }

    pub fn presence(&self) -> CredentialPresence {
        CredentialPresence {
            openai: self.openai_api_key.is_some(),
            llama_cloud: self.llama_cloud_api_key.is_some(),
        }
    }

    /// Gate every remote call on the embeddings key.
    ///
    /// The pipeline key is not checked; a missing one surfaces as an
    /// authentication failure from the pipeline service.
    pub fn require_openai(&self) -> Result<&SecretString, CredentialError> {
        self.openai_api_key
            .as_ref()
            .ok_or(CredentialError::Missing(OPENAI_API_KEY))
    }

    pub fn llama_cloud_api_key(&self) -> Option<&SecretString> {
        self.llama_cloud_api_key.as_ref()
    }
}

fn non_blank(value: Option<String>) -> Option<SecretString> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}

/// Which keys were found, for diagnostic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CredentialPresence {
    pub openai: bool,
    pub llama_cloud: bool,
}

/// Show only the first few characters of a secret.
pub fn redact(secret: &SecretString) -> String {
    let exposed = secret.expose_secret();
    let prefix: String = exposed.chars().take(3).collect();
    format!("{prefix}********")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_openai_key_fails_gate() {
        let credentials = Credentials::from_lookup(|key| match key {
            LLAMACLOUD_API_KEY => Some("llx-abc".to_string()),
            _ => None,
        });
        assert!(matches!(
            credentials.require_openai(),
            Err(CredentialError::Missing(OPENAI_API_KEY))
        ));
        assert_eq!(
            credentials.presence(),
            CredentialPresence {
                openai: false,
                llama_cloud: true
            }
        );
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let credentials = Credentials::new(Some("   ".to_string()), None);
        assert!(credentials.require_openai().is_err());
    }

    #[test]
    fn test_present_key_passes_gate() {
        let credentials = Credentials::new(Some("sk-valid".to_string()), None);
        let key = credentials.require_openai().unwrap();
        assert_eq!(key.expose_secret(), "sk-valid");
        assert!(credentials.llama_cloud_api_key().is_none());
    }

    #[test]
    fn test_debug_does_not_leak_keys() {
        let credentials = Credentials::new(Some("sk-secret-value".to_string()), None);
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("sk-secret-value"));
    }

    #[test]
    fn test_redact() {
        let secret = SecretString::from("sk-1234567890".to_string());
        assert_eq!(redact(&secret), "sk-********");
    }
}
