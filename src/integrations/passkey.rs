//! Passkey provider tenant.
//!
//! Built once from configuration and handed to whoever needs it. Missing
//! credentials are a typed error; the server runs with passkeys disabled.

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::config::PasskeyConfig;

const DEFAULT_API_BASE: &str = "https://passkeys.hanko.io";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasskeyError {
    #[error("passkey api key is not set")]
    MissingApiKey,

    #[error("passkey tenant id is not set")]
    MissingTenantId,

    #[error("invalid passkey api base `{0}`")]
    InvalidApiBase(String),
}

/// A configured passkey tenant. The api key is required but not kept.
#[derive(Debug, Clone, Serialize)]
pub struct PasskeyTenant {
    tenant_id: String,
    tenant_url: Url,
}

impl PasskeyTenant {
    pub fn from_config(config: &PasskeyConfig) -> Result<Self, PasskeyError> {
        non_empty(&config.api_key).ok_or(PasskeyError::MissingApiKey)?;
        let tenant_id = non_empty(&config.tenant_id).ok_or(PasskeyError::MissingTenantId)?;

        let base = config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);
        let tenant_url = Url::parse(&format!("{}/", base.trim_end_matches('/')))
            .and_then(|b| b.join(&format!("{}/", tenant_id)))
            .map_err(|_| PasskeyError::InvalidApiBase(base.to_string()))?;

        Ok(Self {
            tenant_id,
            tenant_url,
        })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Base URL for this tenant's API calls.
    pub fn tenant_url(&self) -> &Url {
        &self.tenant_url
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: Option<&str>, tenant: Option<&str>) -> PasskeyConfig {
        PasskeyConfig {
            api_key: key.map(String::from),
            tenant_id: tenant.map(String::from),
            api_base: None,
        }
    }

    #[test]
    fn test_builds_tenant_url() {
        let tenant = PasskeyTenant::from_config(&config(Some("k"), Some("t-123"))).unwrap();
        assert_eq!(tenant.tenant_url().as_str(), "https://passkeys.hanko.io/t-123/");
    }

    #[test]
    fn test_missing_settings_are_typed_errors() {
        assert_eq!(
            PasskeyTenant::from_config(&config(None, Some("t"))).unwrap_err(),
            PasskeyError::MissingApiKey
        );
        assert_eq!(
            PasskeyTenant::from_config(&config(Some("k"), Some("  "))).unwrap_err(),
            PasskeyError::MissingTenantId
        );
    }

    #[test]
    fn test_key_is_not_exposed() {
        let tenant = PasskeyTenant::from_config(&config(Some("super-secret"), Some("t"))).unwrap();
        assert!(!format!("{:?}", tenant).contains("super-secret"));
        assert!(!serde_json::to_string(&tenant).unwrap().contains("super-secret"));
    }
}
