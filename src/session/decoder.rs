//! Session token decoding.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::config::SessionConfig;
use crate::session::token::SessionToken;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no session secret configured")]
    NotConfigured,

    #[error("unsupported algorithm `{0}`")]
    Algorithm(String),

    #[error("invalid session token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("session decoding timed out after {0:?}")]
    Timeout(Duration),

    #[error("session decoder task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl SessionError {
    /// Label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            SessionError::NotConfigured => "not_configured",
            SessionError::Algorithm(_) => "not_configured",
            SessionError::Invalid(_) => "invalid",
            SessionError::Timeout(_) => "timeout",
            SessionError::Join(_) => "error",
        }
    }
}

/// Turns a raw session cookie value into claims.
pub trait SessionDecoder: Send + Sync {
    fn decode(&self, raw: &str) -> Result<SessionToken, SessionError>;
}

/// Decodes HMAC-signed JWT session cookies.
pub struct JwtSessionDecoder {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl JwtSessionDecoder {
    pub fn from_config(config: &SessionConfig) -> Result<Self, SessionError> {
        let algorithm = Algorithm::from_str(&config.algorithm)
            .map_err(|_| SessionError::Algorithm(config.algorithm.clone()))?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(SessionError::Algorithm(config.algorithm.clone()));
        }

        let key = (!config.secret.is_empty()).then(|| DecodingKey::from_secret(config.secret.as_bytes()));
        Ok(Self {
            key,
            validation: Validation::new(algorithm),
        })
    }
}

impl SessionDecoder for JwtSessionDecoder {
    fn decode(&self, raw: &str) -> Result<SessionToken, SessionError> {
        let key = self.key.as_ref().ok_or(SessionError::NotConfigured)?;
        let data = decode::<SessionToken>(raw, key, &self.validation)?;
        Ok(data.claims)
    }
}

/// Decode off the async executor, giving up after `timeout`.
pub async fn decode_with_timeout(
    decoder: Arc<dyn SessionDecoder>,
    raw: String,
    timeout: Duration,
) -> Result<SessionToken, SessionError> {
    let task = tokio::task::spawn_blocking(move || decoder.decode(&raw));
    match tokio::time::timeout(timeout, task).await {
        Ok(joined) => joined?,
        Err(_) => Err(SessionError::Timeout(timeout)),
    }
}
