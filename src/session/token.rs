//! Session claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The claims of a decoded session the router cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SessionToken {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SessionUser {
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
}

impl SessionToken {
    /// A session counts only when it names a user by email.
    pub fn is_authenticated(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// Account creation time. Unparsable values count as absent.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.user.as_ref()?.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_claims() {
        let token: SessionToken = serde_json::from_str(
            r#"{"email":"ada@example.com","user":{"createdAt":"2026-03-01T11:59:58.000Z","id":"u1"},"exp":1}"#,
        )
        .unwrap();
        assert!(token.is_authenticated());
        assert_eq!(token.created_at().unwrap().to_rfc3339(), "2026-03-01T11:59:58+00:00");
    }

    #[test]
    fn test_missing_fields() {
        let token: SessionToken = serde_json::from_str("{}").unwrap();
        assert!(!token.is_authenticated());
        assert!(token.created_at().is_none());

        let token = SessionToken {
            email: Some(String::new()),
            user: None,
        };
        assert!(!token.is_authenticated());
    }
}
