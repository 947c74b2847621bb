//! Account capability
//!
//! Authentication against catalog servers. Sources differ widely in what
//! they support, so everything beyond plain authenticate/logout has an
//! explicit-failure default.

use crate::core::error::{QuireError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Authentication mechanisms a source can support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// Username + password
    Basic,
    /// Static API key or token
    ApiKey,
    /// OAuth device/redirect flow
    OAuth,
    /// No authentication required
    Anonymous,
}

/// Credentials supplied by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            api_key: None,
        }
    }

    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            username: None,
            password: None,
            api_key: Some(key.into()),
        }
    }
}

/// An authenticated account on a source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account id on the source
    pub user_id: String,

    #[serde(default)]
    pub display_name: Option<String>,

    /// Opaque session token, when the source issues one
    #[serde(default)]
    pub token: Option<String>,

    /// Token expiry as a unix timestamp, when known
    #[serde(default)]
    pub expires_at: Option<i64>,
}

/// A started OAuth flow: where to send the user, what to poll with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthSession {
    pub verification_url: String,
    pub device_code: String,

    #[serde(default)]
    pub user_code: Option<String>,

    /// Suggested polling interval in seconds
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
}

/// Account capability
#[async_trait]
pub trait AccountCapability: Send + Sync {
    /// Authentication mechanisms this source supports
    fn supported_auth_types(&self) -> &[AuthType];

    /// Authenticate against a server
    async fn authenticate(&self, server_url: &str, credentials: &Credentials)
        -> Result<AccountInfo>;

    /// Begin an OAuth flow
    async fn start_oauth(&self, _server_url: &str) -> Result<OAuthSession> {
        Err(QuireError::UnsupportedOperation("oauth".into()))
    }

    /// Poll a started OAuth flow; `None` while the user has not finished
    async fn poll_oauth(&self, _session: &OAuthSession) -> Result<Option<AccountInfo>> {
        Err(QuireError::UnsupportedOperation("oauth".into()))
    }

    /// Terminate the server-side session
    async fn logout(&self, server_url: &str, account: &AccountInfo) -> Result<()>;

    /// Exchange an expiring token for a fresh one
    async fn refresh_token(&self, _server_url: &str, _account: &AccountInfo) -> Result<AccountInfo> {
        Err(QuireError::UnsupportedOperation("token refresh".into()))
    }

    /// Cheap validity check; sources without one assume validity
    async fn validate_credentials(
        &self,
        _server_url: &str,
        _credentials: &Credentials,
    ) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BasicOnly;

    #[async_trait]
    impl AccountCapability for BasicOnly {
        fn supported_auth_types(&self) -> &[AuthType] {
            &[AuthType::Basic]
        }

        async fn authenticate(
            &self,
            _server_url: &str,
            credentials: &Credentials,
        ) -> Result<AccountInfo> {
            match (&credentials.username, &credentials.password) {
                (Some(user), Some(_)) => Ok(AccountInfo {
                    user_id: user.clone(),
                    display_name: None,
                    token: Some("session".into()),
                    expires_at: None,
                }),
                _ => Err(QuireError::Validation("username and password required".into())),
            }
        }

        async fn logout(&self, _server_url: &str, _account: &AccountInfo) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_basic_authentication() {
        let account = BasicOnly
            .authenticate("https://example.com", &Credentials::basic("alice", "pw"))
            .await
            .unwrap();
        assert_eq!(account.user_id, "alice");
        assert!(account.token.is_some());
    }

    #[tokio::test]
    async fn test_oauth_defaults_fail_explicitly() {
        let result = BasicOnly.start_oauth("https://example.com").await;
        assert!(matches!(result, Err(QuireError::UnsupportedOperation(_))));

        let result = BasicOnly
            .refresh_token(
                "https://example.com",
                &AccountInfo {
                    user_id: "a".into(),
                    display_name: None,
                    token: None,
                    expires_at: None,
                },
            )
            .await;
        assert!(matches!(result, Err(QuireError::UnsupportedOperation(_))));
    }

    #[tokio::test]
    async fn test_validate_defaults_to_valid() {
        let ok = BasicOnly
            .validate_credentials("https://example.com", &Credentials::api_key("k"))
            .await
            .unwrap();
        assert!(ok);
    }
}
