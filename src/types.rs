use std::time::Duration;

use derive_more::{From, Into};
use serde::{Deserialize, Serialize};

/// Access-token lifetime assumed when the provider omits `expires_in`.
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Refresh-token cookie lifetime. Fixed regardless of what the provider declares.
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Opaque provider access token.
///
/// `Debug` is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, From, Into)]
#[serde(transparent)]
pub struct AccessToken(String);

/// Opaque provider refresh token.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, From, Into)]
#[serde(transparent)]
pub struct RefreshToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl RefreshToken {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

impl std::fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RefreshToken(..)")
    }
}

/// Authentication state for one browser client.
///
/// Created by a successful authorization-code exchange and updated in place by
/// [`Session::apply_refresh`]. The server never keeps it between requests: it
/// travels to the browser as two independent cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: AccessToken,
    /// Access-token lifetime, already defaulted when the provider omitted it.
    pub expires_in: Duration,
    pub refresh_token: Option<RefreshToken>,
}

/// Result of a successful refresh-token grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    pub access_token: AccessToken,
    pub expires_in: Duration,
    /// Present only when the provider rotated the refresh token.
    pub refresh_token: Option<RefreshToken>,
}

impl Session {
    /// Whether this session can be rotated without a new login.
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Fold a refresh result into the session.
    ///
    /// The access token and expiry are always replaced. The refresh token is
    /// replaced only when the provider issued a new one.
    pub fn apply_refresh(&mut self, refreshed: RefreshedTokens) {
        self.access_token = refreshed.access_token;
        self.expires_in = refreshed.expires_in;
        if let Some(rotated) = refreshed.refresh_token {
            self.refresh_token = Some(rotated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            access_token: AccessToken::new("old-access"),
            expires_in: Duration::from_secs(1800),
            refresh_token: Some(RefreshToken::new("old-refresh")),
        }
    }

    #[test]
    fn refresh_without_rotation_keeps_refresh_token() {
        let mut session = session();
        session.apply_refresh(RefreshedTokens {
            access_token: AccessToken::new("new-access"),
            expires_in: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_token: None,
        });

        assert_eq!(session.access_token.as_str(), "new-access");
        assert_eq!(session.expires_in, Duration::from_secs(3600));
        assert_eq!(
            session.refresh_token.as_ref().map(RefreshToken::as_str),
            Some("old-refresh")
        );
    }

    #[test]
    fn refresh_with_rotation_replaces_refresh_token() {
        let mut session = session();
        session.apply_refresh(RefreshedTokens {
            access_token: AccessToken::new("new-access"),
            expires_in: Duration::from_secs(600),
            refresh_token: Some(RefreshToken::new("new-refresh")),
        });

        assert_eq!(
            session.refresh_token.as_ref().map(RefreshToken::as_str),
            Some("new-refresh")
        );
    }

    #[test]
    fn debug_output_is_redacted() {
        let rendered = format!("{:?}", session());
        assert!(!rendered.contains("old-access"));
        assert!(!rendered.contains("old-refresh"));
    }

    #[test]
    fn refresh_ttl_is_thirty_days() {
        assert_eq!(REFRESH_TOKEN_TTL.as_secs(), 2_592_000);
    }

    #[test]
    fn tokens_serialize_transparently() {
        let json = serde_json::to_string(&AccessToken::new("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
