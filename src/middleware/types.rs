use serde::Serialize;

/// Body of `GET /token-status`. Presence only, never token material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    pub has_access_token: bool,
    pub has_refresh_token: bool,
}

/// Body of a successful `POST /refresh`.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    /// Effective access-token lifetime in seconds (3600 when the provider omitted it).
    pub expires_in: u64,
}

/// Body of `POST /logout`.
#[derive(Debug, Clone, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// JSON error body: `{"error": ..., "details"?: ..., "redirect"?: ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Login entry point the client should navigate to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            redirect: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn with_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_status_uses_camel_case() {
        let json = serde_json::to_value(TokenStatus {
            has_access_token: true,
            has_refresh_token: false,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"hasAccessToken": true, "hasRefreshToken": false})
        );
    }
}
