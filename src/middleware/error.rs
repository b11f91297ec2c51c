use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::types::ErrorBody;
use crate::error::Error;

/// Errors returned by the JSON endpoints.
///
/// The login callback does not use this type: its failures become redirects
/// (see [`LoginFailure`](crate::flow::LoginFailure)).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Refresh requested without a refresh-token cookie.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// The provider rejected the refresh token. The status is relayed as-is.
    #[error("Token refresh failed with status {status}")]
    RefreshFailed { status: u16, details: String },

    /// Upstream answered 401; the access cookie has been removed.
    #[error("Token expired")]
    SessionExpired { login_path: String },

    #[error("{0}")]
    BadRequest(String),

    /// Upstream or transport failure, with the message shown to the client.
    #[error("{0}")]
    Upstream(String),

    #[error("Unexpected error during refresh")]
    UnexpectedRefresh,

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Map a refresh-grant error onto the refresh endpoint's contract.
    #[must_use]
    pub fn from_refresh(e: Error) -> Self {
        match e {
            Error::NoRefreshToken => Self::NoRefreshToken,
            Error::RefreshFailed { status, body } => Self::RefreshFailed {
                status,
                details: body,
            },
            _ => Self::UnexpectedRefresh,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NoRefreshToken | Self::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new(self.to_string()))
            }
            Self::RefreshFailed { status, details } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                ErrorBody::new("Token refresh failed").with_details(details),
            ),
            Self::SessionExpired { ref login_path } => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new(self.to_string()).with_redirect(login_path.clone()),
            ),
            Self::Upstream(message) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(message)),
            Self::UnexpectedRefresh => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(self.to_string()))
            }
            Self::Config(_) => {
                tracing::error!(error = %self, "Auth internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new("Internal error"))
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn no_refresh_token_is_400() {
        let response = AuthError::NoRefreshToken.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "No refresh token available"})
        );
    }

    #[tokio::test]
    async fn refresh_failure_relays_status_and_details() {
        let err = AuthError::from_refresh(Error::RefreshFailed {
            status: 401,
            body: "invalid_grant".into(),
        });
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Token refresh failed", "details": "invalid_grant"})
        );
    }

    #[test]
    fn invalid_upstream_status_falls_back_to_bad_gateway() {
        let response = AuthError::RefreshFailed {
            status: 42,
            details: String::new(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn unexpected_refresh_error_is_500() {
        let response = AuthError::from_refresh(Error::Unauthenticated {
            login_path: "/login".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
