//! Login flow as an explicit state machine.
//!
//! ```text
//! Unauthenticated ──begin──▶ AwaitingProviderRedirect ──redirected──▶ AwaitingCallback
//!                                                                        │
//!                                            accept_callback + exchange ─┤
//!                                                                        ▼
//!                                                     Authenticated | Error(reason)
//! ```
//!
//! The server is stateless between the two halves: the `state` value is carried
//! in a short-lived cookie and [`LoginState::resume`] rebuilds
//! `AwaitingCallback` from it when the provider redirects back.

use serde::Deserialize;

use crate::csrf;
use crate::error::Error;
use crate::oauth::{AuthClient, AuthorizationRequest};
use crate::types::Session;

/// Query parameters of the provider's redirect back to the callback URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Why a login attempt ended in the `Error` state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginFailure {
    /// The provider redirected back with `error=<code>`, e.g. `access_denied`.
    #[error("provider denied authorization: {0}")]
    ProviderDenied(String),

    /// Neither `code` nor `error` was present.
    #[error("authorization code missing from callback")]
    MissingAuthorizationCode,

    /// Callback `state` absent or not the one issued with the redirect.
    #[error("state parameter mismatch")]
    StateMismatch,

    #[error("token exchange failed")]
    TokenExchangeFailed,

    #[error("unexpected authentication error")]
    Unexpected,

    /// A transition was attempted from a state that does not allow it.
    #[error("invalid login transition from {0}")]
    InvalidTransition(&'static str),
}

impl LoginFailure {
    /// Short code surfaced to the login page as `?error=<code>`.
    #[must_use]
    pub fn reason_code(&self) -> &str {
        match self {
            Self::ProviderDenied(code) => code,
            Self::MissingAuthorizationCode => "no_code",
            Self::StateMismatch => "state_mismatch",
            Self::TokenExchangeFailed => "token_exchange_failed",
            Self::Unexpected | Self::InvalidTransition(_) => "unexpected_error",
        }
    }
}

impl From<&Error> for LoginFailure {
    fn from(e: &Error) -> Self {
        match e {
            Error::TokenExchangeFailed { .. } => Self::TokenExchangeFailed,
            _ => Self::Unexpected,
        }
    }
}

/// Where a browser client is in the login cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    Unauthenticated,
    AwaitingProviderRedirect { state: String },
    AwaitingCallback { expected_state: Option<String> },
    Authenticated,
    Error(LoginFailure),
}

impl LoginState {
    /// Short name for logs and transition errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::AwaitingProviderRedirect { .. } => "awaiting_provider_redirect",
            Self::AwaitingCallback { .. } => "awaiting_callback",
            Self::Authenticated => "authenticated",
            Self::Error(_) => "error",
        }
    }

    /// Start a login: generate the CSRF state and the provider redirect.
    ///
    /// Allowed from `Unauthenticated` and `Error` (which always falls back to
    /// `Unauthenticated`).
    ///
    /// # Errors
    ///
    /// [`LoginFailure::InvalidTransition`] from any other state.
    pub fn begin(self, client: &AuthClient) -> Result<(Self, AuthorizationRequest), LoginFailure> {
        match self {
            Self::Unauthenticated | Self::Error(_) => {
                let request = client.authorization_url();
                let next = Self::AwaitingProviderRedirect {
                    state: request.state.clone(),
                };
                Ok((next, request))
            }
            other => Err(LoginFailure::InvalidTransition(other.name())),
        }
    }

    /// The browser has been sent to the provider.
    #[must_use]
    pub fn redirected(self) -> Self {
        match self {
            Self::AwaitingProviderRedirect { state } => Self::AwaitingCallback {
                expected_state: Some(state),
            },
            other => Self::Error(LoginFailure::InvalidTransition(other.name())),
        }
    }

    /// Rebuild `AwaitingCallback` from the persisted state value.
    #[must_use]
    pub fn resume(expected_state: Option<String>) -> Self {
        Self::AwaitingCallback { expected_state }
    }

    /// Validate the provider's callback and return the authorization code.
    ///
    /// Checks, in order: provider `error`, presence of `code`, then `state`
    /// against the persisted value. Empty `error` and `code` values count as
    /// absent.
    ///
    /// # Errors
    ///
    /// The [`LoginFailure`] that moves the flow into `Error`.
    pub fn accept_callback(&self, params: &CallbackParams) -> Result<String, LoginFailure> {
        let Self::AwaitingCallback { expected_state } = self else {
            return Err(LoginFailure::InvalidTransition(self.name()));
        };

        if let Some(error) = params.error.as_deref().filter(|e| !e.is_empty()) {
            return Err(LoginFailure::ProviderDenied(error.to_string()));
        }

        let code = params
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(LoginFailure::MissingAuthorizationCode)?;

        match (expected_state.as_deref(), params.state.as_deref()) {
            (Some(expected), Some(received)) if csrf::state_matches(expected, received) => {
                Ok(code.to_string())
            }
            _ => Err(LoginFailure::StateMismatch),
        }
    }

    /// Final transition once the token exchange has run.
    #[must_use]
    pub fn complete(result: &Result<Session, Error>) -> Self {
        match result {
            Ok(_) => Self::Authenticated,
            Err(e) => Self::Error(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::{ClientSecret, OAuthConfig};
    use crate::types::AccessToken;
    use std::time::Duration;

    fn client() -> AuthClient {
        AuthClient::new(OAuthConfig::new(
            "client",
            ClientSecret::new("secret"),
            "https://example.com/api/auth/callback".parse().unwrap(),
        ))
    }

    fn awaiting(state: &str) -> LoginState {
        LoginState::resume(Some(state.to_string()))
    }

    fn params(code: Option<&str>, state: Option<&str>, error: Option<&str>) -> CallbackParams {
        CallbackParams {
            code: code.map(str::to_string),
            state: state.map(str::to_string),
            error: error.map(str::to_string),
            error_description: None,
        }
    }

    #[test]
    fn begin_then_redirect_awaits_callback_with_state() {
        let (state, request) = LoginState::Unauthenticated.begin(&client()).unwrap();
        assert_eq!(
            state,
            LoginState::AwaitingProviderRedirect {
                state: request.state.clone()
            }
        );

        let next = state.redirected();
        assert_eq!(next, awaiting(&request.state));
    }

    #[test]
    fn error_state_can_restart() {
        let failed = LoginState::Error(LoginFailure::StateMismatch);
        assert!(failed.begin(&client()).is_ok());
    }

    #[test]
    fn begin_rejected_while_authenticated() {
        let err = LoginState::Authenticated.begin(&client()).unwrap_err();
        assert_eq!(err, LoginFailure::InvalidTransition("authenticated"));
    }

    #[test]
    fn provider_error_wins_over_everything() {
        let err = awaiting("s")
            .accept_callback(&params(Some("code"), Some("s"), Some("access_denied")))
            .unwrap_err();
        assert_eq!(err.reason_code(), "access_denied");
    }

    #[test]
    fn empty_error_is_ignored() {
        assert_eq!(
            awaiting("s").accept_callback(&params(Some("c"), Some("s"), Some(""))),
            Ok("c".to_string())
        );
        assert_eq!(
            awaiting("s").accept_callback(&params(None, Some("s"), Some(""))),
            Err(LoginFailure::MissingAuthorizationCode)
        );
    }

    #[test]
    fn missing_code_and_error_is_no_code() {
        let err = awaiting("s")
            .accept_callback(&params(None, Some("s"), None))
            .unwrap_err();
        assert_eq!(err, LoginFailure::MissingAuthorizationCode);
        assert_eq!(err.reason_code(), "no_code");
    }

    #[test]
    fn state_must_match() {
        let state = awaiting("expected");
        assert_eq!(
            state.accept_callback(&params(Some("c"), Some("forged"), None)),
            Err(LoginFailure::StateMismatch)
        );
        assert_eq!(
            state.accept_callback(&params(Some("c"), None, None)),
            Err(LoginFailure::StateMismatch)
        );
        assert_eq!(
            LoginState::resume(None).accept_callback(&params(Some("c"), Some("x"), None)),
            Err(LoginFailure::StateMismatch)
        );
        assert_eq!(
            state.accept_callback(&params(Some("c"), Some("expected"), None)),
            Ok("c".to_string())
        );
    }

    #[test]
    fn complete_maps_exchange_outcome() {
        let ok = Ok(Session {
            access_token: AccessToken::new("a"),
            expires_in: Duration::from_secs(60),
            refresh_token: None,
        });
        assert_eq!(LoginState::complete(&ok), LoginState::Authenticated);

        let rejected = Err(Error::TokenExchangeFailed {
            status: 400,
            body: String::new(),
        });
        assert_eq!(
            LoginState::complete(&rejected),
            LoginState::Error(LoginFailure::TokenExchangeFailed)
        );

        let bad_state = Err(Error::NoRefreshToken);
        assert_eq!(
            LoginState::complete(&bad_state),
            LoginState::Error(LoginFailure::Unexpected)
        );
    }

    #[test]
    fn reason_codes() {
        assert_eq!(LoginFailure::TokenExchangeFailed.reason_code(), "token_exchange_failed");
        assert_eq!(LoginFailure::Unexpected.reason_code(), "unexpected_error");
        assert_eq!(LoginFailure::StateMismatch.reason_code(), "state_mismatch");
    }
}
