use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::csrf;
use crate::error::Error;
use crate::types::{
    AccessToken, DEFAULT_ACCESS_TOKEN_TTL, RefreshToken, RefreshedTokens, Session,
};

/// Confidential client secret. Only ever sent through HTTP Basic.
#[derive(Clone)]
pub struct ClientSecret(String);

impl ClientSecret {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }
}

impl std::fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ClientSecret(..)")
    }
}

/// Brave Frontier Heroes `OAuth2` configuration.
///
/// Required fields are constructor parameters.
///
/// ```rust,ignore
/// use bfh_auth::{ClientSecret, OAuthConfig};
///
/// let config = OAuthConfig::new(
///     "my-client-id",
///     ClientSecret::new("my-secret"),
///     "https://my-app.com/api/auth/callback".parse()?,
/// )
/// .with_token_url("https://auth.example.com/oauth2/token".parse()?);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct OAuthConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: ClientSecret,
    pub(crate) auth_url: Url,
    pub(crate) token_url: Url,
    pub(crate) redirect_uri: Url,
    pub(crate) scopes: Vec<String>,
}

impl OAuthConfig {
    /// Create a new OAuth2 configuration.
    ///
    /// `redirect_uri` is sent both in the authorization redirect and in the
    /// code exchange, so the two always match.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: ClientSecret,
        redirect_uri: Url,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            redirect_uri,
            auth_url: "https://auth.bravefrontierheroes.com/oauth2/auth"
                .parse()
                .expect("valid default URL"),
            token_url: "https://auth.bravefrontierheroes.com/oauth2/token"
                .parse()
                .expect("valid default URL"),
            scopes: vec![
                "openid".into(),
                "profile".into(),
                "email".into(),
                "offline_access".into(),
            ],
        }
    }

    /// Override the authorization endpoint.
    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    /// Override the token endpoint.
    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    /// Override the scopes (default: `openid profile email offline_access`).
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

/// Authorization redirect plus the CSRF `state` to persist until the callback.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Token endpoint response body.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    fn expires_in(&self) -> Duration {
        self.expires_in
            .map_or(DEFAULT_ACCESS_TOKEN_TTL, Duration::from_secs)
    }

    fn into_session(self) -> Session {
        Session {
            expires_in: self.expires_in(),
            access_token: AccessToken::new(self.access_token),
            refresh_token: self.refresh_token.map(RefreshToken::new),
        }
    }

    fn into_refreshed(self) -> RefreshedTokens {
        RefreshedTokens {
            expires_in: self.expires_in(),
            access_token: AccessToken::new(self.access_token),
            refresh_token: self.refresh_token.map(RefreshToken::new),
        }
    }
}

#[derive(Clone, Copy)]
enum Grant {
    AuthorizationCode,
    RefreshToken,
}

/// `OAuth2` confidential client for the Brave Frontier Heroes identity provider.
///
/// Every token-endpoint call is a single attempt; failures are returned to the
/// caller, which decides whether to send the user back through login.
pub struct AuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl AuthClient {
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse, timeouts or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Generate an authorization URL with a fresh CSRF `state`.
    #[must_use]
    pub fn authorization_url(&self) -> AuthorizationRequest {
        let state = csrf::generate_state();
        let scope = self.config.scopes.join(" ");

        let mut url = self.config.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("scope", &scope)
            .append_pair("state", &state);

        AuthorizationRequest {
            url: url.into(),
            state,
        }
    }

    /// Exchange an authorization code for a new [`Session`].
    ///
    /// `redirect_uri` must be the exact URI sent in the authorization redirect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TokenExchangeFailed`] if the token endpoint answers
    /// non-2xx, or [`Error::UnexpectedAuthError`] on transport/decoding failure.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &Url) -> Result<Session, Error> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri.as_str()),
        ];

        let tokens = self.token_request(&params, Grant::AuthorizationCode).await?;
        Ok(tokens.into_session())
    }

    /// Rotate tokens with a refresh-token grant.
    ///
    /// When the provider does not return a new refresh token, the caller keeps
    /// the one it already has (see [`Session::apply_refresh`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRefreshToken`] without any network call when
    /// `refresh_token` is `None`, [`Error::RefreshFailed`] if the token
    /// endpoint answers non-2xx, or [`Error::UnexpectedAuthError`] on
    /// transport/decoding failure.
    pub async fn refresh(
        &self,
        refresh_token: Option<&RefreshToken>,
    ) -> Result<RefreshedTokens, Error> {
        let refresh_token = refresh_token.ok_or(Error::NoRefreshToken)?;
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
        ];

        let tokens = self.token_request(&params, Grant::RefreshToken).await?;
        Ok(tokens.into_refreshed())
    }

    /// POST a grant to the token endpoint, authenticating with HTTP Basic.
    async fn token_request(
        &self,
        params: &[(&str, &str)],
        grant: Grant,
    ) -> Result<TokenResponse, Error> {
        let response = self
            .http
            .post(self.config.token_url.clone())
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret.0))
            .form(params)
            .send()
            .await
            .map_err(Error::UnexpectedAuthError)?;

        let status = response.status();
        if !status.is_success() {
            let status = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(match grant {
                Grant::AuthorizationCode => Error::TokenExchangeFailed { status, body },
                Grant::RefreshToken => Error::RefreshFailed { status, body },
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(Error::UnexpectedAuthError)
    }
}
