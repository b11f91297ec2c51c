use url::Url;

use super::error::AuthError;
use crate::api::ApiClient;
use crate::metadata::MetadataClient;
use crate::oauth::{AuthClient, ClientSecret, OAuthConfig};

const DEFAULT_API_BASE_URL: &str = "https://api.bravefrontierheroes.com";
const DEFAULT_METADATA_BASE_URL: &str = "https://core.bravefrontierheroes.com";

/// Shared auth settings used by both config and runtime state.
#[derive(Debug, Clone)]
pub(crate) struct AuthSettings {
    pub(crate) secure_cookies: bool,
    pub(crate) auth_path: String,
    pub(crate) login_redirect: String,
    pub(crate) login_page: String,
}

impl AuthSettings {
    fn defaults() -> Self {
        Self {
            secure_cookies: true,
            auth_path: "/api/auth".into(),
            login_redirect: "/dashboard".into(),
            login_page: "/login".into(),
        }
    }
}

/// Application configuration.
///
/// The auth client is a constructor parameter; everything else has a default.
///
/// Use [`from_env()`](AuthConfig::from_env) for convention-based setup,
/// or [`new()`](AuthConfig::new) with `with_*` methods for full control.
pub struct AuthConfig {
    pub(super) client: AuthClient,
    pub(super) api: ApiClient,
    pub(super) metadata: MetadataClient,
    pub(super) settings: AuthSettings,
}

impl AuthConfig {
    /// Create config with the required `AuthClient`.
    ///
    /// The upstream API and metadata clients point at the public Brave
    /// Frontier Heroes hosts; override with `with_*` methods.
    #[must_use]
    pub fn new(client: AuthClient) -> Self {
        let settings = AuthSettings::defaults();
        Self {
            client,
            api: ApiClient::new(
                DEFAULT_API_BASE_URL.parse().expect("valid default URL"),
                settings.login_page.clone(),
            ),
            metadata: MetadataClient::new(
                DEFAULT_METADATA_BASE_URL.parse().expect("valid default URL"),
            ),
            settings,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `CLIENT_ID` (or `NEXT_PUBLIC_CLIENT_ID`): OAuth2 client ID
    /// - `CLIENT_SECRET`: OAuth2 client secret
    /// - `BFH_REDIRECT_URI`: OAuth2 callback URI (must be a valid URL)
    ///
    /// # Optional env vars
    /// - `BFH_AUTH_URL`: Override the authorize endpoint
    /// - `BFH_TOKEN_URL`: Override the token endpoint
    /// - `BFH_API_BASE_URL`: Override the upstream game API
    /// - `BFH_METADATA_BASE_URL`: Override the public metadata host
    /// - `BFH_SCOPES`: Space- or comma-separated OAuth2 scopes
    /// - `DEV_AUTH`: Set to `"1"` or `"true"` to drop the `Secure` cookie flag
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if required env vars are missing or URLs are invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        let client_id = std::env::var("CLIENT_ID")
            .or_else(|_| std::env::var("NEXT_PUBLIC_CLIENT_ID"))
            .map_err(|_| AuthError::Config("CLIENT_ID is required".into()))?;
        let client_secret = std::env::var("CLIENT_SECRET")
            .map_err(|_| AuthError::Config("CLIENT_SECRET is required".into()))?;
        let redirect_uri = required_url("BFH_REDIRECT_URI")?;

        let mut oauth = OAuthConfig::new(client_id, ClientSecret::new(client_secret), redirect_uri);

        if let Some(url) = optional_url("BFH_AUTH_URL")? {
            oauth = oauth.with_auth_url(url);
        }
        if let Some(url) = optional_url("BFH_TOKEN_URL")? {
            oauth = oauth.with_token_url(url);
        }
        if let Ok(scopes) = std::env::var("BFH_SCOPES") {
            oauth = oauth.with_scopes(
                scopes
                    .split([',', ' '])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }

        let dev_auth = matches!(
            std::env::var("DEV_AUTH").as_deref(),
            Ok("1") | Ok("true"),
        );

        let mut config = Self::new(AuthClient::new(oauth)).with_secure_cookies(!dev_auth);

        if let Some(url) = optional_url("BFH_API_BASE_URL")? {
            config = config.with_api_base_url(url);
        }
        if let Some(url) = optional_url("BFH_METADATA_BASE_URL")? {
            config = config.with_metadata_client(MetadataClient::new(url));
        }

        Ok(config)
    }

    /// Point the authenticated client at a different upstream API.
    #[must_use]
    pub fn with_api_base_url(mut self, url: Url) -> Self {
        self.api = ApiClient::new(url, self.settings.login_page.clone());
        self
    }

    #[must_use]
    pub fn with_api_client(mut self, api: ApiClient) -> Self {
        self.api = api;
        self
    }

    #[must_use]
    pub fn with_metadata_client(mut self, metadata: MetadataClient) -> Self {
        self.metadata = metadata;
        self
    }

    /// Share one `reqwest::Client` (timeouts, proxies) across the token,
    /// API and metadata clients.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.client = self.client.with_http_client(http.clone());
        self.api = self.api.with_http_client(http.clone());
        self.metadata = self.metadata.with_http_client(http);
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_auth_path(mut self, path: impl Into<String>) -> Self {
        self.settings.auth_path = path.into();
        self
    }

    /// Where the user lands after a successful login (default `/dashboard`).
    #[must_use]
    pub fn with_login_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.login_redirect = path.into();
        self
    }

    /// Login entry point used for failed callbacks and upstream 401s (default `/login`).
    #[must_use]
    pub fn with_login_page(mut self, path: impl Into<String>) -> Self {
        self.settings.login_page = path.into();
        self.api = self.api.with_login_path(self.settings.login_page.clone());
        self
    }
}

fn required_url(var: &str) -> Result<Url, AuthError> {
    optional_url(var)?.ok_or_else(|| AuthError::Config(format!("{var} is required")))
}

fn optional_url(var: &str) -> Result<Option<Url>, AuthError> {
    match std::env::var(var) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|e| AuthError::Config(format!("{var}: {e}"))),
        Err(_) => Ok(None),
    }
}
