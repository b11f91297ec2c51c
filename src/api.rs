//! Token-bearing client for the upstream game API.
//!
//! Every request goes through [`ApiClient::execute`], which attaches the
//! stored access token and applies the 401 policy: the token is discarded and
//! the caller is told to send the user back to the login page. There is no
//! refresh-and-retry here; refresh is a separate, caller-initiated operation.

use parking_lot::RwLock;
use reqwest::Method;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Error;
use crate::types::AccessToken;

/// Where the authenticated client reads and purges the current access token.
pub trait TokenStore: Send + Sync {
    /// Currently stored access token, if any.
    fn access_token(&self) -> Option<AccessToken>;

    /// Discard the stored access token.
    fn clear_access_token(&self);
}

/// Process-local token store, for non-browser callers.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    token: RwLock<Option<AccessToken>>,
}

impl InMemoryTokenStore {
    #[must_use]
    pub fn new(token: Option<AccessToken>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    pub fn set(&self, token: AccessToken) {
        *self.token.write() = Some(token);
    }
}

impl TokenStore for InMemoryTokenStore {
    fn access_token(&self) -> Option<AccessToken> {
        self.token.read().clone()
    }

    fn clear_access_token(&self) {
        self.token.write().take();
    }
}

/// Authenticated client for the upstream API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    login_path: String,
}

impl ApiClient {
    /// `login_path` is the page users are sent to after a 401.
    #[must_use]
    pub fn new(base_url: Url, login_path: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            login_path: login_path.into(),
        }
    }

    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Send a request to `path` under the base URL.
    ///
    /// `path` is appended segment by segment, so a prefix on the base URL
    /// (`https://host/api`) is kept. A missing token does not block the
    /// request; the upstream API decides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] on 401, after the token has been
    /// cleared from `store`. Transport failures surface as [`Error::Http`].
    pub async fn execute<S>(
        &self,
        store: &S,
        method: Method,
        path: &str,
    ) -> Result<reqwest::Response, Error>
    where
        S: TokenStore + ?Sized,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));

        let mut request = self.http.request(method, url);
        if let Some(token) = store.access_token() {
            request = request.bearer_auth(token.as_str());
        }

        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            store.clear_access_token();
            tracing::info!(path, "Upstream rejected access token, session purged");
            return Err(Error::Unauthenticated {
                login_path: self.login_path.clone(),
            });
        }

        Ok(response)
    }

    /// GET `path` and decode a JSON body.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute), plus [`Error::Upstream`] for any
    /// other non-success status.
    pub async fn get_json<S, T>(
        &self,
        store: &S,
        path: &str,
        operation: &'static str,
    ) -> Result<T, Error>
    where
        S: TokenStore + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(store, Method::GET, path).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                operation,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }

    /// Fetch the signed-in user's profile (`/v1/me`).
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn user_profile<S>(&self, store: &S) -> Result<serde_json::Value, Error>
    where
        S: TokenStore + ?Sized,
    {
        self.get_json(store, "v1/me", "profile request").await
    }
}
