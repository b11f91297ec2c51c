use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use parking_lot::Mutex;

use super::cookies;
use crate::api::TokenStore;
use crate::types::{AccessToken, RefreshToken};

/// Tokens carried by the request's cookies.
///
/// Never rejects: a request without cookies simply yields `None`s.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(tokens: StoredTokens) -> impl IntoResponse {
///     if tokens.access_token.is_some() { "signed in" } else { "anonymous" }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct StoredTokens {
    pub access_token: Option<AccessToken>,
    pub refresh_token: Option<RefreshToken>,
}

impl StoredTokens {
    #[must_use]
    pub fn from_jar(jar: &CookieJar) -> Self {
        Self {
            access_token: cookies::get_access_token(jar),
            refresh_token: cookies::get_refresh_token(jar),
        }
    }
}

impl<S> FromRequestParts<S> for StoredTokens
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state).await?;
        Ok(Self::from_jar(&jar))
    }
}

/// [`TokenStore`] over the request's cookie jar.
///
/// Clearing the token queues a removal cookie; hand the jar back with
/// [`into_jar`](Self::into_jar) so the removal reaches the browser.
pub struct CookieTokenStore {
    jar: Mutex<CookieJar>,
}

impl CookieTokenStore {
    #[must_use]
    pub fn new(jar: CookieJar) -> Self {
        Self {
            jar: Mutex::new(jar),
        }
    }

    #[must_use]
    pub fn into_jar(self) -> CookieJar {
        self.jar.into_inner()
    }
}

impl TokenStore for CookieTokenStore {
    fn access_token(&self) -> Option<AccessToken> {
        cookies::get_access_token(&self.jar.lock())
    }

    fn clear_access_token(&self) {
        let mut jar = self.jar.lock();
        *jar = jar.clone().remove(cookies::clear_access_cookie());
    }
}
