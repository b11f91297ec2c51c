use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use serde_json::Value;

use super::config::AuthConfig;
use super::cookies;
use super::error::AuthError;
use super::extractor::{CookieTokenStore, StoredTokens};
use super::state::AuthState;
use super::types::{LogoutResponse, RefreshResponse, TokenStatus};
use crate::error::Error;
use crate::flow::{CallbackParams, LoginFailure, LoginState};
use crate::metadata::{MetadataCache, MetadataKind};

/// Create the application router: auth endpoints, the profile proxy and the
/// cached metadata proxy.
pub fn auth_routes<C>(config: AuthConfig, cache: C) -> Router
where
    C: MetadataCache,
{
    let auth_path = config.settings.auth_path.clone();

    let state = AuthState {
        client: Arc::new(config.client),
        api: Arc::new(config.api),
        metadata: Arc::new(config.metadata),
        cache: Arc::new(cache),
        settings: config.settings,
    };

    Router::new()
        .route(&format!("{auth_path}/login"), get(login::<C>))
        .route(&format!("{auth_path}/callback"), get(callback::<C>))
        .route(&format!("{auth_path}/logout"), post(logout))
        .route(&format!("{auth_path}/refresh"), post(refresh::<C>))
        .route(&format!("{auth_path}/token-status"), get(token_status))
        .route("/api/user/me", get(me::<C>))
        .route("/api/hero/metadata/{id}", get(hero_metadata::<C>))
        .route("/api/sphere/metadata/{id}", get(sphere_metadata::<C>))
        .with_state(state)
}

// ── Login ──────────────────────────────────────────────────────────

async fn login<C: MetadataCache>(
    State(state): State<AuthState<C>>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), Response> {
    let (flow, auth_req) = LoginState::Unauthenticated
        .begin(&state.client)
        .map_err(|failure| login_error(&state.settings.login_page, &failure))?;

    let state_cookie = cookies::state_cookie(
        &auth_req.state,
        state.settings.secure_cookies,
        &state.settings.auth_path,
    );

    let flow = flow.redirected();
    tracing::debug!(flow = flow.name(), "Redirecting to identity provider");

    Ok((jar.add(state_cookie), found(&auth_req.url)))
}

// ── Callback ───────────────────────────────────────────────────────

async fn callback<C: MetadataCache>(
    State(state): State<AuthState<C>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Response) {
    let flow = LoginState::resume(cookies::get_state(&jar));
    let login_page = &state.settings.login_page;

    // The state value is single-use whatever the outcome.
    let jar = jar.remove(cookies::clear_state_cookie(&state.settings.auth_path));

    let code = match flow.accept_callback(&params) {
        Ok(code) => code,
        Err(failure) => {
            match &failure {
                LoginFailure::ProviderDenied(error) => {
                    let desc = params.error_description.as_deref().unwrap_or("Unknown error");
                    tracing::warn!(error = %error, description = %desc, "OAuth2 error from provider");
                }
                LoginFailure::StateMismatch => tracing::warn!("OAuth state mismatch"),
                other => tracing::warn!(reason = other.reason_code(), "OAuth callback rejected"),
            }
            return (jar, login_error(login_page, &failure));
        }
    };

    let result = state
        .client
        .exchange_code(&code, state.client.config().redirect_uri())
        .await;

    let flow = LoginState::complete(&result);
    let session = match result {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, flow = flow.name(), "Token exchange failed");
            return (jar, login_error(login_page, &LoginFailure::from(&e)));
        }
    };

    let secure = state.settings.secure_cookies;
    let mut jar = jar.add(cookies::access_cookie(
        &session.access_token,
        session.expires_in,
        secure,
    ));
    if let Some(refresh_token) = &session.refresh_token {
        jar = jar.add(cookies::refresh_cookie(refresh_token, secure));
    }

    tracing::info!(
        expires_in = session.expires_in.as_secs(),
        refreshable = session.can_refresh(),
        "OAuth2 login successful"
    );

    (jar, found(&state.settings.login_redirect))
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout(jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    // Added rather than removed so the expiry goes out even when the
    // request carried no cookies.
    let jar = jar
        .add(cookies::clear_access_cookie())
        .add(cookies::clear_refresh_cookie());

    tracing::info!("Logged out");
    (jar, Json(LogoutResponse { success: true }))
}

// ── Refresh ────────────────────────────────────────────────────────

async fn refresh<C: MetadataCache>(
    State(state): State<AuthState<C>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<RefreshResponse>), AuthError> {
    let current = cookies::get_refresh_token(&jar);

    let refreshed = state.client.refresh(current.as_ref()).await.map_err(|e| {
        match &e {
            Error::NoRefreshToken => tracing::debug!("Refresh requested without refresh token"),
            _ => tracing::error!(error = %e, "Token refresh failed"),
        }
        AuthError::from_refresh(e)
    })?;

    let secure = state.settings.secure_cookies;
    let mut jar = jar.add(cookies::access_cookie(
        &refreshed.access_token,
        refreshed.expires_in,
        secure,
    ));
    // Keep the existing refresh cookie unless the provider rotated it.
    if let Some(rotated) = &refreshed.refresh_token {
        jar = jar.add(cookies::refresh_cookie(rotated, secure));
    }

    tracing::info!(
        rotated = refreshed.refresh_token.is_some(),
        "Access token refreshed"
    );

    Ok((
        jar,
        Json(RefreshResponse {
            success: true,
            expires_in: refreshed.expires_in.as_secs(),
        }),
    ))
}

// ── Token status ───────────────────────────────────────────────────

async fn token_status(tokens: StoredTokens) -> Json<TokenStatus> {
    Json(TokenStatus {
        has_access_token: tokens.access_token.is_some(),
        has_refresh_token: tokens.refresh_token.is_some(),
    })
}

// ── Upstream proxies ───────────────────────────────────────────────

async fn me<C: MetadataCache>(
    State(state): State<AuthState<C>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Response {
    let store = CookieTokenStore::new(jar);

    match state.api.user_profile(&store).await {
        Ok(profile) => (store.into_jar(), Json(profile)).into_response(),
        Err(Error::Unauthenticated { login_path }) => {
            // The access cookie removal is already queued on the jar.
            let jar = store.into_jar();
            if wants_html(&headers) {
                (jar, found(&login_path)).into_response()
            } else {
                (jar, AuthError::SessionExpired { login_path }).into_response()
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Error fetching user data");
            AuthError::Upstream("Internal server error".into()).into_response()
        }
    }
}

async fn hero_metadata<C: MetadataCache>(
    State(state): State<AuthState<C>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AuthError> {
    metadata(&state, MetadataKind::Hero, &id).await
}

async fn sphere_metadata<C: MetadataCache>(
    State(state): State<AuthState<C>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AuthError> {
    metadata(&state, MetadataKind::Sphere, &id).await
}

async fn metadata<C: MetadataCache>(
    state: &AuthState<C>,
    kind: MetadataKind,
    id: &str,
) -> Result<Json<Value>, AuthError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AuthError::BadRequest("ID is required".into()));
    }

    state
        .metadata
        .fetch_cached(state.cache.as_ref(), kind, id)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(kind = kind.label(), id, error = %e, "Metadata fetch failed");
            AuthError::Upstream(format!("Failed to fetch {} metadata", kind.label()))
        })
}

// ── Helpers ────────────────────────────────────────────────────────

fn login_error(login_page: &str, failure: &LoginFailure) -> Response {
    let encoded = urlencoding::encode(failure.reason_code());
    found(&format!("{login_page}?error={encoded}"))
}

/// 302 to `location`.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/html"))
}
