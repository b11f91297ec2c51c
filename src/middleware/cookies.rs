use std::time::Duration as StdDuration;

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::types::{AccessToken, REFRESH_TOKEN_TTL, RefreshToken};

pub(crate) const ACCESS_COOKIE_NAME: &str = "bfh_access_token";
pub(crate) const REFRESH_COOKIE_NAME: &str = "bfh_refresh_token";
pub(crate) const STATE_COOKIE_NAME: &str = "bfh_oauth_state";

const STATE_COOKIE_TTL: Duration = Duration::minutes(10);

fn max_age(ttl: StdDuration) -> Duration {
    Duration::seconds(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
}

/// Access-token cookie. Script-readable so the browser-side client can put it
/// in an `Authorization` header itself.
pub(super) fn access_cookie(token: &AccessToken, ttl: StdDuration, secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE_NAME, token.as_str().to_string()))
        .http_only(false)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age(ttl))
        .build()
}

/// Refresh-token cookie. Never readable from page script.
pub(super) fn refresh_cookie(token: &RefreshToken, secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, token.as_str().to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age(REFRESH_TOKEN_TTL))
        .build()
}

/// Removal cookie for the access token.
pub(super) fn clear_access_cookie() -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE_NAME, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Removal cookie for the refresh token.
pub(super) fn clear_refresh_cookie() -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// CSRF state cookie, scoped to the auth routes.
pub(super) fn state_cookie(state: &str, secure: bool, auth_path: &str) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE_NAME, state.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path(auth_path.to_string())
        .max_age(STATE_COOKIE_TTL)
        .build()
}

/// Removal cookie for the CSRF state.
pub(super) fn clear_state_cookie(auth_path: &str) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE_NAME, ""))
        .path(auth_path.to_string())
        .max_age(Duration::ZERO)
        .build()
}

pub(super) fn get_access_token(jar: &CookieJar) -> Option<AccessToken> {
    jar.get(ACCESS_COOKIE_NAME)
        .map(|c| c.value())
        .filter(|v| !v.is_empty())
        .map(AccessToken::new)
}

pub(super) fn get_refresh_token(jar: &CookieJar) -> Option<RefreshToken> {
    jar.get(REFRESH_COOKIE_NAME)
        .map(|c| c.value())
        .filter(|v| !v.is_empty())
        .map(RefreshToken::new)
}

pub(super) fn get_state(jar: &CookieJar) -> Option<String> {
    jar.get(STATE_COOKIE_NAME).map(|c| c.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_cookie_is_script_readable() {
        let cookie = access_cookie(&AccessToken::new("abc"), StdDuration::from_secs(1800), true);

        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(false));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(1800)));
    }

    #[test]
    fn refresh_cookie_is_http_only_for_thirty_days() {
        let cookie = refresh_cookie(&RefreshToken::new("xyz"), false);

        assert_eq!(cookie.value(), "xyz");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.max_age(), Some(Duration::days(30)));
    }

    #[test]
    fn state_cookie_is_scoped_to_auth_path() {
        let cookie = state_cookie("deadbeef", true, "/api/auth");

        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/api/auth"));
        assert_eq!(cookie.max_age(), Some(Duration::minutes(10)));
    }

    #[test]
    fn empty_cookie_values_are_ignored() {
        let jar = CookieJar::new()
            .add(Cookie::new(ACCESS_COOKIE_NAME, ""))
            .add(Cookie::new(REFRESH_COOKIE_NAME, "r"));

        assert!(get_access_token(&jar).is_none());
        assert_eq!(get_refresh_token(&jar).unwrap().as_str(), "r");
    }
}
