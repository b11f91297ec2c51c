//! Cookie-based Brave Frontier Heroes login for Axum.
//!
//! Mounts the OAuth2 authorization-code flow under `/api/auth`, a profile
//! proxy at `/api/user/me` and cached hero/sphere metadata proxies. Tokens
//! live in browser cookies; the server keeps no session table.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use bfh_auth::metadata::InMemoryMetadataCache;
//! use bfh_auth::middleware::{AuthConfig, auth_routes};
//!
//! let config = AuthConfig::from_env()?;
//!
//! let app = axum::Router::new()
//!     .merge(auth_routes(config, InMemoryMetadataCache::new()));
//! ```
//!
//! Handlers of your own can read the cookies with the [`StoredTokens`]
//! extractor, or call the upstream API through [`CookieTokenStore`].

mod config;
mod cookies;
mod error;
mod extractor;
mod routes;
mod state;
mod types;

pub use config::AuthConfig;
pub use error::AuthError;
pub use extractor::{CookieTokenStore, StoredTokens};
pub use routes::auth_routes;
pub use types::{ErrorBody, LogoutResponse, RefreshResponse, TokenStatus};
