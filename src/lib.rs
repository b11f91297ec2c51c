#![doc = include_str!("../README.md")]

pub mod api;
pub mod csrf;
pub mod error;
pub mod flow;
pub mod metadata;
#[cfg(feature = "middleware")]
pub mod middleware;
pub mod oauth;
pub mod types;

// Re-exports for convenient access
pub use api::{ApiClient, InMemoryTokenStore, TokenStore};
pub use csrf::generate_state;
pub use error::Error;
pub use flow::{CallbackParams, LoginFailure, LoginState};
pub use metadata::{InMemoryMetadataCache, MetadataCache, MetadataClient, MetadataKind};
pub use oauth::{AuthClient, AuthorizationRequest, ClientSecret, OAuthConfig, TokenResponse};
pub use types::{AccessToken, RefreshToken, RefreshedTokens, Session};
