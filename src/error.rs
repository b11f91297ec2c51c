/// Errors raised by the token exchange client, the authenticated API client
/// and the metadata client.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The token endpoint rejected an authorization-code grant.
    #[error("token exchange failed with status {status}: {body}")]
    TokenExchangeFailed { status: u16, body: String },

    /// The token endpoint rejected a refresh-token grant.
    #[error("token refresh failed with status {status}: {body}")]
    RefreshFailed { status: u16, body: String },

    /// A refresh was requested without a refresh token.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Transport or decoding failure while talking to the token endpoint.
    #[error("unexpected auth error: {0}")]
    UnexpectedAuthError(#[source] reqwest::Error),

    /// The upstream API answered 401. The stored access token has already been purged.
    #[error("upstream rejected the access token; login again at {login_path}")]
    Unauthenticated { login_path: String },

    /// The upstream API answered with a non-success status other than 401.
    #[error("{operation} failed with status {status}: {body}")]
    Upstream {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
