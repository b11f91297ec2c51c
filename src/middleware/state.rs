use std::sync::Arc;

use super::config::AuthSettings;
use crate::api::ApiClient;
use crate::metadata::{MetadataCache, MetadataClient};
use crate::oauth::AuthClient;

/// Shared state for route handlers.
pub(super) struct AuthState<C> {
    pub(super) client: Arc<AuthClient>,
    pub(super) api: Arc<ApiClient>,
    pub(super) metadata: Arc<MetadataClient>,
    pub(super) cache: Arc<C>,
    pub(super) settings: AuthSettings,
}

// Manual Clone: avoid derive adding a `C: Clone` bound.
impl<C: MetadataCache> Clone for AuthState<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            api: self.api.clone(),
            metadata: self.metadata.clone(),
            cache: self.cache.clone(),
            settings: self.settings.clone(),
        }
    }
}
