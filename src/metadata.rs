//! Read-only metadata lookups against the public game metadata service,
//! fronted by an injectable TTL cache.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::Value;
use url::Url;

use crate::error::Error;

/// How long a fetched metadata payload is served from cache.
pub const METADATA_TTL: Duration = Duration::from_secs(3600);

/// Entity kinds with public metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    Hero,
    Sphere,
}

impl MetadataKind {
    /// Upstream path segment (`/metadata/<segment>/<id>`).
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Hero => "units",
            Self::Sphere => "spheres",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Sphere => "sphere",
        }
    }
}

/// Cache key: entity kind plus upstream id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: MetadataKind,
    pub id: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(kind: MetadataKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// Cache in front of metadata fetches.
///
/// Any backing store works as long as it honors the contract: a value younger
/// than `ttl` is returned without calling `fetch`; otherwise `fetch` runs, and
/// a successful result is stored and returned. Failed fetches are not cached.
pub trait MetadataCache: Send + Sync + 'static {
    fn get_or_fetch<F, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        fetch: F,
    ) -> impl Future<Output = Result<Value, Error>> + Send
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Value, Error>> + Send;
}

#[derive(Debug)]
struct CachedEntry {
    value: Value,
    fetched_at: Instant,
}

/// In-process [`MetadataCache`].
///
/// Entries are only checked for staleness on read and are never evicted, so
/// the map grows with the number of distinct ids requested. Concurrent misses
/// for the same key both fetch; the last write wins.
#[derive(Debug, Default)]
pub struct InMemoryMetadataCache {
    entries: Mutex<HashMap<CacheKey, CachedEntry>>,
}

impl InMemoryMetadataCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn fresh(&self, key: &CacheKey, ttl: Duration) -> Option<Value> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < ttl)
            .map(|entry| entry.value.clone())
    }
}

impl MetadataCache for InMemoryMetadataCache {
    async fn get_or_fetch<F, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        fetch: F,
    ) -> Result<Value, Error>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Value, Error>> + Send,
    {
        if let Some(value) = self.fresh(&key, ttl) {
            tracing::debug!(kind = key.kind.label(), id = %key.id, "Metadata cache hit");
            return Ok(value);
        }

        tracing::debug!(kind = key.kind.label(), id = %key.id, "Metadata cache miss");
        let value = fetch().await?;

        self.entries.lock().insert(
            key,
            CachedEntry {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(value)
    }
}

/// Client for the public metadata endpoints. No authentication is attached.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    http: reqwest::Client,
    base_url: Url,
}

impl MetadataClient {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Fetch raw metadata for one entity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] on a non-success status and [`Error::Http`]
    /// on transport or decoding failure.
    pub async fn fetch(&self, kind: MetadataKind, id: &str) -> Result<Value, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(["metadata", kind.path_segment(), id]);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                operation: "metadata request",
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }

    /// Fetch through `cache` with the standard [`METADATA_TTL`].
    ///
    /// # Errors
    ///
    /// See [`fetch`](Self::fetch).
    pub async fn fetch_cached<C>(
        &self,
        cache: &C,
        kind: MetadataKind,
        id: &str,
    ) -> Result<Value, Error>
    where
        C: MetadataCache,
    {
        cache
            .get_or_fetch(CacheKey::new(kind, id), METADATA_TTL, || self.fetch(kind, id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn cache_serves_fresh_entry_without_fetching() {
        let cache = InMemoryMetadataCache::new();
        let calls = AtomicUsize::new(0);
        let key = CacheKey::new(MetadataKind::Hero, "1");

        for _ in 0..2 {
            let value = cache
                .get_or_fetch(key.clone(), METADATA_TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({"rarity": 5}))
                })
                .await
                .unwrap();
            assert_eq!(value["rarity"], 5);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn cache_refetches_stale_entry() {
        let cache = InMemoryMetadataCache::new();
        let key = CacheKey::new(MetadataKind::Sphere, "7");

        cache
            .get_or_fetch(key.clone(), Duration::ZERO, || async { Ok(json!(1)) })
            .await
            .unwrap();
        let value = cache
            .get_or_fetch(key, Duration::ZERO, || async { Ok(json!(2)) })
            .await
            .unwrap();

        assert_eq!(value, json!(2));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn cache_does_not_store_failures() {
        let cache = InMemoryMetadataCache::new();
        let key = CacheKey::new(MetadataKind::Hero, "9");

        let result = cache
            .get_or_fetch(key, METADATA_TTL, || async {
                Err(Error::Upstream {
                    operation: "metadata request",
                    status: 500,
                    body: String::new(),
                })
            })
            .await;

        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn kinds_are_cached_separately() {
        let cache = InMemoryMetadataCache::new();
        cache
            .get_or_fetch(CacheKey::new(MetadataKind::Hero, "1"), METADATA_TTL, || async {
                Ok(json!("hero"))
            })
            .await
            .unwrap();
        let sphere = cache
            .get_or_fetch(CacheKey::new(MetadataKind::Sphere, "1"), METADATA_TTL, || async {
                Ok(json!("sphere"))
            })
            .await
            .unwrap();

        assert_eq!(sphere, json!("sphere"));
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn client_fetches_kind_specific_path_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metadata/spheres/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Orb"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = MetadataClient::new(server.uri().parse().unwrap());
        let cache = InMemoryMetadataCache::new();

        let first = client
            .fetch_cached(&cache, MetadataKind::Sphere, "42")
            .await
            .unwrap();
        let second = client
            .fetch_cached(&cache, MetadataKind::Sphere, "42")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first["name"], "Orb");
    }

    #[tokio::test]
    async fn client_reports_upstream_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/metadata/units/404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = MetadataClient::new(server.uri().parse().unwrap());
        let err = client.fetch(MetadataKind::Hero, "404").await.unwrap_err();

        assert!(matches!(err, Error::Upstream { status: 404, .. }));
    }
}
