//! Album data service.
//!
//! The `AlbumService` trait is the async request/response boundary invoked
//! from the screen's handlers. `CatalogService` answers from memory with
//! configurable latency, timeout and failure, which is enough to drive the
//! screen without network transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::entity::{Album, AlbumSummary, Cover, SearchAlbums};
use crate::error::ServiceError;

// =============================================================================
// AlbumService Trait
// =============================================================================

/// Async album lookups. Implementations own their latency and timeout policy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlbumService: Send + Sync {
    /// Search albums by free-text query.
    async fn search_albums(&self, query: &str) -> Result<SearchAlbums, ServiceError>;

    /// Fetch the detail behind a search hit's link.
    async fn album(&self, link: &str) -> Result<Album, ServiceError>;
}

// =============================================================================
// Catalog Service
// =============================================================================

/// A catalog row: the search hit and its detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub summary: AlbumSummary,
    pub album: Album,
}

impl CatalogEntry {
    pub fn new(link: &str, title: &str, covers: &[&str]) -> Self {
        Self {
            summary: AlbumSummary::new(link, title),
            album: Album {
                name: title.to_string(),
                covers: covers
                    .iter()
                    .map(|thumb| Cover {
                        thumb: thumb.to_string(),
                    })
                    .collect(),
            },
        }
    }
}

/// In-memory album service.
pub struct CatalogService {
    entries: RwLock<Vec<CatalogEntry>>,
    latency: Duration,
    timeout: Option<Duration>,
    failing: AtomicBool,
}

impl CatalogService {
    /// Create a service answering from `entries`.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
            latency: Duration::ZERO,
            timeout: None,
            failing: AtomicBool::new(false),
        }
    }

    /// Delay every answer.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail answers slower than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Make every following call fail with `ServiceError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// Add an entry to the catalog.
    pub fn insert(&self, entry: CatalogEntry) {
        self.entries.write().push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Wait out the latency, then answer with `lookup`, bounded by the timeout.
    async fn respond<T, F>(&self, lookup: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&[CatalogEntry]) -> Result<T, ServiceError> + Send,
        T: Send,
    {
        let answer = async {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if self.failing.load(Ordering::Acquire) {
                return Err(ServiceError::Unavailable("catalog offline".to_string()));
            }
            let entries = self.entries.read();
            lookup(&entries)
        };

        match self.timeout {
            Some(duration) => tokio::time::timeout(duration, answer)
                .await
                .map_err(|_| ServiceError::Timeout { duration })?,
            None => answer.await,
        }
    }
}

#[async_trait]
impl AlbumService for CatalogService {
    async fn search_albums(&self, query: &str) -> Result<SearchAlbums, ServiceError> {
        let needle = query.trim().to_lowercase();
        let results = self
            .respond(|entries| {
                Ok(entries
                    .iter()
                    .filter(|e| e.summary.title().to_lowercase().contains(&needle))
                    .map(|e| e.summary.clone())
                    .collect::<Vec<_>>())
            })
            .await?;

        tracing::debug!("Catalog search {:?}: {} hit(s)", query, results.len());
        Ok(SearchAlbums::new(results))
    }

    async fn album(&self, link: &str) -> Result<Album, ServiceError> {
        self.respond(|entries| {
            entries
                .iter()
                .find(|e| e.summary.link == link)
                .map(|e| e.album.clone())
                .ok_or_else(|| ServiceError::NotFound {
                    link: link.to_string(),
                })
        })
        .await
    }
}

/// Built-in catalog used by the demo and tests.
pub fn sample_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new(
            "album/1001",
            "Kuuki Album A",
            &["https://media.vgm.io/albums/01/1001/1001-thumb.jpg"],
        ),
        CatalogEntry::new(
            "album/1002",
            "Kuuki Album B",
            &["https://media.vgm.io/albums/02/1002/1002-thumb.jpg"],
        ),
        CatalogEntry::new("album/2001", "Ocarina Arrangements", &[]),
        CatalogEntry::new(
            "album/2002",
            "Chrono Cross Original Soundtrack",
            &["https://media.vgm.io/albums/02/2002/2002-thumb.jpg"],
        ),
    ]
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let service = CatalogService::new(sample_catalog());
        let results = service.search_albums("KUUKI").await.unwrap();
        let titles: Vec<&str> = results.albums().iter().map(|a| a.title()).collect();
        assert_eq!(titles, vec!["Kuuki Album A", "Kuuki Album B"]);
    }

    #[tokio::test]
    async fn test_search_without_hits_is_empty() {
        let service = CatalogService::new(sample_catalog());
        let results = service.search_albums("zzz").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_album_lookup() {
        let service = CatalogService::new(sample_catalog());
        let album = service.album("album/2002").await.unwrap();
        assert_eq!(album.name, "Chrono Cross Original Soundtrack");
        assert_eq!(album.covers.len(), 1);

        let missing = service.album("album/9").await;
        assert!(matches!(missing, Err(ServiceError::NotFound { link }) if link == "album/9"));
    }

    #[tokio::test]
    async fn test_failing_switch() {
        let service = CatalogService::new(sample_catalog());
        service.set_failing(true);
        assert!(matches!(
            service.search_albums("kuuki").await,
            Err(ServiceError::Unavailable(_))
        ));

        service.set_failing(false);
        assert!(service.search_albums("kuuki").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_and_timeout() {
        let service = CatalogService::new(sample_catalog())
            .with_latency(Duration::from_millis(500))
            .with_timeout(Duration::from_millis(100));

        let result = service.search_albums("kuuki").await;
        assert!(matches!(result, Err(ServiceError::Timeout { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_within_timeout() {
        let service = CatalogService::new(sample_catalog())
            .with_latency(Duration::from_millis(10))
            .with_timeout(Duration::from_secs(1));

        let start = tokio::time::Instant::now();
        let results = service.search_albums("ocarina").await.unwrap();
        assert_eq!(results.albums().len(), 1);
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_insert() {
        let service = CatalogService::new(Vec::new());
        assert!(service.is_empty());
        service.insert(CatalogEntry::new("album/1", "One", &[]));
        assert_eq!(service.len(), 1);
    }
}
