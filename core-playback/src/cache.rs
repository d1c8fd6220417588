//! # Buffer Cache
//!
//! Fetches, decodes and memoizes audio buffers keyed by logical path.
//!
//! ## Overview
//!
//! - Entries are append-only for the lifetime of the cache; the catalog is
//!   small and fixed, so nothing is evicted.
//! - Each path is fetched and decoded at most once. A request for a path that
//!   is already loading joins the in-flight load instead of starting another.
//! - When two loads for the same path do complete (only possible after a
//!   failed load was retried), the first stored buffer wins.
//! - Failures are logged and leave the path absent; the next request retries.
//! - `max_concurrent_loads` bounds simultaneous fetch+decode work.

use crate::decoder::BufferDecoder;
use crate::error::{PlaybackError, Result};
use bridge_traits::{AssetFetcher, DecodedBuffer};
use core_runtime::events::{EventBus, SoundEvent};
use core_runtime::logging::strip_path;
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

type LoadFuture = Shared<BoxFuture<'static, Option<Arc<DecodedBuffer>>>>;

/// Outcome counts of a [`BufferCache::preload`] batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadSummary {
    /// Paths fetched and decoded by this batch
    pub loaded: usize,
    /// Paths whose fetch or decode failed
    pub failed: usize,
    /// Paths already cached or already loading elsewhere
    pub skipped: usize,
}

/// Entries, in-flight loads and fetches are all keyed by the trimmed path.
fn cache_key(path: &str) -> &str {
    path.trim()
}

enum Lookup {
    Cached(Arc<DecodedBuffer>),
    Joined(LoadFuture),
    Started(LoadFuture),
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Arc<DecodedBuffer>>,
    in_flight: HashMap<String, LoadFuture>,
}

struct CacheInner {
    fetcher: Arc<dyn AssetFetcher>,
    decoder: Arc<dyn BufferDecoder>,
    state: Mutex<CacheState>,
    load_permits: Semaphore,
    events: Option<EventBus>,
}

/// Process-wide cache of decoded buffers. Cloning yields another handle on
/// the same cache.
#[derive(Clone)]
pub struct BufferCache {
    inner: Arc<CacheInner>,
}

impl BufferCache {
    pub fn new(
        fetcher: Arc<dyn AssetFetcher>,
        decoder: Arc<dyn BufferDecoder>,
        max_concurrent_loads: usize,
        events: Option<EventBus>,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                fetcher,
                decoder,
                state: Mutex::new(CacheState::default()),
                load_permits: Semaphore::new(max_concurrent_loads.max(1)),
                events,
            }),
        }
    }

    /// Cached buffer for `path`, without loading.
    pub fn get(&self, path: &str) -> Option<Arc<DecodedBuffer>> {
        self.inner.state.lock().entries.get(cache_key(path)).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.inner.state.lock().entries.contains_key(cache_key(path))
    }

    /// Number of cached buffers.
    pub fn len(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of loads currently in flight.
    pub fn pending(&self) -> usize {
        self.inner.state.lock().in_flight.len()
    }

    /// Buffer for `path`, loading it if needed.
    ///
    /// Returns `None` when fetching or decoding fails; the failure is logged.
    pub async fn resolve(&self, path: &str) -> Option<Arc<DecodedBuffer>> {
        match self.lookup(path) {
            Lookup::Cached(buffer) => Some(buffer),
            Lookup::Joined(load) | Lookup::Started(load) => load.await,
        }
    }

    /// Load every path not yet cached, concurrently, and wait for all of them
    /// to settle. One failure never aborts the others.
    #[instrument(skip(self, paths))]
    pub async fn preload<I, S>(&self, paths: I) -> PreloadSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut summary = PreloadSummary::default();
        let mut started = Vec::new();
        let mut joined = Vec::new();

        for path in paths {
            let path = cache_key(path.as_ref());
            if path.is_empty() || !seen.insert(path.to_string()) {
                continue;
            }

            match self.lookup(path) {
                Lookup::Cached(_) => summary.skipped += 1,
                Lookup::Joined(load) => {
                    summary.skipped += 1;
                    joined.push(load);
                }
                Lookup::Started(load) => started.push(load),
            }
        }

        debug!(
            requested = seen.len(),
            starting = started.len(),
            joining = joined.len(),
            "Preloading sounds"
        );

        let (results, _) = futures::join!(join_all(started), join_all(joined));
        for result in results {
            match result {
                Some(_) => summary.loaded += 1,
                None => summary.failed += 1,
            }
        }

        info!(
            loaded = summary.loaded,
            failed = summary.failed,
            skipped = summary.skipped,
            "Preload completed"
        );
        self.inner.emit(SoundEvent::PreloadCompleted {
            loaded: summary.loaded,
            failed: summary.failed,
            skipped: summary.skipped,
        });

        summary
    }

    /// Cached entry, in-flight load, or a newly registered load.
    fn lookup(&self, path: &str) -> Lookup {
        let path = cache_key(path);
        let mut state = self.inner.state.lock();

        if let Some(buffer) = state.entries.get(path) {
            return Lookup::Cached(Arc::clone(buffer));
        }
        if let Some(load) = state.in_flight.get(path) {
            return Lookup::Joined(load.clone());
        }

        let load = CacheInner::load(Arc::clone(&self.inner), path.to_string())
            .boxed()
            .shared();
        state.in_flight.insert(path.to_string(), load.clone());
        Lookup::Started(load)
    }
}

impl CacheInner {
    async fn load(self: Arc<Self>, path: String) -> Option<Arc<DecodedBuffer>> {
        let result = self.fetch_and_decode(&path).await;

        let mut state = self.state.lock();
        state.in_flight.remove(&path);

        match result {
            Ok(buffer) => {
                let stored = state.entries.entry(path).or_insert(buffer);
                Some(Arc::clone(stored))
            }
            Err(e) => {
                drop(state);
                warn!(file = %strip_path(&path), error = %e, "Failed to load sound");
                self.emit(SoundEvent::LoadFailed {
                    path,
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    async fn fetch_and_decode(&self, path: &str) -> Result<Arc<DecodedBuffer>> {
        // The semaphore is never closed, so `acquire` only fails if it were.
        let _permit = self.load_permits.acquire().await.ok();

        let bytes = self
            .fetcher
            .fetch(path)
            .await
            .map_err(|e| PlaybackError::fetch(path, e))?;
        debug!(file = %strip_path(path), bytes = bytes.len(), "Fetched sound");

        let decoder = Arc::clone(&self.decoder);
        let owned_path = path.to_string();
        let buffer = tokio::task::spawn_blocking(move || decoder.decode(&owned_path, &bytes))
            .await
            .map_err(|e| PlaybackError::decode(path, format!("decode task failed: {}", e)))??;

        if buffer.is_empty() {
            return Err(PlaybackError::EmptyAudio(path.to_string()));
        }

        Ok(Arc::new(buffer))
    }

    fn emit(&self, event: SoundEvent) {
        if let Some(bus) = &self.events {
            let _ = bus.emit(event);
        }
    }
}

impl std::fmt::Debug for BufferCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("BufferCache")
            .field("entries", &state.entries.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}
