//! Refresh-and-prune flow for the snapshot cache.
//!
//! A single worker task owns the [`Storage`] and runs refreshes one at a
//! time from a queue, so refreshes never overlap. Each refresh fetches
//! nearby businesses, stores them as a new snapshot, publishes that
//! snapshot to observers and prunes old snapshots.
//!
//! Failures never surface as errors to the caller: a refresh simply reports
//! `false`.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{Config, StorageConfig};
use crate::error::{Error, Result};
use crate::model::SearchResponse;
use crate::storage::Storage;
use crate::yelp::{LocationParam, SearchApi, SearchBusinessesResponse, SearchParams, SortBy};

/// Capacity of the refresh queue.
const QUEUE_CAPACITY: usize = 16;

/// The current snapshot as seen by observers.
pub type CurrentSnapshot = Option<Arc<SearchResponse>>;

/// When and how far to prune after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Pruning starts once more than this many snapshots exist.
    pub prune_threshold: usize,
    /// Number of most recent snapshots left after pruning.
    pub keep: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from(&StorageConfig::default())
    }
}

impl From<&StorageConfig> for RetentionPolicy {
    fn from(config: &StorageConfig) -> Self {
        Self {
            prune_threshold: config.prune_threshold,
            keep: config.keep_snapshots.max(1),
        }
    }
}

impl RetentionPolicy {
    /// Prune `storage` if it holds more snapshots than the threshold.
    ///
    /// Returns the number of snapshots deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn apply(&self, storage: &Storage) -> Result<usize> {
        let count = usize::try_from(storage.count()?).unwrap_or(usize::MAX);
        if count <= self.prune_threshold {
            return Ok(0);
        }
        storage.prune_keep_recent(self.keep)
    }
}

/// Settings for the refresh worker.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheOptions {
    /// Category aliases every refresh searches for.
    pub categories: Vec<String>,
    /// Retention applied after each stored snapshot.
    pub retention: RetentionPolicy,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for CacheOptions {
    fn from(config: &Config) -> Self {
        Self {
            categories: config.search.categories.clone(),
            retention: RetentionPolicy::from(&config.storage),
        }
    }
}

/// A request to refresh businesses around a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshRequest {
    /// Latitude to search around.
    pub latitude: f64,
    /// Longitude to search around.
    pub longitude: f64,
    /// Search radius in metres.
    pub radius_meters: u32,
}

impl RefreshRequest {
    /// Create a refresh request.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, radius_meters: u32) -> Self {
        Self {
            latitude,
            longitude,
            radius_meters,
        }
    }
}

#[derive(Debug)]
struct Job {
    request: RefreshRequest,
    done: oneshot::Sender<bool>,
}

/// Handle to the refresh worker.
///
/// Dropping the handle closes the queue; the worker finishes queued
/// refreshes and exits. Use [`CacheHandle::shutdown`] to wait for that and
/// get the storage back.
#[derive(Debug)]
pub struct CacheHandle {
    queue: mpsc::Sender<Job>,
    current: watch::Receiver<CurrentSnapshot>,
    worker: JoinHandle<Storage>,
}

impl CacheHandle {
    /// Start the refresh worker.
    ///
    /// The current snapshot is loaded from `storage` first, so subscribers
    /// see cached data before any refresh completes. Must be called from
    /// within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the current snapshot cannot be loaded.
    pub fn spawn(storage: Storage, api: Arc<dyn SearchApi>, options: CacheOptions) -> Result<Self> {
        let initial = storage.latest_snapshot()?.map(Arc::new);
        match &initial {
            Some(snapshot) => info!(
                "Loaded cached snapshot {:?} with {} businesses",
                snapshot.id,
                snapshot.len()
            ),
            None => info!("No cached snapshot, waiting for first refresh"),
        }

        let (publisher, current) = watch::channel(initial);
        let (queue, jobs) = mpsc::channel(QUEUE_CAPACITY);

        let worker = Worker {
            storage,
            api,
            options,
            publisher,
        };
        let worker = tokio::spawn(worker.run(jobs));

        Ok(Self {
            queue,
            current,
            worker,
        })
    }

    /// Queue a refresh without waiting for it.
    ///
    /// The returned receiver resolves to whether the refresh succeeded; it
    /// may be dropped if the caller does not care.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerStopped`] if the worker has exited.
    pub async fn submit(&self, request: RefreshRequest) -> Result<oneshot::Receiver<bool>> {
        let (done, result) = oneshot::channel();
        self.queue
            .send(Job { request, done })
            .await
            .map_err(|_| Error::WorkerStopped)?;
        Ok(result)
    }

    /// Refresh businesses around a point and wait for the outcome.
    ///
    /// Returns `true` if the search succeeded (and its results, if any, were
    /// stored), `false` on any network, decode or storage failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerStopped`] if the worker has exited.
    pub async fn refresh_businesses(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
    ) -> Result<bool> {
        let result = self
            .submit(RefreshRequest::new(latitude, longitude, radius_meters))
            .await?;
        result.await.map_err(|_| Error::WorkerStopped)
    }

    /// Subscribe to current-snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CurrentSnapshot> {
        self.current.clone()
    }

    /// The current snapshot.
    #[must_use]
    pub fn current(&self) -> CurrentSnapshot {
        self.current.borrow().clone()
    }

    /// Close the queue, let queued refreshes finish, and return the storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker task panicked.
    pub async fn shutdown(self) -> Result<Storage> {
        drop(self.queue);
        self.worker
            .await
            .map_err(|e| Error::internal(format!("cache worker failed: {e}")))
    }
}

struct Worker {
    storage: Storage,
    api: Arc<dyn SearchApi>,
    options: CacheOptions,
    publisher: watch::Sender<CurrentSnapshot>,
}

impl Worker {
    async fn run(mut self, mut jobs: mpsc::Receiver<Job>) -> Storage {
        while let Some(job) = jobs.recv().await {
            let refreshed = self.refresh(job.request).await;
            // The caller may have stopped listening.
            let _ = job.done.send(refreshed);
        }
        debug!("Refresh queue closed, worker exiting");
        self.storage
    }

    async fn refresh(&mut self, request: RefreshRequest) -> bool {
        let location = LocationParam::coordinates(request.latitude, request.longitude);
        let params = SearchParams::new()
            .radius_meters(request.radius_meters)
            .categories(self.options.categories.iter().cloned())
            .sort_by(SortBy::Distance);

        debug!(
            "Refreshing businesses around ({}, {}) within {}m",
            request.latitude, request.longitude, request.radius_meters
        );

        let api = Arc::clone(&self.api);
        let response = match api.search_businesses(&location, &params).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Refresh failed: {}", e);
                return false;
            }
        };

        match self.store(response) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to store refreshed businesses: {}", e);
                false
            }
        }
    }

    /// Persist a response as the new current snapshot, publish it, then prune.
    fn store(&mut self, response: SearchBusinessesResponse) -> Result<()> {
        let (Some(region_center), Some(businesses)) =
            (response.region_center, response.businesses)
        else {
            debug!("Search returned no region or no businesses, nothing stored");
            return Ok(());
        };

        let mut snapshot = SearchResponse::new(region_center, businesses);
        let id = self.storage.insert_snapshot(&snapshot)?;
        snapshot.id = Some(id);
        info!(
            "Stored snapshot {} with {} businesses",
            id,
            snapshot.len()
        );

        self.publisher.send_replace(Some(Arc::new(snapshot)));

        match self.options.retention.apply(&self.storage) {
            Ok(0) => {}
            Ok(_) => self.republish_if_pruned(id),
            Err(e) => warn!("Failed to prune old snapshots: {}", e),
        }
        Ok(())
    }

    /// Pruning goes by request date, so a snapshot stamped by a clock that
    /// went backwards can be pruned right after it was published.
    fn republish_if_pruned(&self, published_id: i64) {
        match self.storage.latest_snapshot() {
            Ok(latest) if latest.as_ref().and_then(|s| s.id) != Some(published_id) => {
                debug!("Snapshot {} was pruned, publishing the latest instead", published_id);
                self.publisher.send_replace(latest.map(Arc::new));
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to reload current snapshot after pruning: {}", e),
        }
    }
}
