//! Time-boxed refresh policy over the snapshot store.
//!
//! [`TtlCache`] is the single authoritative caching policy: callers never
//! read snapshots or hit the pricing API directly. Per dataset, the rules
//! are:
//!
//! - no snapshot yet: fetch, persist, return (fetch failure propagates —
//!   there is nothing to fall back to);
//! - snapshot older than the TTL: try to fetch; on failure serve the stale
//!   snapshot instead — staleness is preferred over unavailability;
//! - fresh snapshot: serve it without any remote call.

use crate::pricing::{Catalog, FetchError, PriceFeed, Rates};
use crate::snapshot::{Snapshot, SnapshotError, SnapshotStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Dataset key for the currency catalog.
pub const DATASET_CATALOG: &str = "currencies";
/// Dataset key for the exchange rates.
pub const DATASET_RATES: &str = "conversions";

/// Errors surfaced by cache reads.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the on-disk snapshot failed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// The remote fetch failed and no prior snapshot exists to fall back to.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Snapshot cache with a time-to-live refresh policy.
///
/// Owns the in-memory copy of both datasets and is the only writer of the
/// underlying [`SnapshotStore`]. The load-then-maybe-fetch-then-save sequence
/// for each dataset runs under a mutex so a multi-worker host cannot trigger
/// duplicate concurrent fetches.
pub struct TtlCache {
    store: SnapshotStore,
    ttl: Duration,
    catalog: Mutex<Option<Snapshot<Catalog>>>,
    rates: Mutex<Option<Snapshot<Rates>>>,
}

impl TtlCache {
    /// Create a cache over `store`, refreshing snapshots older than `ttl`.
    pub fn new(store: SnapshotStore, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            catalog: Mutex::new(None),
            rates: Mutex::new(None),
        }
    }

    /// Current currency catalog, refreshing per the TTL policy.
    ///
    /// Returns the catalog and whether a network refresh actually occurred.
    ///
    /// # Errors
    ///
    /// See [`CacheError`]; a failed refresh over an existing snapshot is not
    /// an error.
    pub async fn catalog(&self, feed: &dyn PriceFeed) -> Result<(Catalog, bool), CacheError> {
        self.dataset(&self.catalog, DATASET_CATALOG, || async {
            Ok(feed.fetch_catalog().await?)
        })
        .await
    }

    /// Current exchange rates, refreshing per the TTL policy.
    ///
    /// A rates fetch quotes every code in the catalog, so refreshing rates
    /// may first refresh the catalog.
    ///
    /// # Errors
    ///
    /// See [`CacheError`].
    pub async fn rates(&self, feed: &dyn PriceFeed) -> Result<(Rates, bool), CacheError> {
        self.dataset(&self.rates, DATASET_RATES, || async {
            let (catalog, _) = self.catalog(feed).await?;
            let codes: Vec<String> = catalog.into_keys().collect();
            Ok(feed.fetch_rates(&codes).await?)
        })
        .await
    }

    /// The single get-or-refresh policy, shared by both datasets.
    async fn dataset<T, F, Fut>(
        &self,
        slot: &Mutex<Option<Snapshot<T>>>,
        dataset: &str,
        fetch: F,
    ) -> Result<(T, bool), CacheError>
    where
        T: Clone + Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CacheError>>,
    {
        let mut slot = slot.lock().await;

        // First access: pull the on-disk snapshot into memory. A missing
        // file means no snapshot yet; anything else is surfaced.
        if slot.is_none() {
            match self.store.load::<T>(dataset) {
                Ok(snapshot) => *slot = Some(snapshot),
                Err(SnapshotError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        match slot.take() {
            None => {
                let snapshot = Snapshot::now(fetch().await?);
                self.store.save(dataset, &snapshot)?;
                debug!("fetched initial '{}' snapshot", dataset);
                let payload = snapshot.payload.clone();
                *slot = Some(snapshot);
                Ok((payload, true))
            }
            Some(current) if self.is_stale(&current) => match fetch().await {
                Ok(payload) => {
                    let snapshot = Snapshot::now(payload);
                    self.store.save(dataset, &snapshot)?;
                    debug!("refreshed stale '{}' snapshot", dataset);
                    let payload = snapshot.payload.clone();
                    *slot = Some(snapshot);
                    Ok((payload, true))
                }
                Err(e) => {
                    warn!("refresh of '{}' failed, serving stale snapshot: {}", dataset, e);
                    let payload = current.payload.clone();
                    *slot = Some(current);
                    Ok((payload, false))
                }
            },
            Some(current) => {
                let payload = current.payload.clone();
                *slot = Some(current);
                Ok((payload, false))
            }
        }
    }

    fn is_stale<T>(&self, snapshot: &Snapshot<T>) -> bool {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        snapshot.age() > ttl
    }
}
