#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Year-keyed incident dataset cache.
//!
//! The yearly datasets are immutable once published, so each year is
//! fetched at most once per process and shared as a read-only `Arc`.
//! Population is single-flight: overlapping interactions asking for
//! the same year await one in-flight fetch instead of issuing
//! duplicates. A failed fetch leaves the slot empty, so the next
//! interaction retries.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use crime_trends_source::{IncidentSource, SourceError};
use crime_trends_source_models::IncidentRecord;
use tokio::sync::Mutex;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The underlying source failed to produce the year's dataset.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// A populated cache slot.
#[derive(Debug, Clone)]
struct Entry {
    data: Arc<Vec<IncidentRecord>>,
    fetched_at: DateTime<Utc>,
}

type Slot = Arc<Mutex<Option<Entry>>>;

/// Map-backed cache of yearly incident datasets.
#[derive(Debug, Default)]
pub struct DatasetCache {
    slots: Mutex<BTreeMap<i32, Slot>>,
    ttl: Option<TimeDelta>,
}

impl DatasetCache {
    /// Creates a cache whose entries never expire (manual
    /// [`invalidate`](Self::invalidate) only).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache whose entries expire after `ttl` and are
    /// refetched on the next request.
    #[must_use]
    pub fn with_ttl(ttl: TimeDelta) -> Self {
        Self {
            slots: Mutex::new(BTreeMap::new()),
            ttl: Some(ttl),
        }
    }

    /// Returns the cached dataset for `year`, fetching it through
    /// `source` if absent or expired.
    ///
    /// Holding the per-year slot lock across the fetch is what
    /// guarantees at most one population per key: concurrent callers
    /// for the same year queue on the slot and find it filled.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Source`] if the fetch fails. The failure
    /// is not cached.
    pub async fn get_or_fetch(
        &self,
        year: i32,
        source: &dyn IncidentSource,
    ) -> Result<Arc<Vec<IncidentRecord>>, CacheError> {
        let slot = {
            let mut slots = self.slots.lock().await;
            Arc::clone(slots.entry(year).or_default())
        };

        let mut guard = slot.lock().await;

        if let Some(entry) = guard.as_ref() {
            if self.is_fresh(entry) {
                log::debug!("Cache hit for year {year} ({} records)", entry.data.len());
                return Ok(Arc::clone(&entry.data));
            }
            log::debug!("Cache entry for year {year} expired");
            *guard = None;
        }

        log::info!("Cache miss for year {year}; fetching from {}", source.id());
        let data = Arc::new(source.fetch_year(year).await?);

        *guard = Some(Entry {
            data: Arc::clone(&data),
            fetched_at: Utc::now(),
        });

        Ok(data)
    }

    /// Drops the cached dataset for `year`, if any.
    pub async fn invalidate(&self, year: i32) {
        let slot = {
            let slots = self.slots.lock().await;
            slots.get(&year).map(Arc::clone)
        };

        if let Some(slot) = slot {
            *slot.lock().await = None;
            log::debug!("Invalidated cache entry for year {year}");
        }
    }

    /// Drops every cached dataset.
    pub async fn clear(&self) {
        let mut slots = self.slots.lock().await;
        slots.clear();
        log::debug!("Cleared dataset cache");
    }

    /// Returns the years currently cached (populated slots only).
    pub async fn cached_years(&self) -> Vec<i32> {
        let slots = {
            let slots = self.slots.lock().await;
            slots
                .iter()
                .map(|(year, slot)| (*year, Arc::clone(slot)))
                .collect::<Vec<_>>()
        };

        let mut years = Vec::new();
        for (year, slot) in slots {
            if slot.lock().await.is_some() {
                years.push(year);
            }
        }
        years
    }

    fn is_fresh(&self, entry: &Entry) -> bool {
        self.ttl
            .is_none_or(|ttl| Utc::now() - entry.fetched_at < ttl)
    }
}
