#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident data source trait and the data.gov.il fetcher.
//!
//! The police publish one CKAN datastore resource per year. The
//! [`IncidentSource`] trait is the seam between the fetch layer and
//! everything downstream; [`police::PoliceOpenDataSource`] is the real
//! implementation, and tests substitute in-memory sources.

pub mod ckan;
pub mod police;

use async_trait::async_trait;
use crime_trends_source_models::IncidentRecord;

/// Errors that can occur during data source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The remote dataset could not be fetched or was malformed.
    ///
    /// This is the failure the presentation layer surfaces to the
    /// user; it aborts the current render and is never retried.
    #[error("data unavailable for year {year}: {reason}")]
    DataUnavailable {
        /// The dataset year the fetch was for.
        year: i32,
        /// Description of what went wrong.
        reason: String,
    },

    /// The response envelope did not have the expected shape.
    #[error("malformed datastore response: {reason}")]
    Malformed {
        /// Description of what was missing or wrong.
        reason: String,
    },

    /// No resource id is configured for the requested year.
    #[error("no dataset resource configured for year {year}")]
    UnknownYear {
        /// The unconfigured year.
        year: i32,
    },
}

impl SourceError {
    /// Wraps any lower-level failure as [`SourceError::DataUnavailable`]
    /// for the given year.
    #[must_use]
    pub fn unavailable(year: i32, err: &dyn std::fmt::Display) -> Self {
        Self::DataUnavailable {
            year,
            reason: err.to_string(),
        }
    }
}

/// Trait that all incident data sources must implement.
///
/// A source knows how to produce the full set of normalized incident
/// records for one dataset year.
#[async_trait]
pub trait IncidentSource: Send + Sync {
    /// Returns a unique identifier for this source (e.g. `"il_police"`).
    fn id(&self) -> &str;

    /// Fetches and normalizes all incident records for the given year.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::DataUnavailable`] if the remote source is
    /// unreachable or returns a malformed payload, and
    /// [`SourceError::UnknownYear`] if the year is not configured.
    async fn fetch_year(&self, year: i32) -> Result<Vec<IncidentRecord>, SourceError>;
}
