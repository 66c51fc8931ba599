#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-process facade over the whole pipeline.
//!
//! A [`Dashboard`] owns one incident source, the year-keyed dataset
//! cache, and the auxiliary employment and population tables. Each
//! view method loads the years it needs through the cache and hands
//! the records to the analytics builders, so a presentation layer
//! only ever deals in [`FilterParams`] in and typed tables out.

use std::sync::Arc;

use crime_trends_analytics::{
    category_overview, district_rates, period_comparison, quarterly_trend,
};
use crime_trends_analytics_models::{
    CategoryOverview, DistrictRateRow, FilterParams, PeriodComparison, TrendTable,
};
use crime_trends_auxiliary::{AuxiliaryError, EmploymentTable, PopulationTable};
use crime_trends_cache::{CacheError, DatasetCache};
use crime_trends_crime_models::EventBoundary;
use crime_trends_source::IncidentSource;
use crime_trends_source_models::IncidentRecord;

/// Errors that can occur serving a dashboard view.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Fetching a required dataset year failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Loading an auxiliary table failed.
    #[error(transparent)]
    Auxiliary(#[from] AuxiliaryError),
}

/// The dashboard backend: one source, one cache, the auxiliary tables,
/// and the event boundary the comparison view splits on.
pub struct Dashboard<S: IncidentSource> {
    source: S,
    cache: DatasetCache,
    years: Vec<i32>,
    employment: EmploymentTable,
    population: PopulationTable,
    boundary: EventBoundary,
}

impl<S: IncidentSource> Dashboard<S> {
    /// Creates a dashboard over `source`, serving the given dataset
    /// years with the default event boundary.
    #[must_use]
    pub fn new(
        source: S,
        years: Vec<i32>,
        employment: EmploymentTable,
        population: PopulationTable,
    ) -> Self {
        Self {
            source,
            cache: DatasetCache::new(),
            years,
            employment,
            population,
            boundary: EventBoundary::default(),
        }
    }

    /// Like [`Dashboard::new`], loading the auxiliary tables from CSV
    /// files.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Auxiliary`] if either file cannot be
    /// read or parsed.
    pub fn from_csv_paths(
        source: S,
        years: Vec<i32>,
        employment_path: impl AsRef<std::path::Path>,
        population_path: impl AsRef<std::path::Path>,
    ) -> Result<Self, DashboardError> {
        let employment = EmploymentTable::from_path(employment_path)?;
        let population = PopulationTable::from_path(population_path)?;
        Ok(Self::new(source, years, employment, population))
    }

    #[must_use]
    pub const fn with_boundary(mut self, boundary: EventBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// The dataset years this dashboard serves.
    #[must_use]
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Loads the records backing the given filter state: one year when
    /// the filter names one, every configured year otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Cache`] if any required year cannot
    /// be fetched. Years already cached stay cached.
    pub async fn load(&self, year: Option<i32>) -> Result<Vec<IncidentRecord>, DashboardError> {
        let years: Vec<i32> = match year {
            Some(year) => vec![year],
            None => self.years.clone(),
        };

        let mut records = Vec::new();
        for year in years {
            let data: Arc<Vec<IncidentRecord>> =
                self.cache.get_or_fetch(year, &self.source).await?;
            records.extend(data.iter().cloned());
        }

        log::debug!("Loaded {} records across the requested years", records.len());
        Ok(records)
    }

    /// Per-category counts for the overview chart.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Cache`] if a required year cannot be
    /// fetched.
    pub async fn category_overview(
        &self,
        filters: &FilterParams,
    ) -> Result<CategoryOverview, DashboardError> {
        let records = self.load(filters.year).await?;
        Ok(category_overview(&records, filters))
    }

    /// Quarterly trend lines for the selected categories.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Cache`] if a required year cannot be
    /// fetched.
    pub async fn quarterly_trend(
        &self,
        filters: &FilterParams,
    ) -> Result<TrendTable, DashboardError> {
        let records = self.load(filters.year).await?;
        Ok(quarterly_trend(&records, filters))
    }

    /// Normalized before/after comparison for one district, or for the
    /// all-districts roll-up when `district` is `None`. Always spans
    /// every configured year.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Cache`] if a required year cannot be
    /// fetched.
    pub async fn period_comparison(
        &self,
        district: Option<&str>,
    ) -> Result<PeriodComparison, DashboardError> {
        let records = self.load(None).await?;
        Ok(period_comparison(&records, self.boundary, district))
    }

    /// Per-district crime rates joined against the employment and
    /// population tables. Always spans every configured year.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Cache`] if a required year cannot be
    /// fetched.
    pub async fn district_rates(&self) -> Result<Vec<DistrictRateRow>, DashboardError> {
        let records = self.load(None).await?;
        Ok(district_rates(&records, &self.employment, &self.population))
    }

    /// Drops the cached dataset for `year` so the next view call
    /// refetches it.
    pub async fn invalidate(&self, year: i32) {
        self.cache.invalidate(year).await;
    }
}
