//! Israel Police yearly crime dataset source.
//!
//! Fetches one CKAN datastore resource per year from data.gov.il and
//! normalizes the raw rows into [`IncidentRecord`]s. Rows with no
//! statistic group are dropped; rows whose label is outside the fixed
//! taxonomy are kept with no category and excluded from category-keyed
//! views downstream.

use async_trait::async_trait;
use crime_trends_crime_models::{Quarter, categorize};
use crime_trends_source_models::{DatasetCatalog, IncidentRecord};
use serde::Deserialize;

use crate::ckan::CkanClient;
use crate::{IncidentSource, SourceError};

/// Incident source backed by the data.gov.il datastore.
#[derive(Debug, Clone)]
pub struct PoliceOpenDataSource {
    catalog: DatasetCatalog,
    client: CkanClient,
}

impl PoliceOpenDataSource {
    /// Creates a source from a dataset catalog, using the default
    /// data.gov.il endpoint.
    #[must_use]
    pub fn new(catalog: DatasetCatalog) -> Self {
        Self {
            catalog,
            client: CkanClient::new(),
        }
    }

    /// Creates a source with an explicit CKAN client (custom endpoint).
    #[must_use]
    pub const fn with_client(catalog: DatasetCatalog, client: CkanClient) -> Self {
        Self { catalog, client }
    }

    /// Returns the configured dataset catalog.
    #[must_use]
    pub const fn catalog(&self) -> &DatasetCatalog {
        &self.catalog
    }
}

impl Default for PoliceOpenDataSource {
    fn default() -> Self {
        Self::new(DatasetCatalog::default())
    }
}

/// Raw record shape from the datastore resource.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default, rename = "StatisticGroup")]
    statistic_group: Option<String>,
    #[serde(default, rename = "PoliceDistrict")]
    police_district: Option<String>,
    #[serde(default, rename = "PoliceMerhav")]
    police_merhav: Option<String>,
    #[serde(default, rename = "PoliceStation")]
    police_station: Option<String>,
    #[serde(default, rename = "Yeshuv")]
    yeshuv: Option<String>,
    #[serde(default, rename = "Quarter")]
    quarter: Option<String>,
}

#[async_trait]
impl IncidentSource for PoliceOpenDataSource {
    fn id(&self) -> &str {
        "il_police"
    }

    async fn fetch_year(&self, year: i32) -> Result<Vec<IncidentRecord>, SourceError> {
        let Some(resource_id) = self.catalog.resource_id(year) else {
            return Err(SourceError::UnknownYear { year });
        };

        let raw = self
            .client
            .fetch_all(resource_id)
            .await
            .map_err(|err| SourceError::unavailable(year, &err))?;

        Ok(normalize_records(year, &raw))
    }
}

/// Normalizes raw datastore rows into incident records, stamping the
/// dataset year on each.
///
/// Rows that don't deserialize or carry no statistic group are
/// skipped. Unparseable quarter labels leave `quarter` empty rather
/// than dropping the record, since year-keyed views still want it.
#[must_use]
pub fn normalize_records(year: i32, raw: &[serde_json::Value]) -> Vec<IncidentRecord> {
    let mut records = Vec::with_capacity(raw.len());
    let mut skipped: u64 = 0;
    let mut quarter_misses: u64 = 0;
    let mut category_misses: u64 = 0;

    for value in raw {
        let Ok(row) = serde_json::from_value::<RawRecord>(value.clone()) else {
            skipped += 1;
            continue;
        };

        let Some(statistic_group) = row.statistic_group.filter(|s| !s.trim().is_empty()) else {
            skipped += 1;
            continue;
        };

        let quarter = row
            .quarter
            .as_deref()
            .and_then(|label| Quarter::parse_label(label).ok());
        if quarter.is_none() {
            quarter_misses += 1;
        }

        let category = categorize(&statistic_group);
        if category.is_none() {
            category_misses += 1;
        }

        records.push(IncidentRecord {
            statistic_group,
            category,
            year,
            quarter,
            district: row.police_district.unwrap_or_default(),
            merhav: row.police_merhav,
            station: row.police_station,
            yeshuv: row.yeshuv,
        });
    }

    log::info!(
        "Normalized {} incidents for {year} ({skipped} skipped, \
         {quarter_misses} without a quarter, {category_misses} uncategorized)",
        records.len()
    );

    records
}
