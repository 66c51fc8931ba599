#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident record types and the dataset catalog.
//!
//! The fetcher produces [`IncidentRecord`] values normalized from the
//! data.gov.il datastore payloads. [`DatasetCatalog`] maps each year to
//! its CKAN resource id, since the police dataset is published as one
//! resource per year.

use std::collections::BTreeMap;

use crime_trends_crime_models::{Category, Quarter, YearQuarter};
use serde::{Deserialize, Serialize};

/// A single crime incident row, normalized from the source payload.
///
/// Immutable once fetched. The category is stamped at normalization
/// time from the statistic-group label; `None` means the label is not
/// in the fixed taxonomy and the record is excluded from
/// category-keyed views (but still counted in totals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Fine-grained offense label from the source (`StatisticGroup`).
    pub statistic_group: String,
    /// Coarse category derived from the statistic group.
    pub category: Option<Category>,
    /// Year of the dataset resource this record came from.
    pub year: i32,
    /// Calendar quarter, when the source label was parseable.
    pub quarter: Option<Quarter>,
    /// Policing district (`PoliceDistrict`).
    pub district: String,
    /// Policing sub-region (`PoliceMerhav`), passthrough.
    pub merhav: Option<String>,
    /// Police station (`PoliceStation`), passthrough.
    pub station: Option<String>,
    /// Settlement name (`Yeshuv`), passthrough.
    pub yeshuv: Option<String>,
}

impl IncidentRecord {
    /// Returns the year-quarter bucket for this record, when the
    /// quarter is known.
    #[must_use]
    pub fn year_quarter(&self) -> Option<YearQuarter> {
        self.quarter.map(|q| YearQuarter::new(self.year, q))
    }
}

/// Maps each dataset year to its CKAN resource id.
///
/// Iteration is always in ascending year order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetCatalog {
    years: BTreeMap<i32, String>,
}

/// The data.gov.il resource ids for the 2020-2024 yearly datasets.
const DEFAULT_RESOURCES: &[(i32, &str)] = &[
    (2020, "520597e3-6003-4247-9634-0ae85434b971"),
    (2021, "3f71fd16-25b8-4cfe-8661-e6199db3eb12"),
    (2022, "a59f3e9e-a7fe-4375-97d0-76cea68382c1"),
    (2023, "32aacfc9-3524-4fba-a282-3af052380244"),
    (2024, "5fc13c50-b6f3-4712-b831-a75e0f91a17e"),
];

impl Default for DatasetCatalog {
    fn default() -> Self {
        Self {
            years: DEFAULT_RESOURCES
                .iter()
                .map(|(year, id)| (*year, (*id).to_string()))
                .collect(),
        }
    }
}

/// Errors that can occur loading a dataset catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// TOML parsing failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A `[years]` key was not a valid year.
    #[error("invalid year key: {key}")]
    InvalidYear {
        /// The offending key.
        key: String,
    },
}

/// On-disk shape of a catalog override file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    /// Year (as a string key) to resource id.
    years: BTreeMap<String, String>,
}

impl DatasetCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            years: BTreeMap::new(),
        }
    }

    /// Loads a catalog from a TOML document of the form:
    ///
    /// ```toml
    /// [years]
    /// 2020 = "520597e3-6003-4247-9634-0ae85434b971"
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the document is malformed or a year
    /// key is not an integer.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(contents)?;
        let mut years = BTreeMap::new();

        for (key, resource_id) in file.years {
            let year: i32 = key
                .parse()
                .map_err(|_| CatalogError::InvalidYear { key: key.clone() })?;
            years.insert(year, resource_id);
        }

        Ok(Self { years })
    }

    /// Adds or replaces a year's resource id.
    pub fn insert(&mut self, year: i32, resource_id: impl Into<String>) {
        self.years.insert(year, resource_id.into());
    }

    /// Returns the resource id for a year, if configured.
    #[must_use]
    pub fn resource_id(&self, year: i32) -> Option<&str> {
        self.years.get(&year).map(String::as_str)
    }

    /// Iterates `(year, resource_id)` pairs in ascending year order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &str)> {
        self.years.iter().map(|(year, id)| (*year, id.as_str()))
    }

    /// Returns the configured years in ascending order.
    #[must_use]
    pub fn years(&self) -> Vec<i32> {
        self.years.keys().copied().collect()
    }

    /// Number of configured years.
    #[must_use]
    pub fn len(&self) -> usize {
        self.years.len()
    }

    /// Whether the catalog has no configured years.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_covers_2020_through_2024() {
        let catalog = DatasetCatalog::default();
        assert_eq!(catalog.years(), vec![2020, 2021, 2022, 2023, 2024]);
        assert_eq!(
            catalog.resource_id(2022),
            Some("a59f3e9e-a7fe-4375-97d0-76cea68382c1")
        );
        assert_eq!(catalog.resource_id(2019), None);
    }

    #[test]
    fn catalog_from_toml() {
        let catalog = DatasetCatalog::from_toml_str(
            "[years]\n2021 = \"abc\"\n2020 = \"def\"\n",
        )
        .unwrap();
        assert_eq!(catalog.years(), vec![2020, 2021]);
        assert_eq!(catalog.resource_id(2021), Some("abc"));
    }

    #[test]
    fn catalog_rejects_non_year_keys() {
        let err = DatasetCatalog::from_toml_str("[years]\nnope = \"abc\"\n").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidYear { .. }));
    }

    #[test]
    fn record_year_quarter() {
        use crime_trends_crime_models::Quarter;

        let record = IncidentRecord {
            statistic_group: "עבירות תנועה".to_string(),
            category: crime_trends_crime_models::categorize("עבירות תנועה"),
            year: 2022,
            quarter: Some(Quarter::Q1),
            district: "מחוז דרומי".to_string(),
            merhav: None,
            station: None,
            yeshuv: None,
        };
        assert_eq!(record.year_quarter().unwrap().to_string(), "2022-Q1");

        let no_quarter = IncidentRecord {
            quarter: None,
            ..record
        };
        assert_eq!(no_quarter.year_quarter(), None);
    }
}
