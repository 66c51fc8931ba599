#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Auxiliary demographic tables keyed by `(year, district)`.
//!
//! Two local CSV inputs ride alongside the remote crime data: an
//! employment-rate table and a population table. A missing
//! `(year, district)` pair is not an error; callers treat the metric
//! as absent (employment) or fall back to a divisor of 1 (population).
//!
//! The population column is labeled `Population(k)` but its value is
//! used as-is in rate computations, matching the source dashboard's
//! arithmetic.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crime_trends_crime_models::is_real_district;
use serde::Deserialize;

/// Errors that can occur loading auxiliary tables.
#[derive(Debug, thiserror::Error)]
pub enum AuxiliaryError {
    /// CSV parsing failed.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A `(year, district)` keyed metric table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricTable {
    values: BTreeMap<(i32, String), f64>,
}

impl MetricTable {
    /// Returns the metric for a `(year, district)` pair, if present.
    #[must_use]
    pub fn get(&self, year: i32, district: &str) -> Option<f64> {
        self.values.get(&(year, district.to_string())).copied()
    }

    /// Returns the distinct districts present in the table.
    #[must_use]
    pub fn districts(&self) -> Vec<String> {
        let mut districts: Vec<String> = self
            .values
            .keys()
            .map(|(_, district)| district.clone())
            .collect();
        districts.sort();
        districts.dedup();
        districts
    }

    /// Returns the distinct `(year, district)` keys in the table.
    pub fn keys(&self) -> impl Iterator<Item = (i32, &str)> {
        self.values
            .keys()
            .map(|(year, district)| (*year, district.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn insert(&mut self, year: i32, district: String, value: f64) {
        self.values.insert((year, district), value);
    }
}

/// Employment rate per `(year, district)`, in percent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmploymentTable(pub MetricTable);

/// Row shape of `employmentRate.csv`.
#[derive(Debug, Deserialize)]
struct EmploymentRow {
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "PoliceDistrict")]
    district: String,
    #[serde(rename = "EmploymentRate")]
    rate: f64,
}

impl EmploymentTable {
    /// Loads the table from CSV text.
    ///
    /// Nationwide pseudo-district rows are dropped, as the dashboard
    /// never charts them.
    ///
    /// # Errors
    ///
    /// Returns [`AuxiliaryError`] if the CSV is malformed.
    pub fn from_reader(reader: impl Read) -> Result<Self, AuxiliaryError> {
        let mut table = MetricTable::default();
        let mut skipped: u64 = 0;

        for row in csv::Reader::from_reader(reader).deserialize() {
            let row: EmploymentRow = row?;
            if is_real_district(&row.district) {
                table.insert(row.year, row.district.trim().to_string(), row.rate);
            } else {
                skipped += 1;
            }
        }

        log::debug!(
            "Loaded {} employment-rate entries ({skipped} non-district rows dropped)",
            table.len()
        );
        Ok(Self(table))
    }

    /// Loads the table from a CSV file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`AuxiliaryError`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AuxiliaryError> {
        Self::from_reader(std::fs::File::open(path)?)
    }

    /// Employment rate for a `(year, district)` pair, if known.
    #[must_use]
    pub fn get(&self, year: i32, district: &str) -> Option<f64> {
        self.0.get(year, district)
    }
}

/// Population per `(year, district)`, as parsed from the
/// `Population(k)` column (no unit scaling applied).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationTable(pub MetricTable);

/// Row shape of `Population.csv`.
#[derive(Debug, Deserialize)]
struct PopulationRow {
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "PoliceDistrict")]
    district: String,
    #[serde(rename = "Population(k)")]
    population: f64,
}

impl PopulationTable {
    /// Loads the table from CSV text.
    ///
    /// # Errors
    ///
    /// Returns [`AuxiliaryError`] if the CSV is malformed.
    pub fn from_reader(reader: impl Read) -> Result<Self, AuxiliaryError> {
        let mut table = MetricTable::default();
        let mut skipped: u64 = 0;

        for row in csv::Reader::from_reader(reader).deserialize() {
            let row: PopulationRow = row?;
            if is_real_district(&row.district) {
                table.insert(row.year, row.district.trim().to_string(), row.population);
            } else {
                skipped += 1;
            }
        }

        log::debug!(
            "Loaded {} population entries ({skipped} non-district rows dropped)",
            table.len()
        );
        Ok(Self(table))
    }

    /// Loads the table from a CSV file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`AuxiliaryError`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AuxiliaryError> {
        Self::from_reader(std::fs::File::open(path)?)
    }

    /// Population for a `(year, district)` pair, if known.
    #[must_use]
    pub fn get(&self, year: i32, district: &str) -> Option<f64> {
        self.0.get(year, district)
    }
}
