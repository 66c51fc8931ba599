#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation keys, filter parameters, and chart-ready result types.
//!
//! The view builders in `crime_trends_analytics` accept a
//! [`FilterParams`] (the dashboard's widget state) and return the
//! typed tables defined here; the presentation layer renders them
//! without further reshaping.

use std::collections::BTreeSet;

use crime_trends_crime_models::{Category, Period, Quarter, YearQuarter};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A grouping dimension for aggregation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dimension {
    /// Group by coarse offense category.
    Category,
    /// Group by dataset year.
    Year,
    /// Group by calendar quarter.
    Quarter,
    /// Group by policing district.
    District,
}

/// Key of one aggregate bucket. Only the fields for the requested
/// dimensions are populated.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct GroupKey {
    /// Offense category, when grouped by [`Dimension::Category`].
    pub category: Option<Category>,
    /// Dataset year, when grouped by [`Dimension::Year`].
    pub year: Option<i32>,
    /// Calendar quarter, when grouped by [`Dimension::Quarter`].
    pub quarter: Option<Quarter>,
    /// Before/after regime, when grouped against an event boundary.
    pub period: Option<Period>,
    /// District name, when grouped by [`Dimension::District`].
    pub district: Option<String>,
}

/// One aggregate bucket: a group key and its record count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountRow {
    /// Values of the grouping dimensions.
    pub key: GroupKey,
    /// Number of matching incident records.
    pub count: u64,
}

/// Dashboard widget state: which slice of the data to chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    /// Restrict to one dataset year (`None` = all years).
    pub year: Option<i32>,
    /// Restrict to one district (`None` = all districts).
    pub district: Option<String>,
    /// Restrict to a set of categories (`None` = all six).
    pub categories: Option<BTreeSet<Category>>,
    /// Split the overview by quarter.
    pub split_by_quarter: bool,
}

/// Count of incidents in a single category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// Offense category.
    pub category: Category,
    /// Number of incidents.
    pub count: u64,
}

/// Count of incidents in a single category and quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuarterCount {
    /// Offense category.
    pub category: Category,
    /// Calendar quarter.
    pub quarter: Quarter,
    /// Number of incidents.
    pub count: u64,
}

/// The category-overview chart table.
///
/// Both shapes are zero-filled over the full category (and quarter)
/// axes so chart axes stay stable across filter changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CategoryOverview {
    /// One bar per category, ordered by descending count.
    Totals {
        /// Per-category totals.
        rows: Vec<CategoryCount>,
    },
    /// Grouped bars: one per category and quarter.
    ByQuarter {
        /// Per-category, per-quarter counts.
        rows: Vec<CategoryQuarterCount>,
        /// Category display order (by descending total).
        category_order: Vec<Category>,
    },
}

/// One point of the quarterly trend chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// Year-quarter time bucket.
    pub bucket: YearQuarter,
    /// Offense category.
    pub category: Category,
    /// Number of incidents.
    pub count: u64,
}

/// The quarterly trend chart table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendTable {
    /// Every year-quarter bucket present in the dataset, in order.
    /// Kept even when a selected category has no points in it so the
    /// x-axis does not shift as categories are toggled.
    pub buckets: Vec<YearQuarter>,
    /// Chart points, ordered by bucket then category.
    pub points: Vec<TrendPoint>,
}

/// One row of the before/after comparison chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodComparisonRow {
    /// Offense category.
    pub category: Category,
    /// Counts normalized per quarter, for each regime.
    pub before: u64,
    /// See `before`.
    pub after: u64,
}

/// The before/after comparison table for one district (or the
/// all-districts roll-up).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodComparison {
    /// District the comparison is for (the roll-up label for all).
    pub district: String,
    /// Regime tag → per-quarter normalized counts, one row per
    /// category, ordered by descending before-count then after-count.
    pub rows: Vec<PeriodComparisonRow>,
    /// Districts available for the selector, roll-up first.
    pub districts: Vec<String>,
}

/// One row of the employment/crime-rate view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictRateRow {
    /// Dataset year.
    pub year: i32,
    /// District name.
    pub district: String,
    /// Total incident count for the pair (0 when only auxiliary data
    /// exists for it).
    pub crime_count: u64,
    /// Employment rate in percent, when the auxiliary table has the
    /// pair.
    pub employment_rate: Option<f64>,
    /// Population figure used as the rate divisor (1 when missing).
    pub population: f64,
    /// `crime_count / population`.
    pub crime_rate: f64,
}

/// Tags a [`CountRow`]'s regime alongside its normalized value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRow {
    /// Values of the grouping dimensions.
    pub key: GroupKey,
    /// Regime this row falls in.
    pub period: Period,
    /// Raw count.
    pub count: u64,
    /// Count divided by the regime's quarter count, rounded.
    pub normalized_count: u64,
}
