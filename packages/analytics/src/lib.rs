#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation, roll-up, normalization, and chart view builders.
//!
//! Everything here is a pure function over in-memory incident records:
//! the same records and filters always produce the same table, so the
//! presentation layer can recompute freely on every widget change.

pub mod aggregate;
pub mod periods;
pub mod rates;
pub mod views;

pub use aggregate::{aggregate, real_district_records, rollup_districts};
pub use periods::{RegimeDivisors, aggregate_by_period, normalize_by_period};
pub use rates::{crime_rate, district_rates};
pub use views::{category_overview, period_comparison, quarterly_trend};
