#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Offense category taxonomy and time-bucket types.
//!
//! This crate defines the canonical six-category offense taxonomy used
//! across the crime-trends system, along with the quarter/period time
//! buckets that aggregates are keyed on. The category membership lists
//! mirror the Israel Police statistic-group labels exactly.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The six coarse offense categories.
///
/// Every fine-grained statistic-group label maps into exactly one of
/// these (or none, in which case the record is excluded from
/// category-keyed views).
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Offenses against property, person, and sexual offenses
    GeneralCriminal,
    /// Morality and public-order offenses
    MoralPublicOrder,
    /// Security offenses
    Security,
    /// Economic, administrative, and licensing offenses
    EconomicAdministrative,
    /// Traffic offenses
    Traffic,
    /// Fraud offenses
    Fraud,
}

impl Category {
    /// Returns the Hebrew display label for this category, as shown in
    /// the source dashboard.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GeneralCriminal => "עבירות פליליות כלליות",
            Self::MoralPublicOrder => "עבירות מוסר וסדר ציבורי",
            Self::Security => "עבירות ביטחון",
            Self::EconomicAdministrative => "עבירות כלכליות ומנהליות",
            Self::Traffic => "עבירות תנועה",
            Self::Fraud => "עבירות מרמה",
        }
    }

    /// Returns the fine-grained statistic-group labels that belong to
    /// this category.
    #[must_use]
    pub const fn members(self) -> &'static [&'static str] {
        match self {
            Self::GeneralCriminal => &[
                "עבירות כלפי הרכוש",
                "עבירות נגד גוף",
                "עבירות נגד אדם",
                "עבירות מין",
            ],
            Self::MoralPublicOrder => &["עבירות כלפי המוסר", "עבירות סדר ציבורי"],
            Self::Security => &["עבירות בטחון"],
            Self::EconomicAdministrative => {
                &["עבירות כלכליות", "עבירות מנהליות", "עבירות רשוי"]
            }
            Self::Traffic => &["עבירות תנועה"],
            Self::Fraud => &["עבירות מרמה"],
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::GeneralCriminal,
            Self::MoralPublicOrder,
            Self::Security,
            Self::EconomicAdministrative,
            Self::Traffic,
            Self::Fraud,
        ]
    }
}

/// Maps a fine-grained statistic-group label to its coarse category.
///
/// Uses the fixed membership table, nothing else. Returns `None` for
/// labels not in any category's member list; such records are
/// excluded from category-keyed aggregates by policy, not treated as
/// errors.
#[must_use]
pub fn categorize(label: &str) -> Option<Category> {
    let trimmed = label.trim();
    Category::all()
        .iter()
        .copied()
        .find(|category| category.members().contains(&trimmed))
}

/// A calendar quarter.
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
pub enum Quarter {
    /// January–March
    Q1,
    /// April–June
    Q2,
    /// July–September
    Q3,
    /// October–December
    Q4,
}

impl Quarter {
    /// Returns the quarter number, 1–4.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        }
    }

    /// Creates a quarter from its number.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-4.
    pub const fn from_number(value: u8) -> Result<Self, InvalidQuarterError> {
        match value {
            1 => Ok(Self::Q1),
            2 => Ok(Self::Q2),
            3 => Ok(Self::Q3),
            4 => Ok(Self::Q4),
            _ => Err(InvalidQuarterError { value }),
        }
    }

    /// Parses a quarter from a source label.
    ///
    /// The source data carries quarter labels in several shapes
    /// (`"Q1"`, `"רבעון 3"`, `"1"`); the first ASCII digit found in
    /// the label decides the quarter.
    ///
    /// # Errors
    ///
    /// Returns an error if the label contains no digit in 1-4.
    pub fn parse_label(label: &str) -> Result<Self, InvalidQuarterError> {
        let Some(digit) = label
            .chars()
            .find(char::is_ascii_digit)
            .and_then(|c| c.to_digit(10))
        else {
            return Err(InvalidQuarterError { value: 0 });
        };

        Self::from_number(u8::try_from(digit).unwrap_or(0))
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Q1, Self::Q2, Self::Q3, Self::Q4]
    }
}

/// Error returned when a quarter label or number cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidQuarterError {
    /// The invalid quarter number (0 when no digit was found at all).
    pub value: u8,
}

impl std::fmt::Display for InvalidQuarterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid quarter value {}: expected 1-4", self.value)
    }
}

impl std::error::Error for InvalidQuarterError {}

/// A year-quarter time bucket, ordered chronologically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct YearQuarter {
    /// Calendar year.
    pub year: i32,
    /// Calendar quarter within the year.
    pub quarter: Quarter,
}

impl YearQuarter {
    /// Creates a new year-quarter bucket.
    #[must_use]
    pub const fn new(year: i32, quarter: Quarter) -> Self {
        Self { year, quarter }
    }

    /// Returns a monotone quarter index (quarters since year 0), used
    /// for counting quarters between two buckets.
    #[must_use]
    pub const fn index(self) -> i32 {
        self.year * 4 + self.quarter.number() as i32 - 1
    }
}

impl std::fmt::Display for YearQuarter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.year, self.quarter)
    }
}

/// The event boundary splitting the dataset into before/after regimes.
///
/// The default boundary is Q4-2023 (the October 7th events): the
/// boundary quarter itself belongs to the "after" regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBoundary {
    /// First quarter of the "after" regime.
    pub first_after: YearQuarter,
}

impl Default for EventBoundary {
    fn default() -> Self {
        Self {
            first_after: YearQuarter::new(2023, Quarter::Q4),
        }
    }
}

/// A time regime relative to an [`EventBoundary`].
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Period {
    /// Strictly earlier than the boundary quarter.
    Before,
    /// The boundary quarter and everything later.
    After,
}

impl Period {
    /// Tags a year-quarter bucket with its regime.
    #[must_use]
    pub fn of(bucket: YearQuarter, boundary: EventBoundary) -> Self {
        if bucket < boundary.first_after {
            Self::Before
        } else {
            Self::After
        }
    }

    /// Returns the Hebrew display label for this period, as shown in
    /// the source dashboard.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Before => "לפני ה7.10",
            Self::After => "אחרי ה7.10",
        }
    }
}

/// District label for the nationwide pseudo-rows present in the source
/// data. Filtered out before any per-district view.
pub const NATIONWIDE_DISTRICT: &str = "כל הארץ";

/// Synthetic roll-up label summing all real districts.
pub const ALL_DISTRICTS: &str = "כל המחוזות";

/// Whether a district name refers to a real policing district rather
/// than a nationwide pseudo-row or the synthetic roll-up.
#[must_use]
pub fn is_real_district(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed != NATIONWIDE_DISTRICT && trimmed != ALL_DISTRICTS
}
