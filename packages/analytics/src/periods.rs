//! Before/after regime tagging and per-quarter normalization.
//!
//! Comparing raw counts across the event boundary would be skewed by
//! the regimes' unequal lengths (15 quarters before Q4-2023 vs 5
//! after, for the 2020-2024 span), so each regime's counts are
//! divided by its quarter count.

use std::collections::BTreeMap;

use crime_trends_analytics_models::{CountRow, GroupKey, NormalizedRow};
use crime_trends_crime_models::{EventBoundary, Period, Quarter, YearQuarter};
use crime_trends_source_models::IncidentRecord;

/// Number of quarters in each regime, used as normalization divisors.
///
/// Both values are floored at 1 so a degenerate boundary/span
/// combination can never divide by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegimeDivisors {
    /// Quarters strictly before the boundary.
    pub before: u64,
    /// Quarters from the boundary through the end of the span.
    pub after: u64,
}

impl RegimeDivisors {
    /// Computes the divisors for a dataset spanning `first..=last`
    /// quarters, split at `boundary`.
    #[must_use]
    pub fn for_span(first: YearQuarter, last: YearQuarter, boundary: EventBoundary) -> Self {
        let before = boundary.first_after.index() - first.index();
        let after = last.index() - boundary.first_after.index() + 1;

        Self {
            before: u64::try_from(before.max(1)).unwrap_or(1),
            after: u64::try_from(after.max(1)).unwrap_or(1),
        }
    }

    /// Computes the divisors from the year span actually present in
    /// the records, assuming full Q1–Q4 coverage of the first and
    /// last years. Empty input yields divisors of 1.
    #[must_use]
    pub fn for_records(records: &[IncidentRecord], boundary: EventBoundary) -> Self {
        let Some(first_year) = records.iter().map(|r| r.year).min() else {
            return Self { before: 1, after: 1 };
        };
        let last_year = records.iter().map(|r| r.year).max().unwrap_or(first_year);

        Self::for_span(
            YearQuarter::new(first_year, Quarter::Q1),
            YearQuarter::new(last_year, Quarter::Q4),
            boundary,
        )
    }

    /// Returns the divisor for a regime.
    #[must_use]
    pub const fn divisor(self, period: Period) -> u64 {
        match period {
            Period::Before => self.before,
            Period::After => self.after,
        }
    }
}

/// Tags a record with no parseable quarter by its year alone: the
/// year's first quarter stands in, so a year entirely past the
/// boundary tags After and everything else tags Before.
fn year_regime(year: i32, boundary: EventBoundary) -> Period {
    Period::of(YearQuarter::new(year, Quarter::Q1), boundary)
}

/// Groups records by `(category, period, district)` against the
/// boundary.
///
/// Records without a category cannot participate and are excluded
/// (logged, not an error). Records without a parseable quarter are
/// kept and tagged by [`year_regime`].
#[must_use]
pub fn aggregate_by_period(records: &[IncidentRecord], boundary: EventBoundary) -> Vec<CountRow> {
    let mut buckets: BTreeMap<GroupKey, u64> = BTreeMap::new();
    let mut excluded: u64 = 0;

    for record in records {
        let Some(category) = record.category else {
            excluded += 1;
            continue;
        };

        let period = record.year_quarter().map_or_else(
            || year_regime(record.year, boundary),
            |bucket| Period::of(bucket, boundary),
        );

        let key = GroupKey {
            category: Some(category),
            period: Some(period),
            district: Some(record.district.clone()),
            ..GroupKey::default()
        };
        *buckets.entry(key).or_insert(0) += 1;
    }

    if excluded > 0 {
        log::debug!("aggregate_by_period: excluded {excluded} uncategorized records");
    }

    buckets
        .into_iter()
        .map(|(key, count)| CountRow { key, count })
        .collect()
}

/// Divides each row's count by its regime's quarter count, rounding
/// to the nearest integer. Rows without a period tag are skipped.
#[must_use]
pub fn normalize_by_period(rows: &[CountRow], divisors: RegimeDivisors) -> Vec<NormalizedRow> {
    rows.iter()
        .filter_map(|row| {
            let period = row.key.period?;
            let divisor = divisors.divisor(period).max(1);

            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let normalized_count = (row.count as f64 / divisor as f64).round() as u64;

            Some(NormalizedRow {
                key: row.key.clone(),
                period,
                count: row.count,
                normalized_count,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crime_trends_crime_models::Category;

    use crate::testing::record;

    use super::*;

    #[test]
    fn default_span_divisors_match_the_dataset() {
        let divisors = RegimeDivisors::for_span(
            YearQuarter::new(2020, Quarter::Q1),
            YearQuarter::new(2024, Quarter::Q4),
            EventBoundary::default(),
        );
        assert_eq!(divisors.before, 15);
        assert_eq!(divisors.after, 5);
    }

    #[test]
    fn degenerate_spans_floor_at_one() {
        // Boundary at the very start of the span: zero quarters before.
        let divisors = RegimeDivisors::for_span(
            YearQuarter::new(2023, Quarter::Q4),
            YearQuarter::new(2024, Quarter::Q4),
            EventBoundary::default(),
        );
        assert_eq!(divisors.before, 1);
        assert_eq!(divisors.after, 5);

        // Boundary after the span end: "after" would be non-positive.
        let divisors = RegimeDivisors::for_span(
            YearQuarter::new(2020, Quarter::Q1),
            YearQuarter::new(2022, Quarter::Q4),
            EventBoundary::default(),
        );
        assert_eq!(divisors.after, 1);

        let empty: Vec<crime_trends_source_models::IncidentRecord> = Vec::new();
        let divisors = RegimeDivisors::for_records(&empty, EventBoundary::default());
        assert_eq!(divisors, RegimeDivisors { before: 1, after: 1 });
    }

    #[test]
    fn records_span_derivation() {
        let records = vec![
            record("עבירות תנועה", "מחוז דרומי", 2020, Some(Quarter::Q2)),
            record("עבירות תנועה", "מחוז דרומי", 2024, Some(Quarter::Q1)),
        ];
        let divisors = RegimeDivisors::for_records(&records, EventBoundary::default());
        assert_eq!(divisors.before, 15);
        assert_eq!(divisors.after, 5);
    }

    #[test]
    fn period_tagging_splits_at_the_boundary() {
        let records = vec![
            record("עבירות תנועה", "מחוז דרומי", 2023, Some(Quarter::Q3)),
            record("עבירות תנועה", "מחוז דרומי", 2023, Some(Quarter::Q4)),
            record("עבירות תנועה", "מחוז דרומי", 2024, Some(Quarter::Q1)),
        ];

        let rows = aggregate_by_period(&records, EventBoundary::default());
        assert_eq!(rows.len(), 2);

        let before = rows
            .iter()
            .find(|row| row.key.period == Some(Period::Before))
            .unwrap();
        let after = rows
            .iter()
            .find(|row| row.key.period == Some(Period::After))
            .unwrap();

        assert_eq!(before.count, 1);
        assert_eq!(after.count, 2);
        assert_eq!(before.key.category, Some(Category::Traffic));
    }

    #[test]
    fn quarterless_records_are_tagged_by_year() {
        let records = vec![
            record("עבירות תנועה", "מחוז דרומי", 2022, None),
            record("עבירות תנועה", "מחוז דרומי", 2023, None),
            record("עבירות תנועה", "מחוז דרומי", 2024, None),
        ];

        let rows = aggregate_by_period(&records, EventBoundary::default());

        let before = rows
            .iter()
            .find(|row| row.key.period == Some(Period::Before))
            .unwrap();
        let after = rows
            .iter()
            .find(|row| row.key.period == Some(Period::After))
            .unwrap();

        // 2022 and the boundary year itself tag Before; only a year
        // entirely past the boundary tags After.
        assert_eq!(before.count, 2);
        assert_eq!(after.count, 1);
    }

    #[test]
    fn normalization_rounds_to_nearest() {
        let records: Vec<_> = std::iter::repeat_with(|| {
            record("עבירות תנועה", "מחוז דרומי", 2022, Some(Quarter::Q1))
        })
        .take(30)
        .chain(std::iter::repeat_with(|| {
            record("עבירות תנועה", "מחוז דרומי", 2024, Some(Quarter::Q1))
        })
        .take(7))
        .collect();

        let rows = aggregate_by_period(&records, EventBoundary::default());
        let divisors = RegimeDivisors { before: 15, after: 5 };
        let normalized = normalize_by_period(&rows, divisors);

        let before = normalized
            .iter()
            .find(|row| row.period == Period::Before)
            .unwrap();
        let after = normalized
            .iter()
            .find(|row| row.period == Period::After)
            .unwrap();

        assert_eq!(before.normalized_count, 2); // 30 / 15
        assert_eq!(after.normalized_count, 1); // round(7 / 5)
    }

    #[test]
    fn zero_divisor_never_panics() {
        let rows = vec![CountRow {
            key: GroupKey {
                category: Some(Category::Traffic),
                period: Some(Period::Before),
                ..GroupKey::default()
            },
            count: 10,
        }];

        let normalized =
            normalize_by_period(&rows, RegimeDivisors { before: 0, after: 0 });
        assert_eq!(normalized[0].normalized_count, 10);
    }
}
