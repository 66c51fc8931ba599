//! Chart-ready view builders, one per dashboard view.
//!
//! Each builder is a pure function from (records, filter state) to a
//! typed table: the presentation layer triggers recomputation on
//! widget changes, the builders own the reshaping.

use std::collections::{BTreeMap, BTreeSet};

use crime_trends_analytics_models::{
    CategoryCount, CategoryOverview, CategoryQuarterCount, FilterParams, PeriodComparison,
    PeriodComparisonRow, TrendPoint, TrendTable,
};
use crime_trends_crime_models::{
    ALL_DISTRICTS, Category, EventBoundary, Period, Quarter, YearQuarter,
};
use crime_trends_source_models::IncidentRecord;

use crate::aggregate::{real_district_records, rollup_districts};
use crate::periods::{RegimeDivisors, aggregate_by_period, normalize_by_period};

fn selected_categories(filters: &FilterParams) -> BTreeSet<Category> {
    filters
        .categories
        .clone()
        .unwrap_or_else(|| Category::all().iter().copied().collect())
}

fn matches_filters(record: &IncidentRecord, filters: &FilterParams) -> bool {
    filters.year.is_none_or(|year| record.year == year)
        && filters
            .district
            .as_deref()
            .is_none_or(|district| record.district == district)
}

/// Builds the per-category overview: one bar per category, optionally
/// split into grouped per-quarter bars.
///
/// The result is zero-filled over every selected category (and every
/// quarter, when split) so the chart axes do not shift with the
/// year filter. Categories are ordered by descending total.
#[must_use]
pub fn category_overview(records: &[IncidentRecord], filters: &FilterParams) -> CategoryOverview {
    let categories = selected_categories(filters);

    let mut totals: BTreeMap<Category, u64> =
        categories.iter().map(|category| (*category, 0)).collect();
    let mut by_quarter: BTreeMap<(Category, Quarter), u64> = categories
        .iter()
        .flat_map(|category| Quarter::all().iter().map(|quarter| ((*category, *quarter), 0)))
        .collect();

    for record in records {
        if !matches_filters(record, filters) {
            continue;
        }
        let Some(category) = record.category.filter(|c| categories.contains(c)) else {
            continue;
        };

        *totals.entry(category).or_insert(0) += 1;
        if let Some(quarter) = record.quarter {
            *by_quarter.entry((category, quarter)).or_insert(0) += 1;
        }
    }

    let mut category_order: Vec<Category> = categories.iter().copied().collect();
    category_order.sort_by_key(|category| std::cmp::Reverse(totals[category]));

    if filters.split_by_quarter {
        let rows = category_order
            .iter()
            .flat_map(|category| {
                Quarter::all().iter().map(|quarter| CategoryQuarterCount {
                    category: *category,
                    quarter: *quarter,
                    count: by_quarter[&(*category, *quarter)],
                })
            })
            .collect();

        CategoryOverview::ByQuarter {
            rows,
            category_order,
        }
    } else {
        let rows = category_order
            .iter()
            .map(|category| CategoryCount {
                category: *category,
                count: totals[category],
            })
            .collect();

        CategoryOverview::Totals { rows }
    }
}

/// Builds the quarterly trend lines for the selected categories.
///
/// The bucket axis covers every year-quarter present among the
/// categorized records that pass the year/district filters,
/// regardless of the category selection, so toggling categories never
/// shifts the x-axis. Points are emitted only for buckets a category
/// actually has records in.
#[must_use]
pub fn quarterly_trend(records: &[IncidentRecord], filters: &FilterParams) -> TrendTable {
    let categories = selected_categories(filters);

    let mut buckets: BTreeSet<YearQuarter> = BTreeSet::new();
    let mut counts: BTreeMap<(YearQuarter, Category), u64> = BTreeMap::new();

    for record in records {
        if !matches_filters(record, filters) {
            continue;
        }
        let (Some(category), Some(bucket)) = (record.category, record.year_quarter()) else {
            continue;
        };

        buckets.insert(bucket);
        if categories.contains(&category) {
            *counts.entry((bucket, category)).or_insert(0) += 1;
        }
    }

    TrendTable {
        buckets: buckets.into_iter().collect(),
        points: counts
            .into_iter()
            .map(|((bucket, category), count)| TrendPoint {
                bucket,
                category,
                count,
            })
            .collect(),
    }
}

/// Builds the before/after comparison for one district, or for the
/// all-districts roll-up when no district is selected.
///
/// Counts are normalized per quarter of each regime; the roll-up row
/// is taken from the synthetic aggregate, never by re-summing the
/// per-district rows, so nothing is counted twice. Rows are
/// zero-filled over all six categories and ordered by descending
/// before-count.
#[must_use]
pub fn period_comparison(
    records: &[IncidentRecord],
    boundary: EventBoundary,
    selected_district: Option<&str>,
) -> PeriodComparison {
    let district_records = real_district_records(records);
    let grouped = rollup_districts(&aggregate_by_period(&district_records, boundary));

    let divisors = RegimeDivisors::for_records(&district_records, boundary);
    let normalized = normalize_by_period(&grouped, divisors);

    let district = selected_district.unwrap_or(ALL_DISTRICTS).to_string();

    let mut before: BTreeMap<Category, u64> = BTreeMap::new();
    let mut after: BTreeMap<Category, u64> = BTreeMap::new();
    let mut districts: BTreeSet<String> = BTreeSet::new();

    for row in &normalized {
        let (Some(category), Some(period), Some(row_district)) =
            (row.key.category, row.key.period, row.key.district.as_deref())
        else {
            continue;
        };

        districts.insert(row_district.to_string());
        if row_district != district {
            continue;
        }

        let target = match period {
            Period::Before => &mut before,
            Period::After => &mut after,
        };
        *target.entry(category).or_insert(0) += row.normalized_count;
    }

    let mut rows: Vec<PeriodComparisonRow> = Category::all()
        .iter()
        .map(|category| PeriodComparisonRow {
            category: *category,
            before: before.get(category).copied().unwrap_or(0),
            after: after.get(category).copied().unwrap_or(0),
        })
        .collect();
    rows.sort_by_key(|row| (std::cmp::Reverse(row.before), std::cmp::Reverse(row.after)));

    // Selector order: roll-up first, then the real districts sorted.
    let mut district_list = vec![ALL_DISTRICTS.to_string()];
    district_list.extend(districts.into_iter().filter(|d| d != ALL_DISTRICTS));

    PeriodComparison {
        district,
        rows,
        districts: district_list,
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::record;

    use super::*;

    fn sample() -> Vec<IncidentRecord> {
        vec![
            record("עבירות תנועה", "מחוז דרומי", 2022, Some(Quarter::Q1)),
            record("עבירות תנועה", "מחוז דרומי", 2022, Some(Quarter::Q1)),
            record("עבירות תנועה", "מחוז צפון", 2023, Some(Quarter::Q2)),
            record("עבירות מרמה", "מחוז צפון", 2023, Some(Quarter::Q2)),
            record("עבירות מין", "מחוז דרומי", 2024, Some(Quarter::Q1)),
            record("לא קיים", "מחוז דרומי", 2022, Some(Quarter::Q1)),
        ]
    }

    #[test]
    fn overview_zero_fills_all_six_categories() {
        let overview = category_overview(&sample(), &FilterParams::default());
        let CategoryOverview::Totals { rows } = overview else {
            panic!("expected totals");
        };

        assert_eq!(rows.len(), Category::all().len());
        assert_eq!(rows[0].category, Category::Traffic);
        assert_eq!(rows[0].count, 3);
        assert!(rows.iter().any(|row| row.count == 0));
        // Descending order.
        assert!(rows.windows(2).all(|pair| pair[0].count >= pair[1].count));
    }

    #[test]
    fn overview_applies_year_filter() {
        let filters = FilterParams {
            year: Some(2022),
            ..FilterParams::default()
        };
        let CategoryOverview::Totals { rows } = category_overview(&sample(), &filters) else {
            panic!("expected totals");
        };

        let traffic = rows
            .iter()
            .find(|row| row.category == Category::Traffic)
            .unwrap();
        assert_eq!(traffic.count, 2);
        let total: u64 = rows.iter().map(|row| row.count).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn overview_quarter_split_covers_full_grid() {
        let filters = FilterParams {
            split_by_quarter: true,
            ..FilterParams::default()
        };
        let CategoryOverview::ByQuarter {
            rows,
            category_order,
        } = category_overview(&sample(), &filters)
        else {
            panic!("expected quarter split");
        };

        assert_eq!(rows.len(), Category::all().len() * Quarter::all().len());
        assert_eq!(category_order[0], Category::Traffic);

        let q1_traffic = rows
            .iter()
            .find(|row| row.category == Category::Traffic && row.quarter == Quarter::Q1)
            .unwrap();
        assert_eq!(q1_traffic.count, 2);
    }

    #[test]
    fn trend_axis_is_stable_across_category_toggles() {
        let all = quarterly_trend(&sample(), &FilterParams::default());

        let only_fraud = FilterParams {
            categories: Some([Category::Fraud].into_iter().collect()),
            ..FilterParams::default()
        };
        let fraud = quarterly_trend(&sample(), &only_fraud);

        assert_eq!(all.buckets, fraud.buckets);
        assert!(fraud.points.iter().all(|p| p.category == Category::Fraud));
        assert_eq!(fraud.points.len(), 1);
        assert_eq!(fraud.points[0].count, 1);
    }

    #[test]
    fn trend_points_skip_uncategorized_records() {
        let table = quarterly_trend(&sample(), &FilterParams::default());
        let total: u64 = table.points.iter().map(|p| p.count).sum();
        // Five categorized records; the unmapped label contributes
        // nothing.
        assert_eq!(total, 5);
    }

    #[test]
    fn comparison_rollup_matches_district_sum() {
        let records = sample();
        let rollup = period_comparison(&records, EventBoundary::default(), None);

        let mut summed: BTreeMap<Category, (u64, u64)> = BTreeMap::new();
        for district in ["מחוז דרומי", "מחוז צפון"] {
            let table = period_comparison(&records, EventBoundary::default(), Some(district));
            for row in table.rows {
                let entry = summed.entry(row.category).or_insert((0, 0));
                entry.0 += row.before;
                entry.1 += row.after;
            }
        }

        for row in &rollup.rows {
            let (before, after) = summed.get(&row.category).copied().unwrap_or((0, 0));
            assert_eq!(row.before, before, "{:?} before", row.category);
            assert_eq!(row.after, after, "{:?} after", row.category);
        }
    }

    #[test]
    fn comparison_selects_one_district() {
        let table =
            period_comparison(&sample(), EventBoundary::default(), Some("מחוז צפון"));

        assert_eq!(table.district, "מחוז צפון");
        assert_eq!(table.rows.len(), Category::all().len());

        let total: u64 = table.rows.iter().map(|row| row.before + row.after).sum();
        // Two categorized records in the northern district, both
        // before the boundary, normalized by 15 quarters: both round
        // to 0.
        assert_eq!(total, 0);
    }

    #[test]
    fn comparison_district_selector_puts_rollup_first() {
        let table = period_comparison(&sample(), EventBoundary::default(), None);
        assert_eq!(table.districts[0], ALL_DISTRICTS);
        assert!(table.districts.contains(&"מחוז דרומי".to_string()));
        assert!(table.districts.contains(&"מחוז צפון".to_string()));
    }
}
