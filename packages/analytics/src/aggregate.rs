//! Grouping and the all-districts roll-up.

use std::collections::BTreeMap;

use crime_trends_analytics_models::{CountRow, Dimension, GroupKey};
use crime_trends_crime_models::{ALL_DISTRICTS, is_real_district};
use crime_trends_source_models::IncidentRecord;

/// Groups records by the requested dimensions and counts each bucket.
///
/// One row per distinct key combination present in the input;
/// combinations absent from the input are not synthesized (zero-fill
/// is the view builder's job). Rows are ordered by key.
///
/// Records that cannot supply a requested dimension are excluded from
/// the result: no category for [`Dimension::Category`], no parseable
/// quarter for [`Dimension::Quarter`]. That exclusion is data-quality
/// policy, not an error.
#[must_use]
pub fn aggregate(records: &[IncidentRecord], dimensions: &[Dimension]) -> Vec<CountRow> {
    let mut buckets: BTreeMap<GroupKey, u64> = BTreeMap::new();
    let mut excluded: u64 = 0;

    'records: for record in records {
        let mut key = GroupKey::default();

        for dimension in dimensions {
            match dimension {
                Dimension::Category => match record.category {
                    Some(category) => key.category = Some(category),
                    None => {
                        excluded += 1;
                        continue 'records;
                    }
                },
                Dimension::Year => key.year = Some(record.year),
                Dimension::Quarter => match record.quarter {
                    Some(quarter) => key.quarter = Some(quarter),
                    None => {
                        excluded += 1;
                        continue 'records;
                    }
                },
                Dimension::District => key.district = Some(record.district.clone()),
            }
        }

        *buckets.entry(key).or_insert(0) += 1;
    }

    if excluded > 0 {
        log::debug!("aggregate: excluded {excluded} records missing a grouping dimension");
    }

    buckets
        .into_iter()
        .map(|(key, count)| CountRow { key, count })
        .collect()
}

/// Returns the records belonging to a real policing district,
/// dropping the nationwide pseudo-rows the source carries.
#[must_use]
pub fn real_district_records(records: &[IncidentRecord]) -> Vec<IncidentRecord> {
    records
        .iter()
        .filter(|record| is_real_district(&record.district))
        .cloned()
        .collect()
}

/// Adds a synthetic all-districts roll-up to district-keyed rows.
///
/// For every distinct key shape among the real-district rows, a row
/// labeled with the roll-up district sums their counts. The synthetic
/// rows are additional: the per-district rows are returned unchanged
/// alongside them, and rows whose district is not a real district
/// (including an existing roll-up) contribute nothing to the sums.
#[must_use]
pub fn rollup_districts(rows: &[CountRow]) -> Vec<CountRow> {
    let mut totals: BTreeMap<GroupKey, u64> = BTreeMap::new();

    for row in rows {
        let Some(district) = &row.key.district else {
            continue;
        };
        if !is_real_district(district) {
            continue;
        }

        let mut key = row.key.clone();
        key.district = Some(ALL_DISTRICTS.to_string());
        *totals.entry(key).or_insert(0) += row.count;
    }

    let mut combined = rows.to_vec();
    combined.extend(
        totals
            .into_iter()
            .map(|(key, count)| CountRow { key, count }),
    );
    combined
}

#[cfg(test)]
mod tests {
    use crime_trends_crime_models::{Category, Quarter};

    use crate::testing::record;

    use super::*;

    #[test]
    fn counts_three_identical_records() {
        // Scenario: three traffic offenses in the southern district.
        let records = vec![
            record("עבירות תנועה", "מחוז דרומי", 2022, Some(Quarter::Q1)),
            record("עבירות תנועה", "מחוז דרומי", 2022, Some(Quarter::Q1)),
            record("עבירות תנועה", "מחוז דרומי", 2022, Some(Quarter::Q1)),
        ];

        let rows = aggregate(&records, &[Dimension::Category]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key.category, Some(Category::Traffic));
        assert_eq!(rows[0].count, 3);
    }

    #[test]
    fn unmapped_label_is_excluded_from_category_views() {
        let records = vec![
            record("לא קיים", "מחוז דרומי", 2022, Some(Quarter::Q1)),
            record("עבירות מרמה", "מחוז דרומי", 2022, Some(Quarter::Q1)),
        ];

        let rows = aggregate(&records, &[Dimension::Category]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key.category, Some(Category::Fraud));

        let total: u64 = rows.iter().map(|row| row.count).sum();
        let uncategorized = records
            .iter()
            .filter(|r| r.category.is_none())
            .count() as u64;
        assert_eq!(total + uncategorized, records.len() as u64);
    }

    #[test]
    fn category_sums_account_for_every_record() {
        let records = vec![
            record("עבירות תנועה", "מחוז דרומי", 2022, Some(Quarter::Q1)),
            record("עבירות מין", "מחוז צפון", 2022, Some(Quarter::Q2)),
            record("עבירות סדר ציבורי", "מחוז צפון", 2023, Some(Quarter::Q3)),
            record("לא קיים", "מחוז צפון", 2023, Some(Quarter::Q3)),
            record("גם לא קיים", "מחוז מרכז", 2024, None),
        ];

        let rows = aggregate(&records, &[Dimension::Category]);
        let categorized: u64 = rows.iter().map(|row| row.count).sum();
        let uncategorized = records
            .iter()
            .filter(|r| r.category.is_none())
            .count() as u64;

        assert_eq!(categorized + uncategorized, records.len() as u64);
    }

    #[test]
    fn absent_combinations_are_not_synthesized() {
        let records = vec![
            record("עבירות תנועה", "מחוז דרומי", 2022, Some(Quarter::Q1)),
            record("עבירות מרמה", "מחוז צפון", 2023, Some(Quarter::Q2)),
        ];

        let rows = aggregate(&records, &[Dimension::Category, Dimension::Year]);
        // Only the two present (category, year) pairs, not the cross
        // product.
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn quarterless_records_drop_from_quarter_groupings_only() {
        let records = vec![
            record("עבירות תנועה", "מחוז דרומי", 2022, None),
            record("עבירות תנועה", "מחוז דרומי", 2022, Some(Quarter::Q3)),
        ];

        let by_year = aggregate(&records, &[Dimension::Year]);
        assert_eq!(by_year[0].count, 2);

        let by_quarter = aggregate(&records, &[Dimension::Quarter]);
        assert_eq!(by_quarter.len(), 1);
        assert_eq!(by_quarter[0].count, 1);
    }

    #[test]
    fn nationwide_rows_are_not_real_districts() {
        let records = vec![
            record("עבירות תנועה", "כל הארץ", 2022, Some(Quarter::Q1)),
            record("עבירות תנועה", "", 2022, Some(Quarter::Q1)),
            record("עבירות תנועה", "מחוז דרומי", 2022, Some(Quarter::Q1)),
        ];

        let real = real_district_records(&records);
        assert_eq!(real.len(), 1);
        assert_eq!(real[0].district, "מחוז דרומי");
    }

    #[test]
    fn rollup_adds_without_replacing() {
        let records = vec![
            record("עבירות תנועה", "מחוז דרומי", 2022, Some(Quarter::Q1)),
            record("עבירות תנועה", "מחוז דרומי", 2022, Some(Quarter::Q1)),
            record("עבירות תנועה", "מחוז צפון", 2022, Some(Quarter::Q1)),
        ];

        let rows = aggregate(&records, &[Dimension::Category, Dimension::District]);
        let combined = rollup_districts(&rows);

        // Both per-district rows survive, plus one synthetic row.
        assert_eq!(combined.len(), rows.len() + 1);

        let rollup = combined
            .iter()
            .find(|row| row.key.district.as_deref() == Some(ALL_DISTRICTS))
            .unwrap();
        let district_sum: u64 = combined
            .iter()
            .filter(|row| {
                row.key
                    .district
                    .as_deref()
                    .is_some_and(is_real_district)
            })
            .map(|row| row.count)
            .sum();

        assert_eq!(rollup.count, 3);
        assert_eq!(rollup.count, district_sum);
    }

    #[test]
    fn rollup_ignores_existing_rollup_rows() {
        let records = vec![record(
            "עבירות תנועה",
            "מחוז דרומי",
            2022,
            Some(Quarter::Q1),
        )];
        let rows = aggregate(&records, &[Dimension::District]);

        let once = rollup_districts(&rows);
        let twice = rollup_districts(&once);

        let rollup_total: u64 = twice
            .iter()
            .filter(|row| row.key.district.as_deref() == Some(ALL_DISTRICTS))
            .map(|row| row.count)
            .sum();

        // The second pass re-derives the same synthetic row from the
        // real rows; it never compounds the first pass's output.
        assert_eq!(rollup_total, 2);
    }
}
