//! Crime-rate computation against the auxiliary tables.

use std::collections::BTreeSet;

use crime_trends_analytics_models::{Dimension, DistrictRateRow};
use crime_trends_auxiliary::{EmploymentTable, PopulationTable};
use crime_trends_source_models::IncidentRecord;

use crate::aggregate::{aggregate, real_district_records};

/// Computes `count / population`.
///
/// A missing (or non-positive) population falls back to a divisor of
/// 1, so the rate degrades to the raw count instead of becoming
/// undefined. The result is deliberately not scaled to a per-1,000
/// figure; see the population table's documentation.
#[must_use]
pub fn crime_rate(count: u64, population: Option<f64>) -> f64 {
    let divisor = population.filter(|p| *p > 0.0).unwrap_or(1.0);

    #[allow(clippy::cast_precision_loss)]
    let rate = count as f64 / divisor;
    rate
}

/// Joins per-(year, district) crime counts with the employment and
/// population tables.
///
/// Outer-join semantics: a `(year, district)` pair present in any of
/// the three inputs produces a row. Missing crime data yields a count
/// of 0, missing employment leaves the rate `None`, and missing
/// population falls back to a divisor of 1. Join gaps are logged, not
/// raised.
#[must_use]
pub fn district_rates(
    records: &[IncidentRecord],
    employment: &EmploymentTable,
    population: &PopulationTable,
) -> Vec<DistrictRateRow> {
    let district_records = real_district_records(records);
    let counts = aggregate(&district_records, &[Dimension::Year, Dimension::District]);

    let mut keys: BTreeSet<(i32, String)> = BTreeSet::new();
    for row in &counts {
        if let (Some(year), Some(district)) = (row.key.year, row.key.district.as_deref()) {
            keys.insert((year, district.to_string()));
        }
    }
    for (year, district) in employment.0.keys() {
        keys.insert((year, district.to_string()));
    }
    for (year, district) in population.0.keys() {
        keys.insert((year, district.to_string()));
    }

    let mut employment_gaps: u64 = 0;
    let mut population_gaps: u64 = 0;

    let rows: Vec<DistrictRateRow> = keys
        .into_iter()
        .map(|(year, district)| {
            let crime_count = counts
                .iter()
                .find(|row| {
                    row.key.year == Some(year)
                        && row.key.district.as_deref() == Some(district.as_str())
                })
                .map_or(0, |row| row.count);

            let employment_rate = employment.get(year, &district);
            if employment_rate.is_none() {
                employment_gaps += 1;
            }

            let population_value = population.get(year, &district);
            if population_value.is_none() {
                population_gaps += 1;
            }

            let rate = crime_rate(crime_count, population_value);

            DistrictRateRow {
                year,
                district,
                crime_count,
                employment_rate,
                population: population_value.filter(|p| *p > 0.0).unwrap_or(1.0),
                crime_rate: rate,
            }
        })
        .collect();

    if employment_gaps > 0 || population_gaps > 0 {
        log::debug!(
            "district_rates: {employment_gaps} employment gaps, \
             {population_gaps} population gaps across {} rows",
            rows.len()
        );
    }

    rows
}

#[cfg(test)]
mod tests {
    use crime_trends_auxiliary::{EmploymentTable, PopulationTable};
    use crime_trends_crime_models::Quarter;

    use crate::testing::record;

    use super::*;

    fn employment() -> EmploymentTable {
        EmploymentTable::from_reader(
            "Year,PoliceDistrict,EmploymentRate\n2021,מחוז דרומי,61.5\n".as_bytes(),
        )
        .unwrap()
    }

    fn population() -> PopulationTable {
        PopulationTable::from_reader(
            "Year,PoliceDistrict,Population(k)\n2021,מחוז דרומי,1450.0\n".as_bytes(),
        )
        .unwrap()
    }

    #[test]
    fn rate_divides_by_population() {
        assert!((crime_rate(2900, Some(1450.0)) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_population_yields_raw_count() {
        // Scenario: no population for (2021, northern district).
        assert!((crime_rate(321, None) - 321.0).abs() < f64::EPSILON);
        assert!((crime_rate(321, Some(0.0)) - 321.0).abs() < f64::EPSILON);
    }

    #[test]
    fn joins_all_three_inputs() {
        let records = vec![
            record("עבירות תנועה", "מחוז דרומי", 2021, Some(Quarter::Q1)),
            record("עבירות תנועה", "מחוז דרומי", 2021, Some(Quarter::Q2)),
            record("עבירות מרמה", "מחוז צפון", 2021, Some(Quarter::Q1)),
        ];

        let rows = district_rates(&records, &employment(), &population());
        assert_eq!(rows.len(), 2);

        let south = rows.iter().find(|r| r.district == "מחוז דרומי").unwrap();
        assert_eq!(south.crime_count, 2);
        assert_eq!(south.employment_rate, Some(61.5));
        assert!((south.crime_rate - 2.0 / 1450.0).abs() < f64::EPSILON);

        // North has crime data but neither auxiliary metric: the rate
        // degrades to the raw count.
        let north = rows.iter().find(|r| r.district == "מחוז צפון").unwrap();
        assert_eq!(north.crime_count, 1);
        assert_eq!(north.employment_rate, None);
        assert!((north.crime_rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn auxiliary_only_pairs_appear_with_zero_count() {
        let rows = district_rates(&[], &employment(), &population());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].crime_count, 0);
        assert_eq!(rows[0].employment_rate, Some(61.5));
        assert!((rows[0].crime_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn nationwide_rows_are_excluded_from_counts() {
        let records = vec![
            record("עבירות תנועה", "כל הארץ", 2021, Some(Quarter::Q1)),
            record("עבירות תנועה", "מחוז דרומי", 2021, Some(Quarter::Q1)),
        ];

        let rows = district_rates(&records, &employment(), &population());
        let south = rows.iter().find(|r| r.district == "מחוז דרומי").unwrap();
        assert_eq!(south.crime_count, 1);
        assert!(!rows.iter().any(|r| r.district == "כל הארץ"));
    }
}
