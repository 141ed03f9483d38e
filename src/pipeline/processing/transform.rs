use crate::apis::strip_annotations;
use crate::error::{EtlError, Result};
use crate::types::{GdpRecord, RawGdpRow};
use tracing::debug;

/// Million USD digits to billion USD, rounded to two decimals.
///
/// Rounds the f64 quotient `millions / 1000.0` by its exact binary value,
/// so a raw value ending in 5 goes up or down depending on which side of
/// the decimal midpoint the quotient landed. Only quotients that sit
/// exactly on a midpoint (such as 0.125) round to even.
pub fn million_to_billion(country: &str, gdp_raw: &str) -> Result<f64> {
    let millions: u64 = gdp_raw.trim().parse().map_err(|_| EtlError::MalformedInput {
        country: country.to_string(),
        value: gdp_raw.to_string(),
    })?;

    // hundredths of a billion = millions / 10
    let mut hundredths = millions / 10;
    let round_up = match millions % 10 {
        0..=4 => false,
        6..=9 => true,
        _ => {
            let quotient = millions as f64 / 1000.0;
            // Exact sign of quotient * 1000 - millions
            let error = quotient.mul_add(1000.0, -(millions as f64));
            error > 0.0 || (error == 0.0 && hundredths % 2 == 1)
        }
    };
    if round_up {
        hundredths += 1;
    }
    Ok(hundredths as f64 / 100.0)
}

/// Stable sort, largest GDP first; equal values keep their order
pub fn sort_by_gdp_desc(records: &mut [GdpRecord]) {
    records.sort_by(|a, b| b.gdp_billion_usd.total_cmp(&a.gdp_billion_usd));
}

/// Convert units, clean the year text and sort.
///
/// Fails on the first row whose GDP is not an integer; nothing is returned
/// for the other rows in that case.
pub fn transform(raw: &[RawGdpRow]) -> Result<Vec<GdpRecord>> {
    let mut records = raw
        .iter()
        .map(|row| {
            let gdp_billion_usd = million_to_billion(&row.country, &row.gdp_raw)?;
            Ok(GdpRecord {
                country: row.country.clone(),
                gdp_billion_usd,
                year: strip_annotations(&row.year_raw),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    sort_by_gdp_desc(&mut records);
    debug!("Transformed {} GDP rows", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(country: &str, gdp: &str, year: &str) -> RawGdpRow {
        RawGdpRow {
            country: country.to_string(),
            gdp_raw: gdp.to_string(),
            year_raw: year.to_string(),
        }
    }

    #[test]
    fn test_unit_conversion() {
        assert_eq!(million_to_billion("x", "30507217").unwrap(), 30507.22);
        assert_eq!(million_to_billion("x", "19231704").unwrap(), 19231.7);
        assert_eq!(million_to_billion("x", "100000").unwrap(), 100.0);
        assert_eq!(million_to_billion("x", "1234").unwrap(), 1.23);
        assert_eq!(million_to_billion("x", "0").unwrap(), 0.0);
    }

    #[test]
    fn test_unit_conversion_rounds_the_f64_quotient() {
        // 12.345 is stored slightly above the midpoint, 1.015 and 2.675 below
        assert_eq!(million_to_billion("x", "12345").unwrap(), 12.35);
        assert_eq!(million_to_billion("x", "1015").unwrap(), 1.01);
        assert_eq!(million_to_billion("x", "2675").unwrap(), 2.67);
        assert_eq!(million_to_billion("x", "12355").unwrap(), 12.36);
    }

    #[test]
    fn test_unit_conversion_exact_midpoint_rounds_to_even() {
        assert_eq!(million_to_billion("x", "125").unwrap(), 0.12);
        assert_eq!(million_to_billion("x", "1375").unwrap(), 1.38);
    }

    #[test]
    fn test_malformed_gdp_is_fatal() {
        for bad in ["—", "", "12.5", "-300", "n/a"] {
            let err = million_to_billion("Atlantis", bad).unwrap_err();
            match err {
                EtlError::MalformedInput { country, value } => {
                    assert_eq!(country, "Atlantis");
                    assert_eq!(value, bad);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_transform_scenario() {
        let records = transform(&[raw("United States", "30507217", "2025[1]")]).unwrap();
        assert_eq!(
            records,
            vec![GdpRecord {
                country: "United States".into(),
                gdp_billion_usd: 30507.22,
                year: "2025".into(),
            }]
        );
    }

    #[test]
    fn test_transform_sorts_descending_and_stable() {
        let input = vec![
            raw("Kenya", "100000", "2024 [n 1]"),
            raw("Tie A", "500000", "2025"),
            raw("Nigeria", "188271", "2025"),
            raw("Tie B", "500000", "2025"),
            raw("Germany", "4744804", "2025"),
        ];

        let records = transform(&input).unwrap();
        let countries: Vec<_> = records.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(countries, vec!["Germany", "Tie A", "Tie B", "Nigeria", "Kenya"]);
        assert_eq!(records[4].year, "2024");
        assert!(records.len() <= input.len());
        assert!(records
            .windows(2)
            .all(|w| w[0].gdp_billion_usd >= w[1].gdp_billion_usd));
    }

    #[test]
    fn test_transform_aborts_whole_batch() {
        let input = vec![
            raw("Germany", "4744804", "2025"),
            raw("Broken", "4,744", "2025"),
        ];
        assert!(matches!(
            transform(&input),
            Err(EtlError::MalformedInput { .. })
        ));
    }
}
