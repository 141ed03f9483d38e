use crate::types::{GdpRecord, MergedRecord, RegionRecord};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

/// Left outer join on exact country name.
///
/// Output follows the order of `gdp_rows`. When a country appears more than
/// once in `region_rows`, the first occurrence wins.
pub fn join(gdp_rows: &[GdpRecord], region_rows: &[RegionRecord]) -> Vec<MergedRecord> {
    let mut regions: HashMap<&str, &str> = HashMap::with_capacity(region_rows.len());
    for row in region_rows {
        match regions.entry(row.country.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(row.region.as_str());
            }
            Entry::Occupied(existing) => {
                debug!(
                    "Duplicate region row for {:?}: keeping {:?}, ignoring {:?}",
                    row.country,
                    existing.get(),
                    row.region
                );
            }
        }
    }

    gdp_rows
        .iter()
        .map(|gdp| MergedRecord {
            country: gdp.country.clone(),
            gdp_billion_usd: gdp.gdp_billion_usd,
            year: gdp.year.clone(),
            region: regions.get(gdp.country.as_str()).map(|r| r.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gdp(country: &str, value: f64) -> GdpRecord {
        GdpRecord {
            country: country.to_string(),
            gdp_billion_usd: value,
            year: "2025".to_string(),
        }
    }

    fn region(country: &str, region: &str) -> RegionRecord {
        RegionRecord {
            country: country.to_string(),
            region: region.to_string(),
        }
    }

    #[test]
    fn test_left_join_keeps_unmatched() {
        let merged = join(
            &[gdp("Germany", 4744.8), gdp("Atlantis", 1.23)],
            &[region("Germany", "Europe"), region("Kenya", "Africa")],
        );

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].region.as_deref(), Some("Europe"));
        assert_eq!(
            merged[1],
            MergedRecord {
                country: "Atlantis".into(),
                gdp_billion_usd: 1.23,
                year: "2025".into(),
                region: None,
            }
        );
    }

    #[test]
    fn test_join_preserves_left_order() {
        let left = vec![gdp("China", 19231.7), gdp("Japan", 4186.43), gdp("Kenya", 100.0)];
        let right = vec![
            region("Kenya", "Africa"),
            region("Japan", "Asia"),
            region("China", "Asia"),
        ];

        let merged = join(&left, &right);
        let countries: Vec<_> = merged.iter().map(|m| m.country.as_str()).collect();
        assert_eq!(countries, vec!["China", "Japan", "Kenya"]);
        assert!(merged
            .iter()
            .filter_map(|m| m.region.as_deref())
            .all(|r| right.iter().any(|row| row.region == r)));
    }

    #[test]
    fn test_duplicate_region_rows_first_wins() {
        let merged = join(
            &[gdp("Germany", 4744.8)],
            &[region("Germany", "Europe"), region("Germany", "Western Europe")],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].region.as_deref(), Some("Europe"));
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let merged = join(&[gdp("germany", 1.0)], &[region("Germany", "Europe")]);
        assert_eq!(merged[0].region, None);
    }
}
