use crate::types::{MergedRecord, RegionAverage};
use std::collections::BTreeMap;

/// Records with GDP at or above `threshold`, in input order
pub fn filter_by_gdp_at_least(records: &[MergedRecord], threshold: f64) -> Vec<MergedRecord> {
    records
        .iter()
        .filter(|r| r.gdp_billion_usd >= threshold)
        .cloned()
        .collect()
}

/// Mean of the `k` largest values in each group.
///
/// Groups come back in ascending key order. Within a group, values are
/// ranked by a stable descending sort, so ties keep their input order.
/// Returns `(key, mean, members)`; nothing when `k` is zero.
pub fn top_k_average_by<'a, T, K, FK, FV>(
    items: &'a [T],
    k: usize,
    key: FK,
    value: FV,
) -> Vec<(K, f64, usize)>
where
    K: Ord,
    FK: Fn(&'a T) -> K,
    FV: Fn(&'a T) -> f64,
{
    if k == 0 {
        return Vec::new();
    }

    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for item in items {
        groups.entry(key(item)).or_default().push(value(item));
    }

    groups
        .into_iter()
        .map(|(group, mut values)| {
            values.sort_by(|a, b| b.total_cmp(a));
            values.truncate(k);
            let sum: f64 = values.iter().sum();
            (group, sum / values.len() as f64, values.len())
        })
        .collect()
}

/// Per-region mean GDP of the region's top `k` countries.
///
/// Countries without a region form their own group, ordered first.
pub fn top_k_average_by_region(records: &[MergedRecord], k: usize) -> Vec<RegionAverage> {
    top_k_average_by(
        records,
        k,
        |r| r.region.as_deref(),
        |r| r.gdp_billion_usd,
    )
    .into_iter()
    .map(|(region, average, members)| RegionAverage {
        region: region.map(str::to_string),
        average,
        members,
    })
    .collect()
}
