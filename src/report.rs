use crate::config::ReportConfig;
use crate::constants::{NO_REGION_LABEL, REPORT_LOG_TARGET};
use crate::error::{EtlError, Result};
use crate::pipeline::processing::{filter_by_gdp_at_least, top_k_average_by_region};
use crate::storage::CountryStore;
use crate::types::{MergedRecord, RegionAverage};
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::info;

/// Relative tolerance for averages; SQLite's AVG uses compensated summation
const AVERAGE_TOLERANCE: f64 = 1e-9;
/// Differences listed in a mismatch error before truncating
const MAX_LISTED_DIFFERENCES: usize = 5;

/// The two summary reports: countries over a GDP threshold and the
/// per-region average of each region's top countries
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub threshold: f64,
    pub top_k: usize,
    pub over_threshold: Vec<MergedRecord>,
    pub region_averages: Vec<RegionAverage>,
}

impl Report {
    pub fn from_records(records: &[MergedRecord], config: &ReportConfig) -> Self {
        Self {
            threshold: config.gdp_threshold,
            top_k: config.top_k,
            over_threshold: filter_by_gdp_at_least(records, config.gdp_threshold),
            region_averages: top_k_average_by_region(records, config.top_k),
        }
    }

    pub fn from_store(store: &CountryStore, config: &ReportConfig) -> Result<Self> {
        Ok(Self {
            threshold: config.gdp_threshold,
            top_k: config.top_k,
            over_threshold: store.gdp_at_least(config.gdp_threshold)?,
            region_averages: store.top_k_average_by_region(config.top_k)?,
        })
    }

    /// Fails with `ReportMismatch` unless both reports hold the same
    /// countries (ignoring order) and the same per-region averages
    pub fn cross_check(in_memory: &Report, sql: &Report) -> Result<()> {
        let mut differences = Vec::new();

        let memory_rows: BTreeMap<&str, &MergedRecord> = in_memory
            .over_threshold
            .iter()
            .map(|r| (r.country.as_str(), r))
            .collect();
        let sql_rows: BTreeMap<&str, &MergedRecord> = sql
            .over_threshold
            .iter()
            .map(|r| (r.country.as_str(), r))
            .collect();

        for (country, record) in &memory_rows {
            match sql_rows.get(country) {
                None => differences.push(format!("{} missing from SQL result", country)),
                Some(other) if other != record => differences.push(format!(
                    "{} differs: in-memory {:?}, SQL {:?}",
                    country, record, other
                )),
                Some(_) => {}
            }
        }
        for country in sql_rows.keys() {
            if !memory_rows.contains_key(country) {
                differences.push(format!("{} only in SQL result", country));
            }
        }

        let memory_averages: BTreeMap<Option<&str>, &RegionAverage> = in_memory
            .region_averages
            .iter()
            .map(|a| (a.region.as_deref(), a))
            .collect();
        let sql_averages: BTreeMap<Option<&str>, &RegionAverage> = sql
            .region_averages
            .iter()
            .map(|a| (a.region.as_deref(), a))
            .collect();

        for (region, average) in &memory_averages {
            let label = region.unwrap_or(NO_REGION_LABEL);
            match sql_averages.get(region) {
                None => differences.push(format!("region {} missing from SQL result", label)),
                Some(other)
                    if other.members != average.members
                        || !averages_agree(other.average, average.average) =>
                {
                    differences.push(format!(
                        "region {} differs: in-memory {} over {}, SQL {} over {}",
                        label, average.average, average.members, other.average, other.members
                    ))
                }
                Some(_) => {}
            }
        }
        for region in sql_averages.keys() {
            if !memory_averages.contains_key(region) {
                differences.push(format!(
                    "region {} only in SQL result",
                    region.unwrap_or(NO_REGION_LABEL)
                ));
            }
        }

        if differences.is_empty() {
            info!("In-memory and SQL reports agree");
            return Ok(());
        }

        let total = differences.len();
        differences.truncate(MAX_LISTED_DIFFERENCES);
        let mut message = differences.join("; ");
        if total > MAX_LISTED_DIFFERENCES {
            let _ = write!(message, " (and {} more)", total - MAX_LISTED_DIFFERENCES);
        }
        Err(EtlError::ReportMismatch(message))
    }

    pub fn render(&self, label: &str) -> String {
        let mut out = String::new();

        let country_width = self
            .over_threshold
            .iter()
            .map(|r| r.country.chars().count())
            .max()
            .unwrap_or(0)
            .max("Country".len());

        let _ = writeln!(
            out,
            "-----Countries with GDP >= {} billion USD ({})-----",
            self.threshold, label
        );
        let _ = writeln!(
            out,
            "{:<cw$}  {:>12}  {:<6}  {}",
            "Country",
            "GDP (B USD)",
            "Year",
            "Region",
            cw = country_width
        );
        for record in &self.over_threshold {
            let _ = writeln!(
                out,
                "{:<cw$}  {:>12.2}  {:<6}  {}",
                record.country,
                record.gdp_billion_usd,
                record.year,
                record.region.as_deref().unwrap_or(NO_REGION_LABEL),
                cw = country_width
            );
        }

        let region_width = self
            .region_averages
            .iter()
            .map(|a| a.region.as_deref().unwrap_or(NO_REGION_LABEL).chars().count())
            .max()
            .unwrap_or(0)
            .max("Region".len());

        let _ = writeln!(
            out,
            "-----Average GDP of the top {} countries per region ({})-----",
            self.top_k, label
        );
        let _ = writeln!(
            out,
            "{:<rw$}  {:>15}  {}",
            "Region",
            "Average (B USD)",
            "Countries",
            rw = region_width
        );
        for average in &self.region_averages {
            let _ = writeln!(
                out,
                "{:<rw$}  {:>15.2}  {}",
                average.region.as_deref().unwrap_or(NO_REGION_LABEL),
                average.average,
                average.members,
                rw = region_width
            );
        }

        out
    }

    /// Write the rendered report to stdout and the log file
    pub fn print(&self, label: &str) {
        let text = self.render(label);
        println!("{}", text);
        info!(target: REPORT_LOG_TARGET, "\n{}", text);
    }
}

fn averages_agree(a: f64, b: f64) -> bool {
    (a - b).abs() <= AVERAGE_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}
