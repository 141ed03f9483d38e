// Extract, transform, load and report, in one pass per run

pub mod processing;

use crate::apis::{GdpTableParser, HttpPageLoader, PageLoader, PageSource, RegionTableParser, TableParser};
use crate::config::EtlConfig;
use crate::error::Result;
use crate::metrics::{self, ExtractMetrics, LoadMetrics, TransformMetrics};
use crate::report::Report;
use crate::storage::{CountryStore, StagedJson};
use crate::types::{Extracted, MergedRecord};
use chrono::{DateTime, Utc};
use processing::{BuiltinMapping, JsonFileMapping, NameMapping, NameMappingSource};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Per-run choices that are not part of the configuration file
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Read the GDP page from disk instead of fetching it
    pub gdp_html: Option<PathBuf>,
    /// Read the region page from disk instead of fetching it
    pub region_html: Option<PathBuf>,
    pub skip_report: bool,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub started_at: DateTime<Utc>,
    pub gdp_rows: usize,
    pub gdp_rows_rejected: usize,
    pub region_rows: usize,
    pub region_rows_rejected: usize,
    pub countries_renamed: usize,
    /// Rows dropped because an earlier row already had the same country
    pub duplicate_countries: usize,
    pub merged_records: usize,
    pub records_without_region: usize,
    pub json_path: PathBuf,
    pub db_path: PathBuf,
    pub stored_rows: usize,
}

pub struct Pipeline<L: PageLoader = HttpPageLoader> {
    config: EtlConfig,
    loader: L,
}

impl Pipeline<HttpPageLoader> {
    pub fn new(config: EtlConfig) -> Result<Self> {
        let loader = HttpPageLoader::new(&config.sources)?;
        Ok(Self { config, loader })
    }
}

impl<L: PageLoader> Pipeline<L> {
    pub fn with_loader(config: EtlConfig, loader: L) -> Self {
        Self { config, loader }
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    fn load_mapping(&self) -> Result<NameMapping> {
        match &self.config.mapping_file {
            Some(path) => JsonFileMapping { path: path.clone() }.load(),
            None => BuiltinMapping.load(),
        }
    }

    async fn extract<P: TableParser>(
        &self,
        parser: &P,
        page: &PageSource,
    ) -> Result<Extracted<P::Row>> {
        let html = self.loader.load(parser.source_name(), page).await?;
        let extracted = parser.extract(&html)?;
        ExtractMetrics::record_rows(parser.source_name(), extracted.rows.len(), extracted.rejected);
        info!(
            source = parser.source_name(),
            "✅ Extracted {} rows ({} rejected)",
            extracted.rows.len(),
            extracted.rejected
        );
        Ok(extracted)
    }

    /// Run extract, transform and load, then the reports unless skipped.
    ///
    /// Nothing is written unless every earlier stage succeeded; the SQL load
    /// is one transaction and the JSON file only replaces the previous one
    /// after that transaction commits.
    #[instrument(skip_all)]
    pub async fn run(&self, options: &RunOptions) -> Result<PipelineSummary> {
        let started_at = Utc::now();
        let t_run = Instant::now();
        info!("🚀 ETL run started");

        info!("-----Extract-----");
        let gdp_page = page_source(&options.gdp_html, &self.config.sources.gdp_url);
        let region_page = page_source(&options.region_html, &self.config.sources.region_url);
        let gdp = self.extract(&GdpTableParser::new(), &gdp_page).await?;
        let regions = self.extract(&RegionTableParser::new(), &region_page).await?;

        info!("-----Transform-----");
        let mapping = self.load_mapping()?;
        let records = processing::transform(&gdp.rows)?;
        let (records, renamed) = processing::normalize(records, &mapping);
        TransformMetrics::record_renamed(renamed);
        info!("Renamed {} countries using {} mapping entries", renamed, mapping.len());
        let (records, duplicates) = processing::drop_duplicate_countries(records);
        TransformMetrics::record_duplicates(duplicates.len());
        if !duplicates.is_empty() {
            warn!(
                "Dropped {} rows whose country was already present after renaming: {}",
                duplicates.len(),
                duplicates.join(", ")
            );
        }

        let merged = processing::join(&records, &regions.rows);
        let without_region: Vec<&str> = merged
            .iter()
            .filter(|m| m.region.is_none())
            .map(|m| m.country.as_str())
            .collect();
        TransformMetrics::record_joined(merged.len(), without_region.len());
        if !without_region.is_empty() {
            warn!(
                "{} countries have no region: {}",
                without_region.len(),
                without_region.join(", ")
            );
        }

        info!("-----Load-----");
        let (json_path, stored_rows) = self.load(&merged)?;
        info!("💾 Saved {} records to {}", merged.len(), json_path.display());

        let summary = PipelineSummary {
            started_at,
            gdp_rows: gdp.rows.len(),
            gdp_rows_rejected: gdp.rejected,
            region_rows: regions.rows.len(),
            region_rows_rejected: regions.rejected,
            countries_renamed: renamed,
            duplicate_countries: duplicates.len(),
            merged_records: merged.len(),
            records_without_region: without_region.len(),
            json_path,
            db_path: self.config.output.db_path.clone(),
            stored_rows,
        };
        info!("✅ ETL run finished");

        if !options.skip_report {
            self.report(&merged)?;
        }

        metrics::record_run_duration(t_run.elapsed().as_secs_f64());
        Ok(summary)
    }

    /// Stage JSON, upsert into SQLite, then publish the JSON.
    /// Returns the JSON path and the table's row count afterwards.
    fn load(&self, merged: &[MergedRecord]) -> Result<(PathBuf, usize)> {
        let output = &self.config.output;
        let staged = StagedJson::stage(&output.json_path, merged)?;

        let t_upsert = Instant::now();
        let mut store = CountryStore::open(&output.db_path, &output.table_name)?;
        let upserted = store.upsert_all(merged)?;
        LoadMetrics::record_upserted(upserted, t_upsert.elapsed().as_secs_f64());
        info!("💾 Upserted {} rows into {}", upserted, store.table());

        let json_path = staged.commit()?;
        Ok((json_path, store.count()?))
    }

    /// Build both reports from memory and from the persisted table, check
    /// they agree and print them
    fn report(&self, merged: &[MergedRecord]) -> Result<()> {
        let output = &self.config.output;
        let store = CountryStore::open(&output.db_path, &output.table_name)?;

        let in_memory = Report::from_records(merged, &self.config.report);
        let sql = Report::from_store(&store, &self.config.report)?;

        in_memory.print("in-memory");
        sql.print("SQL");
        Report::cross_check(&in_memory, &sql)
    }

    /// Print the reports straight from the persisted table
    pub fn report_only(&self) -> Result<Report> {
        let output = &self.config.output;
        let store = CountryStore::open(&output.db_path, &output.table_name)?;
        if store.count()? == 0 {
            warn!(
                "{} in {} is empty; run the pipeline first",
                store.table(),
                output.db_path.display()
            );
        }
        let sql = Report::from_store(&store, &self.config.report)?;
        sql.print("SQL");
        Ok(sql)
    }
}

fn page_source(local: &Option<PathBuf>, url: &str) -> PageSource {
    match local {
        Some(path) => PageSource::Local { path: path.clone() },
        None => PageSource::Remote {
            url: url.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_source_prefers_local_file() {
        let local = Some(PathBuf::from("saved/gdp.html"));
        assert_eq!(
            page_source(&local, "https://example.org"),
            PageSource::Local {
                path: PathBuf::from("saved/gdp.html")
            }
        );
        assert_eq!(
            page_source(&None, "https://example.org"),
            PageSource::Remote {
                url: "https://example.org".into()
            }
        );
    }
}
