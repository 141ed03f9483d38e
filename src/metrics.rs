//! Pipeline metrics
//!
//! Emitted through the `metrics` facade. Nothing is exported unless the
//! host process installs a recorder.

macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("gdp_etl_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("gdp_etl_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;

pub struct ExtractMetrics;

impl ExtractMetrics {
    pub fn record_page_loaded(source: &'static str, duration_secs: f64, bytes: usize) {
        ::metrics::counter!(phase_metric!(counter, "extract", "pages_loaded"), "source" => source)
            .increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "extract", "page_load_seconds"), "source" => source)
            .record(duration_secs);
        ::metrics::histogram!(phase_metric!(histogram, "extract", "page_bytes"), "source" => source)
            .record(bytes as f64);
    }

    pub fn record_rows(source: &'static str, accepted: usize, rejected: usize) {
        ::metrics::counter!(phase_metric!(counter, "extract", "rows_accepted"), "source" => source)
            .increment(accepted as u64);
        ::metrics::counter!(phase_metric!(counter, "extract", "rows_rejected"), "source" => source)
            .increment(rejected as u64);
    }
}

pub struct TransformMetrics;

impl TransformMetrics {
    pub fn record_renamed(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "transform", "countries_renamed"))
            .increment(count as u64);
    }

    pub fn record_duplicates(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "transform", "duplicate_countries"))
            .increment(count as u64);
    }

    pub fn record_joined(merged: usize, without_region: usize) {
        ::metrics::counter!(phase_metric!(counter, "transform", "records_merged"))
            .increment(merged as u64);
        ::metrics::counter!(phase_metric!(counter, "transform", "records_without_region"))
            .increment(without_region as u64);
    }
}

pub struct LoadMetrics;

impl LoadMetrics {
    pub fn record_upserted(count: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "load", "rows_upserted")).increment(count as u64);
        ::metrics::histogram!(phase_metric!(histogram, "load", "upsert_seconds"))
            .record(duration_secs);
    }
}

pub fn record_run_duration(duration_secs: f64) {
    ::metrics::histogram!(phase_metric!(histogram, "pipeline", "duration_seconds"))
        .record(duration_secs);
    ::metrics::counter!(phase_metric!(counter, "pipeline", "runs")).increment(1);
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_metric_names() {
        assert_eq!(
            phase_metric!(counter, "extract", "rows_accepted"),
            "gdp_etl_extract_rows_accepted_total"
        );
        assert_eq!(
            phase_metric!(histogram, "load", "upsert_seconds"),
            "gdp_etl_load_upsert_seconds"
        );
    }
}
