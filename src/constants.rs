/// Source names used in logs, metrics and extraction errors
pub const GDP_SOURCE: &str = "gdp_nominal";
pub const REGION_SOURCE: &str = "un_geoscheme";

// Default page locations
pub const GDP_URL: &str = "https://en.wikipedia.org/wiki/List_of_countries_by_GDP_%28nominal%29";
pub const REGION_URL: &str =
    "https://en.wikipedia.org/wiki/List_of_countries_and_territories_by_the_United_Nations_geoscheme";

// Wikipedia rejects requests without a descriptive user agent
pub const USER_AGENT: &str = concat!("gdp_etl/", env!("CARGO_PKG_VERSION"));

/// Placeholder the GDP table uses for "no estimate"
pub const NO_DATA_PLACEHOLDER: &str = "—";
/// Aggregate row of the GDP table, not a country
pub const WORLD_ROW: &str = "World";

/// Header rows at the top of the GDP table
pub const GDP_HEADER_ROWS: usize = 2;
/// Header rows at the top of each region table
pub const REGION_HEADER_ROWS: usize = 1;

// Persisted artifacts
pub const DEFAULT_JSON_PATH: &str = "output/Countries_by_GDP.json";
pub const DEFAULT_DB_PATH: &str = "output/World_Economies.db";
pub const DEFAULT_TABLE_NAME: &str = "Countries_by_GDP";
pub const DEFAULT_CONFIG_FILE: &str = "gdp_etl.toml";

pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILE: &str = "etl_project_log.txt";
/// Log target for rendered reports; written to the log file but not the
/// console, which already shows them on stdout
pub const REPORT_LOG_TARGET: &str = "gdp_etl::report_output";

// Reports
pub const DEFAULT_GDP_THRESHOLD: f64 = 100.0;
pub const DEFAULT_TOP_K: usize = 5;

/// Label used when rendering the group of countries without a region
pub const NO_REGION_LABEL: &str = "(no region)";
