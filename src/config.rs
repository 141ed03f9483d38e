use crate::constants;
use crate::error::{EtlError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Run configuration, passed explicitly into the pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub sources: SourcesConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    pub report: ReportConfig,
    /// JSON object of country renames; the built-in table is used when unset
    pub mapping_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub gdp_url: String,
    pub region_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub json_path: PathBuf,
    pub db_path: PathBuf,
    pub table_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file_name: String,
    /// Write the log file as JSON lines instead of plain text
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub gdp_threshold: f64,
    pub top_k: usize,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            sources: SourcesConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            report: ReportConfig::default(),
            mapping_file: None,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            gdp_url: constants::GDP_URL.to_string(),
            region_url: constants::REGION_URL.to_string(),
            timeout_secs: 30,
            user_agent: constants::USER_AGENT.to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_path: PathBuf::from(constants::DEFAULT_JSON_PATH),
            db_path: PathBuf::from(constants::DEFAULT_DB_PATH),
            table_name: constants::DEFAULT_TABLE_NAME.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(constants::DEFAULT_LOG_DIR),
            file_name: constants::DEFAULT_LOG_FILE.to_string(),
            json: false,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            gdp_threshold: constants::DEFAULT_GDP_THRESHOLD,
            top_k: constants::DEFAULT_TOP_K,
        }
    }
}

impl EtlConfig {
    /// Load from an explicit path, else `gdp_etl.toml` if present, else defaults.
    /// Environment overrides (including `.env`) are applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(constants::DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        dotenv::dotenv().ok();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: EtlConfig = toml::from_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GDP_ETL_JSON_PATH").filter(|v| !v.trim().is_empty()) {
            self.output.json_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("GDP_ETL_DB_PATH").filter(|v| !v.trim().is_empty()) {
            self.output.db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("GDP_ETL_LOG_DIR").filter(|v| !v.trim().is_empty()) {
            self.logging.dir = PathBuf::from(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.report.top_k == 0 {
            return Err(EtlError::Config("report.top_k must be at least 1".into()));
        }
        let threshold = self.report.gdp_threshold;
        if threshold.is_nan() || threshold < 0.0 {
            return Err(EtlError::Config(format!(
                "report.gdp_threshold must be a non-negative number, got {}",
                self.report.gdp_threshold
            )));
        }
        if !is_sql_identifier(&self.output.table_name) {
            return Err(EtlError::Config(format!(
                "output.table_name {:?} is not a plain SQL identifier",
                self.output.table_name
            )));
        }
        Ok(())
    }
}

/// Letters, digits and underscores, not starting with a digit
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = EtlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.output.table_name, "Countries_by_GDP");
        assert_eq!(config.report.top_k, 5);
        assert_eq!(config.report.gdp_threshold, 100.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: EtlConfig = toml::from_str(
            r#"
            mapping_file = "data/countries.json"

            [output]
            db_path = "/tmp/economies.db"

            [report]
            top_k = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.output.db_path, PathBuf::from("/tmp/economies.db"));
        assert_eq!(config.output.table_name, "Countries_by_GDP");
        assert_eq!(config.report.top_k, 3);
        assert_eq!(config.report.gdp_threshold, 100.0);
        assert_eq!(config.mapping_file, Some(PathBuf::from("data/countries.json")));
        assert_eq!(config.sources.gdp_url, constants::GDP_URL);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GDP_ETL_DB_PATH", "/data/world.db"),
            ("GDP_ETL_LOG_DIR", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = EtlConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.output.db_path, PathBuf::from("/data/world.db"));
        assert_eq!(config.logging.dir, PathBuf::from(constants::DEFAULT_LOG_DIR));
        assert_eq!(config.output.json_path, PathBuf::from(constants::DEFAULT_JSON_PATH));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EtlConfig::default();
        config.report.top_k = 0;
        assert!(matches!(config.validate(), Err(EtlError::Config(_))));

        let mut config = EtlConfig::default();
        config.report.gdp_threshold = f64::NAN;
        assert!(matches!(config.validate(), Err(EtlError::Config(_))));

        let mut config = EtlConfig::default();
        config.output.table_name = "gdp; DROP TABLE x".to_string();
        assert!(matches!(config.validate(), Err(EtlError::Config(_))));
    }

    #[test]
    fn test_sql_identifier() {
        assert!(is_sql_identifier("Countries_by_GDP"));
        assert!(is_sql_identifier("_t1"));
        assert!(!is_sql_identifier("1table"));
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier("a-b"));
    }
}
