use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Extraction failed for {source_name}: {message}")]
    Extraction {
        source_name: String,
        message: String,
    },

    #[error("Malformed GDP value {value:?} for {country}")]
    MalformedInput { country: String, value: String },

    #[error("Persistence failed: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("In-memory and SQL reports disagree: {0}")]
    ReportMismatch(String),
}

impl EtlError {
    pub fn extraction(source_name: &str, message: impl Into<String>) -> Self {
        EtlError::Extraction {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
