use crate::config::SourcesConfig;
use crate::error::{EtlError, Result};
use crate::metrics::ExtractMetrics;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Where a source page comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    Remote { url: String },
    /// A page saved to disk, for offline runs and tests
    Local { path: PathBuf },
}

impl PageSource {
    pub fn describe(&self) -> String {
        match self {
            PageSource::Remote { url } => url.clone(),
            PageSource::Local { path } => path.display().to_string(),
        }
    }
}

#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load(&self, source_name: &'static str, page: &PageSource) -> Result<String>;
}

/// Fetches remote pages with reqwest and reads local pages from disk
pub struct HttpPageLoader {
    client: reqwest::Client,
}

impl HttpPageLoader {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    async fn fetch(&self, source_name: &'static str, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EtlError::extraction(source_name, format!("GET {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(EtlError::extraction(
                source_name,
                format!("GET {} returned status {}", url, response.status()),
            ));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageLoader for HttpPageLoader {
    async fn load(&self, source_name: &'static str, page: &PageSource) -> Result<String> {
        let started = Instant::now();
        let html = match page {
            PageSource::Remote { url } => self.fetch(source_name, url).await?,
            PageSource::Local { path } => tokio::fs::read_to_string(path).await.map_err(|e| {
                EtlError::extraction(
                    source_name,
                    format!("cannot read {}: {}", path.display(), e),
                )
            })?,
        };

        let elapsed = started.elapsed().as_secs_f64();
        ExtractMetrics::record_page_loaded(source_name, elapsed, html.len());
        info!(
            source = source_name,
            bytes = html.len(),
            "Loaded page from {}",
            page.describe()
        );
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_local_page() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<html><body>hello</body></html>").unwrap();

        let loader = HttpPageLoader::new(&SourcesConfig::default()).unwrap();
        let page = PageSource::Local {
            path: file.path().to_path_buf(),
        };
        let html = loader.load("test", &page).await.unwrap();
        assert!(html.contains("hello"));
    }

    #[tokio::test]
    async fn test_missing_local_page_is_extraction_error() {
        let loader = HttpPageLoader::new(&SourcesConfig::default()).unwrap();
        let page = PageSource::Local {
            path: PathBuf::from("/definitely/not/here.html"),
        };
        let err = loader.load("test", &page).await.unwrap_err();
        assert!(matches!(err, EtlError::Extraction { .. }));
    }
}
