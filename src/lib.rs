pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod types;

pub use config::EtlConfig;
pub use error::{EtlError, Result};
pub use pipeline::{Pipeline, PipelineSummary, RunOptions};
pub use types::{GdpRecord, MergedRecord, RegionAverage, RegionRecord};
