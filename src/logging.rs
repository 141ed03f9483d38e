use crate::config::LoggingConfig;
use crate::constants::REPORT_LOG_TARGET;
use crate::error::{EtlError, Result};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{filter_fn, Directive};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes logging with console output and a rolling log file.
///
/// The returned guard flushes the file writer on drop; hold it for the
/// lifetime of the run.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    fs::create_dir_all(&config.dir)?;

    let file_appender = tracing_appender::rolling::daily(&config.dir, &config.file_name);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let directive: Directive = "gdp_etl=info"
        .parse()
        .map_err(|e| EtlError::Config(format!("invalid log directive: {}", e)))?;
    let filter = EnvFilter::from_default_env().add_directive(directive);

    // Only one of the two file layers is Some; Option<Layer> is itself a layer
    let (json_layer, text_layer) = if config.json {
        (
            Some(fmt::layer().json().with_writer(non_blocking_writer)),
            None,
        )
    } else {
        (
            None,
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking_writer),
            ),
        )
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter_fn(|meta| shown_on_console(meta.target())));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| EtlError::Config(format!("failed to install subscriber: {}", e)))?;

    Ok(guard)
}

/// Reports are printed to stdout, so the console skips their log copy
fn shown_on_console(target: &str) -> bool {
    target != REPORT_LOG_TARGET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_output_stays_off_the_console() {
        assert!(!shown_on_console(REPORT_LOG_TARGET));
        assert!(shown_on_console("gdp_etl::report"));
        assert!(shown_on_console("gdp_etl::pipeline"));
    }
}
