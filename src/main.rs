use clap::{Parser, Subcommand};
use gdp_etl::{logging, EtlConfig, Pipeline, RunOptions};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "gdp_etl")]
#[command(about = "Nominal GDP by country, joined with UN geoscheme regions")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./gdp_etl.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, transform and load, then print the reports
    Run {
        /// Read the GDP page from a saved HTML file instead of fetching it
        #[arg(long)]
        gdp_html: Option<PathBuf>,
        /// Read the UN geoscheme page from a saved HTML file instead of fetching it
        #[arg(long)]
        region_html: Option<PathBuf>,
        /// Load only; do not print or cross-check the reports
        #[arg(long)]
        skip_report: bool,
    },
    /// Print the reports from the persisted table without scraping
    Report,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = EtlConfig::load(cli.config.as_deref())?;
    let _guard = logging::init_logging(&config.logging)?;

    let pipeline = Pipeline::new(config)?;

    let outcome = match cli.command {
        Commands::Run {
            gdp_html,
            region_html,
            skip_report,
        } => {
            let options = RunOptions {
                gdp_html,
                region_html,
                skip_report,
            };
            pipeline.run(&options).await.map(|summary| {
                info!(
                    merged = summary.merged_records,
                    without_region = summary.records_without_region,
                    stored = summary.stored_rows,
                    "Run summary"
                );
                println!("\n📊 ETL run started at {}", summary.started_at.to_rfc3339());
                println!(
                    "   GDP rows: {} ({} rejected)",
                    summary.gdp_rows, summary.gdp_rows_rejected
                );
                println!(
                    "   Region rows: {} ({} rejected)",
                    summary.region_rows, summary.region_rows_rejected
                );
                println!(
                    "   Countries renamed: {} ({} duplicates dropped)",
                    summary.countries_renamed, summary.duplicate_countries
                );
                println!(
                    "   Merged records: {} ({} without region)",
                    summary.merged_records, summary.records_without_region
                );
                println!("   JSON file: {}", summary.json_path.display());
                println!(
                    "   Database: {} ({} rows)",
                    summary.db_path.display(),
                    summary.stored_rows
                );
            })
        }
        Commands::Report => pipeline.report_only().map(|_| ()),
    };

    if let Err(e) = outcome {
        error!("ETL run failed: {}", e);
        return Err(e.into());
    }
    Ok(())
}
