use crate::apis::{cell_texts, selector, TableParser};
use crate::constants::{GDP_HEADER_ROWS, GDP_SOURCE, NO_DATA_PLACEHOLDER, WORLD_ROW};
use crate::error::{EtlError, Result};
use crate::types::{RawGdpRow, RejectReason, RowOutcome};
use scraper::Html;
use tracing::{info, warn};

const GDP_CELLS: usize = 3;

/// Parses the first `wikitable` of the nominal GDP page.
///
/// Cell 0 is the country, cell 1 the IMF figure in million USD and cell 2
/// its reference year.
#[derive(Debug, Default, Clone, Copy)]
pub struct GdpTableParser;

impl GdpTableParser {
    pub fn new() -> Self {
        Self
    }

    /// Decide whether one row's cell texts become a raw GDP row
    pub fn classify(row: usize, cells: Vec<String>) -> RowOutcome<RawGdpRow> {
        if cells.len() < GDP_CELLS {
            return RowOutcome::Rejected {
                row,
                reason: RejectReason::MissingCells {
                    found: cells.len(),
                    needed: GDP_CELLS,
                },
            };
        }

        let mut cells = cells.into_iter().map(|c| c.replace(',', ""));
        let country = cells.next().unwrap_or_default();
        let gdp_raw = cells.next().unwrap_or_default();
        let year_raw = cells.next().unwrap_or_default();

        if country == WORLD_ROW {
            return RowOutcome::Rejected {
                row,
                reason: RejectReason::WorldAggregate,
            };
        }
        if gdp_raw == NO_DATA_PLACEHOLDER {
            return RowOutcome::Rejected {
                row,
                reason: RejectReason::NoData,
            };
        }
        if country.is_empty() {
            return RowOutcome::Rejected {
                row,
                reason: RejectReason::EmptyCountry,
            };
        }

        RowOutcome::Accepted(RawGdpRow {
            country,
            gdp_raw,
            year_raw,
        })
    }
}

impl TableParser for GdpTableParser {
    type Row = RawGdpRow;

    fn source_name(&self) -> &'static str {
        GDP_SOURCE
    }

    fn parse(&self, html: &str) -> Result<Vec<RowOutcome<RawGdpRow>>> {
        let document = Html::parse_document(html);
        let table_selector = selector(GDP_SOURCE, "table.wikitable")?;
        let tr = selector(GDP_SOURCE, "tr")?;
        let td = selector(GDP_SOURCE, "td")?;

        let table = document
            .select(&table_selector)
            .next()
            .ok_or_else(|| EtlError::extraction(GDP_SOURCE, "no wikitable found on page"))?;

        let outcomes: Vec<_> = table
            .select(&tr)
            .enumerate()
            .skip(GDP_HEADER_ROWS)
            .map(|(i, row)| Self::classify(i, cell_texts(&row, &td)))
            .collect();

        if outcomes.is_empty() {
            warn!("GDP table has no data rows - the page structure may have changed");
        }
        info!("Parsed {} GDP table rows", outcomes.len());
        Ok(outcomes)
    }
}
