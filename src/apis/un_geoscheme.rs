use crate::apis::{cell_texts, selector, strip_annotations, strip_annotations_and_qualifiers, TableParser};
use crate::constants::{REGION_HEADER_ROWS, REGION_SOURCE};
use crate::error::{EtlError, Result};
use crate::types::{RegionRecord, RejectReason, RowOutcome};
use scraper::Html;
use tracing::info;

const REGION_CELLS: usize = 4;
const REGION_COLUMN: usize = 3;

/// Parses every `wikitable` of the UN geoscheme page into country/region pairs
#[derive(Debug, Default, Clone, Copy)]
pub struct RegionTableParser;

impl RegionTableParser {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(row: usize, cells: Vec<String>) -> RowOutcome<RegionRecord> {
        if cells.len() < REGION_CELLS {
            return RowOutcome::Rejected {
                row,
                reason: RejectReason::MissingCells {
                    found: cells.len(),
                    needed: REGION_CELLS,
                },
            };
        }

        let country = strip_annotations_and_qualifiers(&cells[0]);
        if country.is_empty() {
            return RowOutcome::Rejected {
                row,
                reason: RejectReason::EmptyCountry,
            };
        }

        RowOutcome::Accepted(RegionRecord {
            country,
            region: strip_annotations(&cells[REGION_COLUMN]),
        })
    }
}

impl TableParser for RegionTableParser {
    type Row = RegionRecord;

    fn source_name(&self) -> &'static str {
        REGION_SOURCE
    }

    fn parse(&self, html: &str) -> Result<Vec<RowOutcome<RegionRecord>>> {
        let document = Html::parse_document(html);
        let table_selector = selector(REGION_SOURCE, "table.wikitable")?;
        let tr = selector(REGION_SOURCE, "tr")?;
        let td = selector(REGION_SOURCE, "td")?;

        let mut outcomes = Vec::new();
        let mut tables = 0;
        for table in document.select(&table_selector) {
            tables += 1;
            // Row numbers run across tables so log lines stay unambiguous
            let offset = outcomes.len();
            outcomes.extend(
                table
                    .select(&tr)
                    .skip(REGION_HEADER_ROWS)
                    .enumerate()
                    .map(|(i, row)| Self::classify(offset + i, cell_texts(&row, &td))),
            );
        }

        if tables == 0 {
            return Err(EtlError::extraction(REGION_SOURCE, "no wikitable found on page"));
        }
        info!("Parsed {} region rows from {} tables", outcomes.len(), tables);
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = include_str!("../../tests/resources/un_geoscheme.html");

    #[test]
    fn test_classify_strips_annotations() {
        let cells = vec![
            "Netherlands (Kingdom of the)[c]".to_string(),
            "528".to_string(),
            "NLD".to_string(),
            "Europe[b]".to_string(),
        ];
        assert_eq!(
            RegionTableParser::classify(0, cells),
            RowOutcome::Accepted(RegionRecord {
                country: "Netherlands".into(),
                region: "Europe".into(),
            })
        );
    }

    #[test]
    fn test_extract_reads_every_table() {
        let extracted = RegionTableParser::new().extract(PAGE).unwrap();

        assert_eq!(extracted.rejected, 1);
        assert_eq!(extracted.rows.len(), 21);
        assert_eq!(
            extracted.rows[0],
            RegionRecord {
                country: "United States of America".into(),
                region: "Americas".into(),
            }
        );
        assert!(extracted
            .rows
            .iter()
            .any(|r| r.country == "Côte d'Ivoire" && r.region == "Africa"));
        // Germany appears in both tables
        assert_eq!(
            extracted.rows.iter().filter(|r| r.country == "Germany").count(),
            2
        );
    }
}
