pub mod gdp_table;
pub mod page;
pub mod un_geoscheme;

pub use gdp_table::GdpTableParser;
pub use page::{HttpPageLoader, PageLoader, PageSource};
pub use un_geoscheme::RegionTableParser;

use crate::error::{EtlError, Result};
use crate::types::{Extracted, RowOutcome};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::debug;

static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").unwrap());
static BRACKETED_OR_PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[.*?\]|\(.*?\)").unwrap());

/// Turns one scraped HTML page into classified rows
pub trait TableParser {
    type Row;

    fn source_name(&self) -> &'static str;

    fn parse(&self, html: &str) -> Result<Vec<RowOutcome<Self::Row>>>;

    /// Parse and keep the accepted rows, logging each rejection
    fn extract(&self, html: &str) -> Result<Extracted<Self::Row>> {
        let mut rows = Vec::new();
        let mut rejected = 0;
        for outcome in self.parse(html)? {
            match outcome {
                RowOutcome::Accepted(row) => rows.push(row),
                RowOutcome::Rejected { row, reason } => {
                    debug!(source = self.source_name(), row, "Skipping row: {}", reason);
                    rejected += 1;
                }
            }
        }
        Ok(Extracted { rows, rejected })
    }
}

/// Drop `[n]` footnote markers and trim
pub fn strip_annotations(text: &str) -> String {
    BRACKETED.replace_all(text, "").trim().to_string()
}

/// Drop `[n]` markers and `(...)` qualifiers and trim
pub fn strip_annotations_and_qualifiers(text: &str) -> String {
    BRACKETED_OR_PARENTHESIZED
        .replace_all(text, "")
        .trim()
        .to_string()
}

pub(crate) fn selector(source_name: &str, css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| EtlError::extraction(source_name, format!("bad selector {:?}: {:?}", css, e)))
}

/// Trimmed text of every `td` in a row
pub(crate) fn cell_texts(row: &ElementRef, td: &Selector) -> Vec<String> {
    row.select(td)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_annotations() {
        assert_eq!(strip_annotations("2025[1]"), "2025");
        assert_eq!(strip_annotations(" 2024 [n 1][2] "), "2024");
        assert_eq!(strip_annotations("2023"), "2023");
    }

    #[test]
    fn test_strip_annotations_and_qualifiers() {
        assert_eq!(
            strip_annotations_and_qualifiers("Bolivia (Plurinational State of)[a]"),
            "Bolivia"
        );
        assert_eq!(strip_annotations_and_qualifiers("Kenya"), "Kenya");
    }
}
