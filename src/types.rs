use serde::{Deserialize, Serialize};
use std::fmt;

/// A GDP table row as extracted, before unit conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGdpRow {
    pub country: String,
    /// Million USD, digits only once commas are stripped
    pub gdp_raw: String,
    /// Reference year, possibly with `[n]` annotations
    pub year_raw: String,
}

/// One country's GDP in billion USD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GdpRecord {
    pub country: String,
    pub gdp_billion_usd: f64,
    pub year: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub country: String,
    pub region: String,
}

/// A GDP record left-joined with its UN geoscheme region.
///
/// Field names on the wire match the persisted table columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "GDP_IN_BILLION_USD")]
    pub gdp_billion_usd: f64,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Region")]
    pub region: Option<String>,
}

/// Mean GDP of a region's top-k countries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionAverage {
    pub region: Option<String>,
    pub average: f64,
    /// Number of countries that went into the mean (at most k)
    pub members: usize,
}

/// Why an extracted table row was not turned into a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingCells { found: usize, needed: usize },
    WorldAggregate,
    NoData,
    EmptyCountry,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingCells { found, needed } => {
                write!(f, "expected {} cells, found {}", needed, found)
            }
            RejectReason::WorldAggregate => write!(f, "world aggregate row"),
            RejectReason::NoData => write!(f, "no data placeholder"),
            RejectReason::EmptyCountry => write!(f, "empty country name"),
        }
    }
}

/// Result of classifying one table row during extraction
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome<T> {
    Accepted(T),
    Rejected { row: usize, reason: RejectReason },
}

/// Accepted rows of one table plus the count of rejected ones
#[derive(Debug, Clone)]
pub struct Extracted<T> {
    pub rows: Vec<T>,
    pub rejected: usize,
}
