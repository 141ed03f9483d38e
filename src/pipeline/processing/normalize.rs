use crate::error::{EtlError, Result};
use crate::types::GdpRecord;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Renames from the GDP table's spelling to the UN geoscheme's spelling.
/// Built once per run and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMapping {
    mapping: HashMap<String, String>,
}

impl NameMapping {
    /// Rejects chains (a target that is itself another key), which would
    /// make a second pass rename again
    pub fn new(mapping: HashMap<String, String>) -> Result<Self> {
        for (from, to) in &mapping {
            if from != to && mapping.contains_key(to) {
                return Err(EtlError::Config(format!(
                    "country mapping chains {:?} -> {:?} -> {:?}",
                    from, to, mapping[to]
                )));
            }
        }
        Ok(Self { mapping })
    }

    pub fn get(&self, country: &str) -> Option<&str> {
        self.mapping.get(country).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

/// A place the country mapping can be loaded from
pub trait NameMappingSource {
    fn load(&self) -> Result<NameMapping>;
}

/// The renames the GDP and geoscheme pages are known to disagree on
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinMapping;

const BUILTIN_RENAMES: &[(&str, &str)] = &[
    ("United States", "United States of America"),
    ("United Kingdom", "United Kingdom of Great Britain and Northern Ireland"),
    ("Russia", "Russian Federation"),
    ("South Korea", "Republic of Korea"),
    ("Turkey", "Türkiye"),
    ("Taiwan", "Taiwan Province of China"),
    ("Vietnam", "Viet Nam"),
    ("Hong Kong", "China, Hong Kong Special Administrative Region"),
    ("Czech Republic", "Czechia"),
    ("Ivory Coast", "Côte d'Ivoire"),
    ("Tanzania", "United Republic of Tanzania"),
    ("DR Congo", "Democratic Republic of the Congo"),
    ("Macau", "China, Macao Special Administrative Region"),
    ("Palestine", "State of Palestine"),
    ("Moldova", "Republic of Moldova"),
    ("Brunei", "Brunei Darussalam"),
    ("Laos", "Lao People's Democratic Republic"),
    ("Cape Verde", "Cabo Verde"),
    ("East Timor", "Timor-Leste"),
    ("São Tomé and Príncipe", "Sao Tome and Principe"),
];

impl NameMappingSource for BuiltinMapping {
    fn load(&self) -> Result<NameMapping> {
        NameMapping::new(
            BUILTIN_RENAMES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        )
    }
}

/// A JSON object of `"old name": "new name"` pairs
#[derive(Debug, Clone)]
pub struct JsonFileMapping {
    pub path: PathBuf,
}

impl NameMappingSource for JsonFileMapping {
    fn load(&self) -> Result<NameMapping> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read mapping file '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        let mapping: HashMap<String, String> = serde_json::from_str(&content)?;
        debug!(
            "Loaded {} country renames from {}",
            mapping.len(),
            self.path.display()
        );
        NameMapping::new(mapping)
    }
}

/// Rename every record whose country is exactly a mapping key.
/// Returns the records and how many were renamed.
pub fn normalize(records: Vec<GdpRecord>, mapping: &NameMapping) -> (Vec<GdpRecord>, usize) {
    let mut renamed = 0;
    let records: Vec<GdpRecord> = records
        .into_iter()
        .map(|mut record| {
            if let Some(canonical) = mapping.get(&record.country) {
                debug!("Renaming {:?} to {:?}", record.country, canonical);
                record.country = canonical.to_string();
                renamed += 1;
            }
            record
        })
        .collect();
    (records, renamed)
}

/// Keep the first record for each country and return the names that
/// occurred more than once. Countries key the persisted table, so a
/// duplicate would otherwise replace its predecessor there while still
/// counting twice in memory.
pub fn drop_duplicate_countries(records: Vec<GdpRecord>) -> (Vec<GdpRecord>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    let records: Vec<GdpRecord> = records
        .into_iter()
        .filter(|record| {
            if seen.insert(record.country.clone()) {
                true
            } else {
                duplicates.push(record.country.clone());
                false
            }
        })
        .collect();
    (records, duplicates)
}
