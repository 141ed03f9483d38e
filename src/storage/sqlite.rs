use crate::config::is_sql_identifier;
use crate::error::{EtlError, Result};
use crate::types::{MergedRecord, RegionAverage};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use tracing::{debug, info};

/// The persisted country table, keyed by `Country`
pub struct CountryStore {
    conn: Connection,
    table: String,
}

impl CountryStore {
    pub fn open<P: AsRef<Path>>(db_path: P, table: &str) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        info!("Opened database {}", db_path.display());
        Self::with_connection(conn, table)
    }

    pub fn open_in_memory(table: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self> {
        // The table name is formatted into SQL text below
        if !is_sql_identifier(table) {
            return Err(EtlError::Config(format!(
                "table name {:?} is not a plain SQL identifier",
                table
            )));
        }

        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                Country            TEXT PRIMARY KEY,
                GDP_IN_BILLION_USD REAL,
                Year               TEXT,
                Region             TEXT
            );
            "#
        ))?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Insert or replace every record in one transaction.
    /// Countries missing from `records` keep their previous rows.
    pub fn upsert_all(&mut self, records: &[MergedRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO {} (Country, GDP_IN_BILLION_USD, Year, Region) VALUES (?1, ?2, ?3, ?4)",
                self.table
            ))?;
            for record in records {
                stmt.execute(params![
                    record.country,
                    record.gdp_billion_usd,
                    record.year,
                    record.region
                ])?;
            }
        }
        tx.commit()?;
        debug!("Upserted {} rows into {}", records.len(), self.table);
        Ok(records.len())
    }

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| {
                row.get(0)
            })?;
        Ok(n as usize)
    }

    pub fn get(&self, country: &str) -> Result<Option<MergedRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT Country, GDP_IN_BILLION_USD, Year, Region FROM {} WHERE Country = ?1",
            self.table
        ))?;
        let mut rows = stmt.query(params![country])?;
        if let Some(row) = rows.next()? {
            Ok(Some(merged_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// `SELECT * ... WHERE GDP >= threshold`, largest first
    pub fn gdp_at_least(&self, threshold: f64) -> Result<Vec<MergedRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT Country, GDP_IN_BILLION_USD, Year, Region FROM {}
             WHERE GDP_IN_BILLION_USD >= ?1
             ORDER BY GDP_IN_BILLION_USD DESC",
            self.table
        ))?;
        let rows = stmt.query_map(params![threshold], |row| merged_from_row(row))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Per-region mean of the top `k` GDP values, ordered by region (NULL first)
    pub fn top_k_average_by_region(&self, k: usize) -> Result<Vec<RegionAverage>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT Region, AVG(GDP_IN_BILLION_USD), COUNT(*) FROM (
                 SELECT Region, GDP_IN_BILLION_USD,
                        ROW_NUMBER() OVER (PARTITION BY Region ORDER BY GDP_IN_BILLION_USD DESC) AS row_num
                 FROM {}
             )
             WHERE row_num <= ?1
             GROUP BY Region
             ORDER BY Region",
            self.table
        ))?;
        let rows = stmt.query_map(params![k as i64], |row| {
            Ok(RegionAverage {
                region: row.get(0)?,
                average: row.get(1)?,
                members: row.get::<_, i64>(2)? as usize,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn merged_from_row(row: &Row<'_>) -> rusqlite::Result<MergedRecord> {
    Ok(MergedRecord {
        country: row.get(0)?,
        gdp_billion_usd: row.get(1)?,
        year: row.get(2)?,
        region: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::aggregate::top_k_average_by_region;

    fn merged(country: &str, gdp: f64, region: Option<&str>) -> MergedRecord {
        MergedRecord {
            country: country.to_string(),
            gdp_billion_usd: gdp,
            year: "2025".to_string(),
            region: region.map(str::to_string),
        }
    }

    #[test]
    fn test_upsert_replaces_and_keeps_absent_rows() {
        let mut store = CountryStore::open_in_memory("Countries_by_GDP").unwrap();
        store
            .upsert_all(&[
                merged("Germany", 4000.0, Some("Europe")),
                merged("Atlantis", 1.23, None),
            ])
            .unwrap();
        store
            .upsert_all(&[merged("Germany", 4744.8, Some("Europe"))])
            .unwrap();

        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.get("Germany").unwrap().unwrap().gdp_billion_usd, 4744.8);
        assert_eq!(store.get("Atlantis").unwrap().unwrap().region, None);
        assert!(store.get("Nowhere").unwrap().is_none());
    }

    #[test]
    fn test_gdp_at_least() {
        let mut store = CountryStore::open_in_memory("t").unwrap();
        store
            .upsert_all(&[
                merged("A", 150.0, Some("Europe")),
                merged("B", 99.99, Some("Europe")),
                merged("C", 100.0, None),
            ])
            .unwrap();

        let countries: Vec<_> = store
            .gdp_at_least(100.0)
            .unwrap()
            .into_iter()
            .map(|r| r.country)
            .collect();
        assert_eq!(countries, vec!["A", "C"]);
    }

    #[test]
    fn test_window_query_matches_in_memory() {
        let records = vec![
            merged("E1", 100.0, Some("Europe")),
            merged("E2", 90.0, Some("Europe")),
            merged("E3", 80.0, Some("Europe")),
            merged("E4", 70.0, Some("Europe")),
            merged("E5", 60.0, Some("Europe")),
            merged("E6", 10.0, Some("Europe")),
            merged("N1", 804.89, None),
            merged("N2", 1.23, None),
            merged("A1", 188.27, Some("Africa")),
        ];
        let mut store = CountryStore::open_in_memory("t").unwrap();
        store.upsert_all(&records).unwrap();

        let sql = store.top_k_average_by_region(5).unwrap();
        let memory = top_k_average_by_region(&records, 5);

        assert_eq!(sql.len(), 3);
        assert_eq!(sql[0].region, None);
        assert_eq!(sql[1].region.as_deref(), Some("Africa"));
        assert_eq!(sql[2].region.as_deref(), Some("Europe"));
        assert_eq!(sql[2].average, 80.0);
        assert_eq!(sql[2].members, 5);
        for (s, m) in sql.iter().zip(memory.iter()) {
            assert_eq!(s.region, m.region);
            assert_eq!(s.members, m.members);
            assert!((s.average - m.average).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_unsafe_table_name() {
        assert!(matches!(
            CountryStore::open_in_memory("t; DROP TABLE x"),
            Err(EtlError::Config(_))
        ));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("World_Economies.db");
        let store = CountryStore::open(&path, "Countries_by_GDP").unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(path.exists());
    }
}
