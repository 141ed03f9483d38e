use crate::error::{EtlError, Result};
use crate::types::MergedRecord;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A JSON array of merged records written beside its target but not yet
/// visible there. Dropping it without `commit` removes the temp file.
pub struct StagedJson {
    file: NamedTempFile,
    target: PathBuf,
}

impl StagedJson {
    pub fn stage<P: AsRef<Path>>(target: P, records: &[MergedRecord]) -> Result<Self> {
        let target = target.as_ref().to_path_buf();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut file = NamedTempFile::new_in(&dir)?;
        let json_content = serde_json::to_string_pretty(records)?;
        file.write_all(json_content.as_bytes())?;
        file.flush()?;
        debug!(
            "Staged {} records for {} at {}",
            records.len(),
            target.display(),
            file.path().display()
        );

        Ok(Self { file, target })
    }

    /// Atomically move the staged file onto the target path
    pub fn commit(self) -> Result<PathBuf> {
        self.file
            .persist(&self.target)
            .map_err(|e| EtlError::Io(e.error))?;
        Ok(self.target)
    }
}

/// Read back a file written by [`StagedJson`]
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<MergedRecord>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
