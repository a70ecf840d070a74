use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::MirtarbaseError;

pub const HOME_ENV: &str = "MIRTARBASE_HOME";

const SOURCE_FILE: &str = "miRTarBase_MTI.xlsx";
const HGNC_FILE: &str = "hgnc_complete_set.txt";
const DATABASE_FILE: &str = "mirtarbase.db";

/// Layout of the user-level data directory.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: Utf8PathBuf,
}

impl DataDir {
    pub fn new() -> Result<Self, MirtarbaseError> {
        if let Ok(home) = std::env::var(HOME_ENV) {
            if !home.trim().is_empty() {
                return Ok(Self::new_with_root(Utf8PathBuf::from(home.trim())));
            }
        }

        let root = BaseDirs::new()
            .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.data_dir().join("mirtarbase")).ok())
            .ok_or_else(|| {
                MirtarbaseError::Filesystem("unable to resolve data directory".to_string())
            })?;
        Ok(Self { root })
    }

    pub fn new_with_root(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn source_path(&self) -> Utf8PathBuf {
        self.root.join(SOURCE_FILE)
    }

    pub fn hgnc_path(&self) -> Utf8PathBuf {
        self.root.join(HGNC_FILE)
    }

    pub fn xref_dir(&self) -> Utf8PathBuf {
        self.root.join("xrefs")
    }

    pub fn database_path(&self) -> Utf8PathBuf {
        self.root.join(DATABASE_FILE)
    }

    pub fn default_connection(&self) -> String {
        format!("sqlite:///{}", self.database_path())
    }

    /// Sidecar written next to a downloaded file.
    pub fn metadata_path(path: &Utf8Path) -> Utf8PathBuf {
        path.with_extension("json")
    }

    pub fn ensure_root(&self) -> Result<(), MirtarbaseError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| MirtarbaseError::Filesystem(err.to_string()))
    }

    pub fn write_metadata(path: &Utf8Path, metadata: &Metadata) -> Result<(), MirtarbaseError> {
        let content = serde_json::to_vec_pretty(metadata)
            .map_err(|err| MirtarbaseError::Filesystem(err.to_string()))?;
        Self::write_bytes_atomic(path, &content)
    }

    pub fn read_metadata(path: &Utf8Path) -> Result<Option<Metadata>, MirtarbaseError> {
        if !path.as_std_path().exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| MirtarbaseError::Filesystem(err.to_string()))?;
        let metadata = serde_json::from_str(&content)
            .map_err(|err| MirtarbaseError::Filesystem(err.to_string()))?;
        Ok(Some(metadata))
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), MirtarbaseError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| MirtarbaseError::Filesystem(err.to_string()))?;
        }
        let tmp_path = path.with_extension("tmp");
        fs::write(tmp_path.as_std_path(), content)
            .map_err(|err| MirtarbaseError::Filesystem(err.to_string()))?;
        fs::rename(tmp_path.as_std_path(), path.as_std_path())
            .map_err(|err| MirtarbaseError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub url: String,
    pub downloaded_at: String,
    pub tool: String,
    pub resolved_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let dir = DataDir::new_with_root(Utf8PathBuf::from("/data/mirtarbase"));
        assert!(dir.source_path().ends_with("miRTarBase_MTI.xlsx"));
        assert!(dir.xref_dir().ends_with("xrefs"));
        assert_eq!(
            DataDir::metadata_path(&dir.source_path()),
            Utf8PathBuf::from("/data/mirtarbase/miRTarBase_MTI.json")
        );
    }
}
