use std::fs::{self, File};
use std::path::Path;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::MirtarbaseError;
use crate::store::{DataDir, Metadata};

pub trait SourceClient: Send + Sync {
    fn download(&self, url: &str, destination: &Path) -> Result<(), MirtarbaseError>;
}

impl<T: SourceClient + ?Sized> SourceClient for &T {
    fn download(&self, url: &str, destination: &Path) -> Result<(), MirtarbaseError> {
        (**self).download(url, destination)
    }
}

#[derive(Clone)]
pub struct HttpSourceClient {
    client: Client,
}

impl HttpSourceClient {
    pub fn new() -> Result<Self, MirtarbaseError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("mirtarbase-cache/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| MirtarbaseError::FetchHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| MirtarbaseError::FetchHttp(err.to_string()))?;
        Ok(Self { client })
    }
}

impl SourceClient for HttpSourceClient {
    fn download(&self, url: &str, destination: &Path) -> Result<(), MirtarbaseError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| MirtarbaseError::FetchHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "download request failed".to_string());
            return Err(MirtarbaseError::FetchStatus { status, message });
        }
        let mut file = File::create(destination)
            .map_err(|err| MirtarbaseError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| MirtarbaseError::FetchHttp(err.to_string()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchAction {
    Local,
    Cache,
    Download,
}

impl FetchAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchAction::Local => "local",
            FetchAction::Cache => "cache",
            FetchAction::Download => "download",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
    pub path: Utf8PathBuf,
    pub action: FetchAction,
    pub source: String,
}

/// Keeps a local copy of a remote table under the data directory.
pub struct Fetcher<C: SourceClient> {
    client: C,
    data_dir: DataDir,
    source: String,
}

impl<C: SourceClient> Fetcher<C> {
    pub fn new(client: C, data_dir: DataDir, source: impl Into<String>) -> Self {
        Self {
            client,
            data_dir,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Path the source resolves to, whether or not it exists yet.
    pub fn local_path(&self) -> Utf8PathBuf {
        match local_source(&self.source) {
            Some(path) => path,
            None => cached_path_for(&self.data_dir, &self.source),
        }
    }

    pub fn ensure_local_copy(&self, force: bool) -> Result<FetchOutcome, MirtarbaseError> {
        if let Some(path) = local_source(&self.source) {
            if !path.as_std_path().is_file() {
                return Err(MirtarbaseError::Filesystem(format!(
                    "source file not found: {path}"
                )));
            }
            debug!(%path, "using local source override");
            return Ok(FetchOutcome {
                path,
                action: FetchAction::Local,
                source: self.source.clone(),
            });
        }

        let destination = cached_path_for(&self.data_dir, &self.source);
        self.ensure(&self.source, destination, force)
    }

    pub fn ensure_hgnc_copy(&self, url: &str, force: bool) -> Result<FetchOutcome, MirtarbaseError> {
        if let Some(path) = local_source(url) {
            return Ok(FetchOutcome {
                path,
                action: FetchAction::Local,
                source: url.to_string(),
            });
        }
        self.ensure(url, self.data_dir.hgnc_path(), force)
    }

    fn ensure(
        &self,
        url: &str,
        destination: Utf8PathBuf,
        force: bool,
    ) -> Result<FetchOutcome, MirtarbaseError> {
        if destination.as_std_path().exists() && !force {
            debug!(path = %destination, "reusing cached download");
            return Ok(FetchOutcome {
                path: destination,
                action: FetchAction::Cache,
                source: url.to_string(),
            });
        }

        info!(url, path = %destination, "downloading");
        self.data_dir.ensure_root()?;
        let parent = destination
            .parent()
            .ok_or_else(|| MirtarbaseError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| MirtarbaseError::Filesystem(err.to_string()))?;
        let temp = tempfile::Builder::new()
            .prefix("mirtarbase-download")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| MirtarbaseError::Filesystem(err.to_string()))?;
        self.client.download(url, temp.path())?;
        temp.persist(destination.as_std_path())
            .map_err(|err| MirtarbaseError::Filesystem(err.to_string()))?;

        let metadata = Metadata {
            url: url.to_string(),
            downloaded_at: chrono::Utc::now().to_rfc3339(),
            tool: format!("mirtarbase-cache/{}", env!("CARGO_PKG_VERSION")),
            resolved_path: destination.to_string(),
        };
        DataDir::write_metadata(&DataDir::metadata_path(&destination), &metadata)?;

        Ok(FetchOutcome {
            path: destination,
            action: FetchAction::Download,
            source: url.to_string(),
        })
    }
}

fn is_remote(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("ftp://")
}

fn local_source(source: &str) -> Option<Utf8PathBuf> {
    if is_remote(source) {
        return None;
    }
    let path = source.strip_prefix("file://").unwrap_or(source);
    Some(Utf8PathBuf::from(path))
}

/// Keeps the remote file name when it has a spreadsheet extension so the
/// reader can pick the right format.
fn cached_path_for(data_dir: &DataDir, url: &str) -> Utf8PathBuf {
    let file_name = url
        .split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| {
            Utf8Path::new(name)
                .extension()
                .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "xlsx" | "csv" | "tsv" | "txt"))
                .unwrap_or(false)
        });
    match file_name {
        Some(name) => data_dir.root().join(name),
        None => data_dir.source_path(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_name_follows_url() {
        let dir = DataDir::new_with_root(Utf8PathBuf::from("/data"));
        assert_eq!(
            cached_path_for(&dir, "https://example.org/dl/miRTarBase_MTI.csv?x=1"),
            Utf8PathBuf::from("/data/miRTarBase_MTI.csv")
        );
        assert_eq!(
            cached_path_for(&dir, "https://example.org/download"),
            dir.source_path()
        );
    }

    #[test]
    fn remote_detection() {
        assert!(local_source("https://example.org/a.xlsx").is_none());
        assert_eq!(
            local_source("file:///tmp/a.tsv"),
            Some(Utf8PathBuf::from("/tmp/a.tsv"))
        );
    }
}
