mod common;

use std::path::Path;
use std::sync::Mutex;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use mirtarbase_cache::error::MirtarbaseError;
use mirtarbase_cache::source::{FetchAction, Fetcher, SourceClient};
use mirtarbase_cache::store::DataDir;

use common::tsv_fixture;

const REMOTE: &str = "https://example.org/cache/download/6.1/miRTarBase_MTI.xlsx";

#[derive(Default)]
struct MockSource {
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl SourceClient for MockSource {
    fn download(&self, url: &str, destination: &Path) -> Result<(), MirtarbaseError> {
        self.calls.lock().unwrap().push(url.to_string());
        std::fs::copy(tsv_fixture().as_std_path(), destination)
            .map_err(|err| MirtarbaseError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

struct FailingSource;

impl SourceClient for FailingSource {
    fn download(&self, _url: &str, _destination: &Path) -> Result<(), MirtarbaseError> {
        Err(MirtarbaseError::FetchStatus {
            status: 503,
            message: "unavailable".to_string(),
        })
    }
}

fn temp_data_dir() -> (tempfile::TempDir, DataDir) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().join("data")).unwrap();
    (temp, DataDir::new_with_root(root))
}

#[test]
fn download_then_reuse() {
    let (_temp, data_dir) = temp_data_dir();
    let client = MockSource::default();
    let fetcher = Fetcher::new(&client, data_dir.clone(), REMOTE);

    let first = fetcher.ensure_local_copy(false).unwrap();
    assert_eq!(first.action, FetchAction::Download);
    assert_eq!(first.path, data_dir.root().join("miRTarBase_MTI.xlsx"));
    assert!(first.path.as_std_path().is_file());

    let second = fetcher.ensure_local_copy(false).unwrap();
    assert_eq!(second.action, FetchAction::Cache);
    assert_eq!(client.calls(), 1);

    let forced = fetcher.ensure_local_copy(true).unwrap();
    assert_eq!(forced.action, FetchAction::Download);
    assert_eq!(client.calls(), 2);
}

#[test]
fn download_writes_metadata() {
    let (_temp, data_dir) = temp_data_dir();
    let fetcher = Fetcher::new(MockSource::default(), data_dir, REMOTE);
    let outcome = fetcher.ensure_local_copy(false).unwrap();

    let metadata = DataDir::read_metadata(&DataDir::metadata_path(&outcome.path))
        .unwrap()
        .unwrap();
    assert_eq!(metadata.url, REMOTE);
    assert_eq!(metadata.resolved_path, outcome.path.to_string());
    assert!(metadata.tool.starts_with("mirtarbase-cache/"));
}

#[test]
fn local_source_is_used_in_place() {
    let (_temp, data_dir) = temp_data_dir();
    let client = MockSource::default();
    let fetcher = Fetcher::new(&client, data_dir.clone(), tsv_fixture().to_string());

    let outcome = fetcher.ensure_local_copy(true).unwrap();
    assert_eq!(outcome.action, FetchAction::Local);
    assert_eq!(outcome.path, tsv_fixture());
    assert_eq!(client.calls(), 0);

    let file_url = Fetcher::new(&client, data_dir, format!("file://{}", tsv_fixture()));
    assert_eq!(file_url.local_path(), tsv_fixture());
}

#[test]
fn missing_local_source() {
    let (temp, data_dir) = temp_data_dir();
    let missing = temp.path().join("nope.tsv");
    let fetcher = Fetcher::new(MockSource::default(), data_dir, missing.to_string_lossy().into_owned());
    let err = fetcher.ensure_local_copy(false).unwrap_err();
    assert_matches!(err, MirtarbaseError::Filesystem(message) if message.contains("nope.tsv"));
}

#[test]
fn failed_download_leaves_nothing_behind() {
    let (_temp, data_dir) = temp_data_dir();
    let fetcher = Fetcher::new(FailingSource, data_dir.clone(), REMOTE);
    let err = fetcher.ensure_local_copy(false).unwrap_err();
    assert_matches!(err, MirtarbaseError::FetchStatus { status: 503, .. });
    assert!(!fetcher.local_path().as_std_path().exists());
}

#[test]
fn hgnc_download_goes_to_its_own_file() {
    let (_temp, data_dir) = temp_data_dir();
    let client = MockSource::default();
    let fetcher = Fetcher::new(&client, data_dir.clone(), REMOTE);
    let outcome = fetcher
        .ensure_hgnc_copy("https://example.org/hgnc_complete_set.txt", false)
        .unwrap();
    assert_eq!(outcome.action, FetchAction::Download);
    assert_eq!(outcome.path, data_dir.hgnc_path());
}

#[test]
fn outcome_serializes_path_as_text() {
    let (_temp, data_dir) = temp_data_dir();
    let fetcher = Fetcher::new(MockSource::default(), data_dir, tsv_fixture().to_string());
    let outcome = fetcher.ensure_local_copy(false).unwrap();

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["path"], tsv_fixture().as_str());
    assert_eq!(value["action"], "local");
}
