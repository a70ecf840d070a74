use camino::Utf8PathBuf;

use mirtarbase_cache::store::{DataDir, Metadata};

fn temp_dir() -> (tempfile::TempDir, DataDir) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, DataDir::new_with_root(root))
}

#[test]
fn layout_paths() {
    let (_temp, dir) = temp_dir();
    assert!(dir.source_path().starts_with(dir.root()));
    assert!(dir.hgnc_path().ends_with("hgnc_complete_set.txt"));
    assert!(dir.database_path().ends_with("mirtarbase.db"));
    assert_eq!(
        dir.default_connection(),
        format!("sqlite:///{}", dir.database_path())
    );
}

#[test]
fn metadata_round_trip() {
    let (_temp, dir) = temp_dir();
    let path = DataDir::metadata_path(&dir.source_path());
    assert!(DataDir::read_metadata(&path).unwrap().is_none());

    let metadata = Metadata {
        url: "https://example.org/miRTarBase_MTI.xlsx".to_string(),
        downloaded_at: "2026-01-01T00:00:00+00:00".to_string(),
        tool: "mirtarbase-cache/test".to_string(),
        resolved_path: dir.source_path().to_string(),
    };
    DataDir::write_metadata(&path, &metadata).unwrap();

    let loaded = DataDir::read_metadata(&path).unwrap().unwrap();
    assert_eq!(loaded.url, metadata.url);
    assert_eq!(loaded.resolved_path, metadata.resolved_path);
}

#[test]
fn atomic_write_creates_parents() {
    let (_temp, dir) = temp_dir();
    let path = dir.root().join("exports").join("graph.json");
    DataDir::write_bytes_atomic(&path, b"{}").unwrap();
    assert_eq!(std::fs::read_to_string(path.as_std_path()).unwrap(), "{}");
    assert!(!path.with_extension("tmp").as_std_path().exists());
}
