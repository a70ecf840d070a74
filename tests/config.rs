use std::io::Write;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use mirtarbase_cache::config::{
    Config, ConfigLoader, Environment, Overrides, default_source_url,
};
use mirtarbase_cache::error::MirtarbaseError;
use mirtarbase_cache::store::DataDir;

fn data_dir() -> DataDir {
    DataDir::new_with_root(Utf8PathBuf::from("/srv/mirtarbase"))
}

#[test]
fn argument_beats_environment_beats_file() {
    let config = Config {
        connection: Some("sqlite:////from/file.db".to_string()),
        source: Some("/from/file.xlsx".to_string()),
        ..Config::default()
    };
    let env = Environment {
        connection: Some("sqlite:////from/env.db".to_string()),
        source: None,
    };
    let overrides = Overrides {
        connection: Some("sqlite:////from/arg.db".to_string()),
        source: None,
    };

    let settings = ConfigLoader::resolve_with(overrides, env.clone(), config, data_dir());
    assert_eq!(settings.connection, "sqlite:////from/arg.db");
    assert_eq!(settings.source, "/from/file.xlsx");

    let settings =
        ConfigLoader::resolve_with(Overrides::default(), env, Config::default(), data_dir());
    assert_eq!(settings.connection, "sqlite:////from/env.db");
    assert_eq!(settings.source, default_source_url());
}

#[test]
fn defaults_without_any_input() {
    let settings = ConfigLoader::resolve_with(
        Overrides::default(),
        Environment::default(),
        Config::default(),
        data_dir(),
    );
    assert_eq!(settings.connection, "sqlite:////srv/mirtarbase/mirtarbase.db");
    assert!(settings.source.ends_with("/6.1/miRTarBase_MTI.xlsx"));
    assert_eq!(settings.xref_dir, Utf8PathBuf::from("/srv/mirtarbase/xrefs"));
}

#[test]
fn load_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"connection": "sqlite://", "hgnc_url": "https://example.org/hgnc.txt", "xref_dir": "/opt/xrefs"}}"#
    )
    .unwrap();

    let config = ConfigLoader::load(file.path().to_str()).unwrap();
    assert_eq!(config.connection.as_deref(), Some("sqlite://"));
    assert!(config.source.is_none());

    let settings = ConfigLoader::resolve_with(
        Overrides::default(),
        Environment::default(),
        config,
        data_dir(),
    );
    assert_eq!(settings.hgnc_url.as_deref(), Some("https://example.org/hgnc.txt"));
    assert_eq!(settings.xref_dir, Utf8PathBuf::from("/opt/xrefs"));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::load(path.to_str()).unwrap_err();
    assert_matches!(err, MirtarbaseError::ConfigRead(p) if p == path);
}

#[test]
fn malformed_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    let err = ConfigLoader::load(file.path().to_str()).unwrap_err();
    assert_matches!(err, MirtarbaseError::ConfigParse(_));
}
