mod common;

use std::path::Path;
use std::sync::Mutex;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use mirtarbase_cache::app::{App, FetchOptions, PopulateOptions, ProgressEvent, ProgressSink};
use mirtarbase_cache::config::{Config, ConfigLoader, Environment, Overrides, Settings};
use mirtarbase_cache::error::MirtarbaseError;
use mirtarbase_cache::graph::KnowledgeGraph;
use mirtarbase_cache::output::JsonOutput;
use mirtarbase_cache::source::{FetchAction, SourceClient};
use mirtarbase_cache::store::DataDir;

use common::{tsv_fixture, xref_dir};

struct OfflineSource;

impl SourceClient for OfflineSource {
    fn download(&self, url: &str, _destination: &Path) -> Result<(), MirtarbaseError> {
        Err(MirtarbaseError::FetchHttp(format!("offline: {url}")))
    }
}

#[derive(Default)]
struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.messages.lock().unwrap().push(event.message);
    }
}

fn settings(temp: &tempfile::TempDir) -> Settings {
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    ConfigLoader::resolve_with(
        Overrides {
            connection: None,
            source: Some(tsv_fixture().to_string()),
        },
        Environment::default(),
        Config {
            xref_dir: Some(xref_dir().to_string()),
            ..Config::default()
        },
        DataDir::new_with_root(root),
    )
}

fn app(temp: &tempfile::TempDir) -> App<OfflineSource> {
    App::new(settings(temp), OfflineSource)
}

#[test]
fn populate_loads_fixture() {
    let temp = tempfile::tempdir().unwrap();
    let app = app(&temp);
    let sink = RecordingSink::default();

    let result = app.populate(PopulateOptions::default(), &sink).unwrap();
    assert_eq!(result.rows, 10);
    assert_eq!(result.dropped_rows, 1);
    assert_eq!(result.source.action, FetchAction::Local);
    assert_eq!(result.loaded.mirnas, 5);
    assert_eq!(result.loaded.targets, 6);
    assert_eq!(result.loaded.species, 3);
    assert_eq!(result.loaded.interactions, 6);
    assert_eq!(result.loaded.evidences, 10);
    assert!(temp.path().join("mirtarbase.db").is_file());

    let messages = sink.messages();
    for phase in ["phase=Fetch", "phase=Normalize", "phase=Load"] {
        assert!(
            messages.iter().any(|message| message.starts_with(phase)),
            "missing {phase} in {messages:?}"
        );
    }
}

#[test]
fn populate_twice_requires_reset() {
    let temp = tempfile::tempdir().unwrap();
    let app = app(&temp);
    app.populate(PopulateOptions::default(), &JsonOutput).unwrap();

    let err = app
        .populate(PopulateOptions::default(), &JsonOutput)
        .unwrap_err();
    assert_matches!(err, MirtarbaseError::AlreadyPopulated);

    let sink = RecordingSink::default();
    let options = PopulateOptions {
        reset: true,
        ..PopulateOptions::default()
    };
    let result = app.populate(options, &sink).unwrap();
    assert_eq!(result.loaded.evidences, 10);
    assert!(sink.messages().iter().any(|m| m.starts_with("phase=Reset")));
}

#[test]
fn failed_reset_keeps_existing_cache() {
    let temp = tempfile::tempdir().unwrap();
    app(&temp)
        .populate(PopulateOptions::default(), &JsonOutput)
        .unwrap();

    let mut offline = settings(&temp);
    offline.source = "https://example.org/miRTarBase_MTI.xlsx".to_string();
    let app = App::new(offline, OfflineSource);
    let options = PopulateOptions {
        reset: true,
        ..PopulateOptions::default()
    };
    let err = app.populate(options, &JsonOutput).unwrap_err();
    assert_matches!(err, MirtarbaseError::FetchHttp(_));

    let summary = app.summarize(&JsonOutput).unwrap();
    assert_eq!(summary.summary.mirnas, 5);
    assert_eq!(summary.summary.evidences, 10);
}

#[test]
fn summarize_and_drop() {
    let temp = tempfile::tempdir().unwrap();
    let app = app(&temp);

    let empty = app.summarize(&JsonOutput).unwrap();
    assert!(!empty.populated);
    assert_eq!(empty.summary.mirnas, 0);

    app.populate(PopulateOptions::default(), &JsonOutput).unwrap();
    let summary = app.summarize(&JsonOutput).unwrap();
    assert!(summary.populated);
    assert_eq!(summary.summary.interactions, 6);
    assert_eq!(summary.connection, app.settings().connection);

    let dropped = app.drop_all(&JsonOutput).unwrap();
    assert!(dropped.dropped);
    assert_eq!(app.summarize(&JsonOutput).unwrap().summary.evidences, 0);

    let again = app.drop_all(&JsonOutput).unwrap();
    assert!(!again.dropped);
}

#[test]
fn export_requires_populated_cache() {
    let temp = tempfile::tempdir().unwrap();
    let app = app(&temp);

    assert_matches!(app.export(&JsonOutput), Err(MirtarbaseError::NotPopulated));

    app.populate(PopulateOptions::default(), &JsonOutput).unwrap();
    let graph = app.export(&JsonOutput).unwrap();
    assert_eq!(graph.number_of_nodes(), 15);
    assert_eq!(graph.number_of_edges(), 14);
}

#[test]
fn remote_source_errors_surface() {
    let temp = tempfile::tempdir().unwrap();
    let mut settings = settings(&temp);
    settings.source = "https://example.org/miRTarBase_MTI.xlsx".to_string();
    let app = App::new(settings, OfflineSource);

    let err = app
        .fetch(FetchOptions::default(), &JsonOutput)
        .unwrap_err();
    assert_matches!(err, MirtarbaseError::FetchHttp(message) if message.contains("example.org"));

    let err = app
        .populate(PopulateOptions::default(), &JsonOutput)
        .unwrap_err();
    assert_matches!(err, MirtarbaseError::FetchHttp(_));
    assert_eq!(app.summarize(&JsonOutput).unwrap().summary.mirnas, 0);
}
