use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::cache::{Cache, LoadStats, Summary};
use crate::config::Settings;
use crate::enrich::to_graph;
use crate::error::MirtarbaseError;
use crate::graph::{BelGraph, KnowledgeGraph};
use crate::normalize::normalize;
use crate::source::{FetchOutcome, Fetcher, SourceClient};
use crate::xref::CrossReferences;

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    pub force: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PopulateOptions {
    pub reset: bool,
    pub force_download: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub source: FetchOutcome,
    pub hgnc: Option<FetchOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PopulateResult {
    pub connection: String,
    pub source: FetchOutcome,
    pub rows: usize,
    pub dropped_rows: usize,
    pub loaded: LoadStats,
    pub normalize_ms: u64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DropResult {
    pub connection: String,
    pub dropped: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResult {
    pub connection: String,
    pub populated: bool,
    #[serde(flatten)]
    pub summary: Summary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub nodes: usize,
    pub edges: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

fn phase(sink: &dyn ProgressSink, message: String, elapsed: Option<Duration>) {
    sink.event(ProgressEvent { message, elapsed });
}

/// Orchestrates fetch, normalize and load against one configured cache.
pub struct App<C: SourceClient> {
    settings: Settings,
    client: C,
}

impl<C: SourceClient> App<C> {
    pub fn new(settings: Settings, client: C) -> Self {
        Self { settings, client }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn open_cache(&self) -> Result<Cache, MirtarbaseError> {
        Cache::open(&self.settings.connection)
    }

    fn fetcher(&self) -> Fetcher<&C> {
        Fetcher::new(
            &self.client,
            self.settings.data_dir.clone(),
            self.settings.source.clone(),
        )
    }

    pub fn fetch(
        &self,
        options: FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<FetchResult, MirtarbaseError> {
        let fetcher = self.fetcher();
        phase(sink, format!("phase=Fetch; source={}", fetcher.source()), None);
        let start = Instant::now();
        let source = fetcher.ensure_local_copy(options.force)?;
        phase(
            sink,
            format!("phase=Fetch; {} {}", source.action.as_str(), source.path),
            Some(start.elapsed()),
        );

        let hgnc = match &self.settings.hgnc_url {
            Some(url) => {
                let start = Instant::now();
                let outcome = fetcher.ensure_hgnc_copy(url, options.force)?;
                phase(
                    sink,
                    format!("phase=Fetch; hgnc {} {}", outcome.action.as_str(), outcome.path),
                    Some(start.elapsed()),
                );
                Some(outcome)
            }
            None => None,
        };

        Ok(FetchResult { source, hgnc })
    }

    pub fn populate(
        &self,
        options: PopulateOptions,
        sink: &dyn ProgressSink,
    ) -> Result<PopulateResult, MirtarbaseError> {
        let total = Instant::now();
        let mut cache = self.open_cache()?;
        let replace = cache.is_populated()?;
        if replace && !options.reset {
            return Err(MirtarbaseError::AlreadyPopulated);
        }

        let fetched = self.fetch(
            FetchOptions {
                force: options.force_download,
            },
            sink,
        )?;

        let mut xrefs = CrossReferences::from_dir(&self.settings.xref_dir)?;
        if let Some(hgnc) = &fetched.hgnc {
            xrefs.load_hgnc(&hgnc.path)?;
        }

        phase(sink, format!("phase=Normalize; {}", fetched.source.path), None);
        let start = Instant::now();
        let normalized = normalize(&fetched.source.path, &xrefs)?;
        let normalize_elapsed = start.elapsed();
        phase(
            sink,
            format!(
                "phase=Normalize; kept={} dropped={}",
                normalized.len(),
                normalized.dropped
            ),
            Some(normalize_elapsed),
        );

        let loaded = if replace {
            phase(sink, format!("phase=Reset; replacing rows={}", normalized.len()), None);
            cache.repopulate(&normalized)?
        } else {
            phase(sink, format!("phase=Load; rows={}", normalized.len()), None);
            cache.populate(&normalized)?
        };
        phase(
            sink,
            format!(
                "phase=Load; mirnas={} targets={} interactions={} evidences={}",
                loaded.mirnas, loaded.targets, loaded.interactions, loaded.evidences
            ),
            Some(Duration::from_millis(loaded.elapsed_ms)),
        );

        let total_ms = total.elapsed().as_millis() as u64;
        info!(total_ms, "populated cache");
        Ok(PopulateResult {
            connection: self.settings.connection.clone(),
            source: fetched.source,
            rows: normalized.len(),
            dropped_rows: normalized.dropped,
            loaded,
            normalize_ms: normalize_elapsed.as_millis() as u64,
            total_ms,
        })
    }

    pub fn drop_all(&self, sink: &dyn ProgressSink) -> Result<DropResult, MirtarbaseError> {
        phase(
            sink,
            format!("phase=Drop; {}", self.settings.connection),
            None,
        );
        let cache = self.open_cache()?;
        let dropped = cache.is_populated()?;
        cache.drop_all()?;
        Ok(DropResult {
            connection: self.settings.connection.clone(),
            dropped,
        })
    }

    pub fn summarize(&self, sink: &dyn ProgressSink) -> Result<SummaryResult, MirtarbaseError> {
        phase(
            sink,
            format!("phase=Summarize; {}", self.settings.connection),
            None,
        );
        let cache = self.open_cache()?;
        let summary = cache.summarize()?;
        Ok(SummaryResult {
            connection: self.settings.connection.clone(),
            populated: summary.mirnas > 0,
            summary,
        })
    }

    /// Builds the whole-cache graph. An empty cache is an error.
    pub fn export(&self, sink: &dyn ProgressSink) -> Result<BelGraph, MirtarbaseError> {
        let cache = self.open_cache()?;
        if !cache.is_populated()? {
            return Err(MirtarbaseError::NotPopulated);
        }
        phase(sink, "phase=Export; building graph".to_string(), None);
        let start = Instant::now();
        let graph = to_graph(&cache)?;
        phase(
            sink,
            format!(
                "phase=Export; nodes={} edges={}",
                graph.number_of_nodes(),
                graph.number_of_edges()
            ),
            Some(start.elapsed()),
        );
        Ok(graph)
    }
}
