use std::io::{self, Write};

use serde::Serialize;
use tracing::info;

use crate::app::{
    DropResult, ExportResult, FetchResult, PopulateResult, ProgressEvent, ProgressSink,
    SummaryResult,
};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

/// Machine-readable output on stdout; progress is silent.
pub struct JsonOutput;

impl JsonOutput {
    pub fn print_fetch(result: &FetchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_populate(result: &PopulateResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_drop(result: &DropResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_summary(result: &SummaryResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_export(result: &ExportResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_value(value: &serde_json::Value) -> io::Result<()> {
        Self::print_json(value)
    }

    fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Human-readable output; progress goes to the log.
pub struct TextOutput;

impl TextOutput {
    pub fn print_fetch(result: &FetchResult) {
        println!(
            "source: {} ({})",
            result.source.path,
            result.source.action.as_str()
        );
        if let Some(hgnc) = &result.hgnc {
            println!("hgnc:   {} ({})", hgnc.path, hgnc.action.as_str());
        }
    }

    pub fn print_populate(result: &PopulateResult) {
        println!("populated {}", result.connection);
        println!(
            "  rows: {} kept, {} dropped",
            result.rows, result.dropped_rows
        );
        println!("  species:      {}", result.loaded.species);
        println!("  mirnas:       {}", result.loaded.mirnas);
        println!("  targets:      {}", result.loaded.targets);
        println!("  interactions: {}", result.loaded.interactions);
        println!("  evidences:    {}", result.loaded.evidences);
        println!("  took {:.2}s", result.total_ms as f64 / 1000.0);
    }

    pub fn print_drop(result: &DropResult) {
        if result.dropped {
            println!("dropped all tables in {}", result.connection);
        } else {
            println!("{} was already empty", result.connection);
        }
    }

    pub fn print_summary(result: &SummaryResult) {
        println!("{}", result.connection);
        println!("  mirnas:       {}", result.summary.mirnas);
        println!("  targets:      {}", result.summary.targets);
        println!("  species:      {}", result.summary.species);
        println!("  interactions: {}", result.summary.interactions);
        println!("  evidences:    {}", result.summary.evidences);
    }

    pub fn print_export(result: &ExportResult, path: &str) {
        println!(
            "wrote {} nodes and {} edges to {path}",
            result.nodes, result.edges
        );
    }
}

impl ProgressSink for TextOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => info!(
                elapsed_ms = elapsed.as_millis() as u64,
                "{}",
                event.message
            ),
            None => info!("{}", event.message),
        }
    }
}
