use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use mirtarbase_cache::app::{App, ExportResult, FetchOptions, PopulateOptions};
use mirtarbase_cache::config::{ConfigLoader, Overrides, Settings};
use mirtarbase_cache::error::MirtarbaseError;
use mirtarbase_cache::graph::KnowledgeGraph;
use mirtarbase_cache::output::{JsonOutput, OutputMode, TextOutput};
use mirtarbase_cache::source::{HttpSourceClient, SourceClient};
use mirtarbase_cache::store::DataDir;
use mirtarbase_cache::web;

#[derive(Parser)]
#[command(name = "mirtarbase")]
#[command(about = "Download miRTarBase and keep a local relational cache of miRNA-target interactions")]
#[command(version, author)]
struct Cli {
    /// Print machine-readable JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Path to a JSON config file.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download the source spreadsheet into the data directory")]
    Fetch(FetchArgs),
    #[command(about = "Fetch, normalize and load miRTarBase into the cache")]
    Populate(PopulateArgs),
    #[command(about = "Drop every cache table")]
    Drop(DropArgs),
    #[command(about = "Print row counts of the cache")]
    Summarize(ConnectionArgs),
    #[command(about = "Export the cache as a JSON knowledge graph")]
    Export(ExportArgs),
    #[command(about = "Serve a read-only admin view of the cache")]
    Web(WebArgs),
}

#[derive(Args, Clone, Default)]
struct ConnectionArgs {
    /// Database connection, e.g. sqlite:////tmp/mirtarbase.db
    #[arg(short = 'c', long)]
    connection: Option<String>,
}

#[derive(Args)]
struct FetchArgs {
    #[arg(long)]
    force: bool,

    /// URL or local path of the spreadsheet.
    #[arg(long)]
    source: Option<String>,
}

#[derive(Args)]
struct PopulateArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Drop existing tables before loading.
    #[arg(long)]
    reset: bool,

    #[arg(long)]
    force_download: bool,

    #[arg(long)]
    source: Option<String>,
}

#[derive(Args)]
struct DropArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    yes: bool,
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Write to this file instead of stdout.
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Args)]
struct WebArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 5000)]
    port: u16,

    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<MirtarbaseError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &MirtarbaseError) -> u8 {
    match error {
        MirtarbaseError::AlreadyPopulated
        | MirtarbaseError::NotPopulated
        | MirtarbaseError::ConfigRead(_)
        | MirtarbaseError::ConfigParse(_)
        | MirtarbaseError::InvalidConnection(_) => 2,
        MirtarbaseError::FetchHttp(_) | MirtarbaseError::FetchStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    let debug = matches!(&cli.command, Commands::Web(args) if args.debug);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" })),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Fetch(args) => {
            let settings = resolve(config, None, args.source)?;
            let app = App::new(settings, HttpSourceClient::new()?);
            let options = FetchOptions { force: args.force };
            match output_mode {
                OutputMode::Json => {
                    let result = app.fetch(options, &JsonOutput)?;
                    JsonOutput::print_fetch(&result).into_diagnostic()?;
                }
                OutputMode::Text => TextOutput::print_fetch(&app.fetch(options, &TextOutput)?),
            }
            Ok(())
        }
        Commands::Populate(args) => {
            let settings = resolve(config, args.connection.connection, args.source)?;
            let app = App::new(settings, HttpSourceClient::new()?);
            let options = PopulateOptions {
                reset: args.reset,
                force_download: args.force_download,
            };
            match output_mode {
                OutputMode::Json => {
                    let result = app.populate(options, &JsonOutput)?;
                    JsonOutput::print_populate(&result).into_diagnostic()?;
                }
                OutputMode::Text => {
                    TextOutput::print_populate(&app.populate(options, &TextOutput)?)
                }
            }
            Ok(())
        }
        Commands::Drop(args) => {
            let settings = resolve(config, args.connection.connection, None)?;
            if !args.yes && !confirm(&format!("Drop all tables in {}?", settings.connection))? {
                return Ok(());
            }
            let app = App::new(settings, NopSource);
            match output_mode {
                OutputMode::Json => {
                    let result = app.drop_all(&JsonOutput)?;
                    JsonOutput::print_drop(&result).into_diagnostic()?;
                }
                OutputMode::Text => TextOutput::print_drop(&app.drop_all(&TextOutput)?),
            }
            Ok(())
        }
        Commands::Summarize(args) => {
            let settings = resolve(config, args.connection, None)?;
            let app = App::new(settings, NopSource);
            match output_mode {
                OutputMode::Json => {
                    let result = app.summarize(&JsonOutput)?;
                    JsonOutput::print_summary(&result).into_diagnostic()?;
                }
                OutputMode::Text => TextOutput::print_summary(&app.summarize(&TextOutput)?),
            }
            Ok(())
        }
        Commands::Export(args) => {
            let settings = resolve(config, args.connection.connection, None)?;
            let app = App::new(settings, NopSource);
            let graph = match output_mode {
                OutputMode::Json => app.export(&JsonOutput)?,
                OutputMode::Text => app.export(&TextOutput)?,
            };
            let value = graph.to_json();
            let Some(path) = args.output else {
                return JsonOutput::print_value(&value).into_diagnostic();
            };
            let body = serde_json::to_vec_pretty(&value).into_diagnostic()?;
            DataDir::write_bytes_atomic(camino::Utf8Path::new(&path), &body)?;
            let result = ExportResult {
                nodes: graph.number_of_nodes(),
                edges: graph.number_of_edges(),
            };
            match output_mode {
                OutputMode::Json => JsonOutput::print_export(&result).into_diagnostic()?,
                OutputMode::Text => TextOutput::print_export(&result, &path),
            }
            Ok(())
        }
        Commands::Web(args) => {
            let settings = resolve(config, args.connection.connection, None)?;
            let app = App::new(settings, NopSource);
            let cache = app.open_cache()?;
            web::serve(
                cache,
                app.settings().connection.clone(),
                &args.host,
                args.port,
            )?;
            Ok(())
        }
    }
}

fn resolve(
    config: Option<&str>,
    connection: Option<String>,
    source: Option<String>,
) -> Result<Settings, MirtarbaseError> {
    ConfigLoader::resolve(config, Overrides { connection, source })
}

fn confirm(prompt: &str) -> miette::Result<bool> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt} [y/N] ").into_diagnostic()?;
    stderr.flush().into_diagnostic()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer).into_diagnostic()?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

struct NopSource;

impl SourceClient for NopSource {
    fn download(&self, _url: &str, _destination: &std::path::Path) -> Result<(), MirtarbaseError> {
        Err(MirtarbaseError::FetchHttp(
            "source client not configured".to_string(),
        ))
    }
}
