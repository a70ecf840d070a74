use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum MirtarbaseError {
    #[error("download request failed: {0}")]
    #[diagnostic(help("check network access or pass a local file with --source"))]
    FetchHttp(String),

    #[error("download returned status {status}: {message}")]
    FetchStatus { status: u16, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid connection string: {0}")]
    InvalidConnection(String),

    #[error("unable to read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("unable to read cross-reference table: {0}")]
    CrossReference(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("transaction rolled back after {elapsed_ms} ms: {message}")]
    Transaction { elapsed_ms: u128, message: String },

    #[error("cache is already populated")]
    #[diagnostic(help("run `mirtarbase drop` or pass --reset to rebuild it"))]
    AlreadyPopulated,

    #[error("cache is empty")]
    #[diagnostic(help("run `mirtarbase populate` first"))]
    NotPopulated,

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl From<rusqlite::Error> for MirtarbaseError {
    fn from(err: rusqlite::Error) -> Self {
        MirtarbaseError::Database(err.to_string())
    }
}
