//! SQLite-backed relational cache of miRTarBase interactions.

mod loader;
mod models;
mod queries;
mod schema;

use camino::{Utf8Path, Utf8PathBuf};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::MirtarbaseError;

pub use loader::LoadStats;
pub use models::{Evidence, Interaction, Mirna, MtiRecord, Species, Summary, Target};
pub use schema::{
    EVIDENCE_TABLE, INTERACTION_TABLE, MIRNA_TABLE, SCHEMA_VERSION, SPECIES_TABLE, TARGET_TABLE,
};

/// Where a connection string points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    Memory,
    File(Utf8PathBuf),
}

/// Accepts `sqlite:///<path>`, `sqlite://` / `sqlite://:memory:`, `:memory:`
/// or a bare filesystem path.
pub fn parse_connection(connection: &str) -> Result<ConnectionTarget, MirtarbaseError> {
    let trimmed = connection.trim();
    if trimmed.is_empty() {
        return Err(MirtarbaseError::InvalidConnection(
            "connection string is empty".to_string(),
        ));
    }
    if trimmed == ":memory:" {
        return Ok(ConnectionTarget::Memory);
    }
    if let Some(rest) = trimmed.strip_prefix("sqlite://") {
        if rest.is_empty() || rest == ":memory:" || rest == "/:memory:" {
            return Ok(ConnectionTarget::Memory);
        }
        let Some(path) = rest.strip_prefix('/') else {
            return Err(MirtarbaseError::InvalidConnection(format!(
                "{trimmed}: sqlite connections need three slashes before the path"
            )));
        };
        return Ok(ConnectionTarget::File(Utf8PathBuf::from(path)));
    }
    if trimmed.contains("://") {
        return Err(MirtarbaseError::InvalidConnection(format!(
            "{trimmed}: only sqlite connections are supported"
        )));
    }
    Ok(ConnectionTarget::File(Utf8PathBuf::from(trimmed)))
}

pub struct Cache {
    conn: Connection,
    target: ConnectionTarget,
}

impl Cache {
    pub fn open(connection: &str) -> Result<Self, MirtarbaseError> {
        let target = parse_connection(connection)?;
        let conn = match &target {
            ConnectionTarget::Memory => Connection::open_in_memory()?,
            ConnectionTarget::File(path) => {
                if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
                    std::fs::create_dir_all(parent.as_std_path()).map_err(|err| {
                        MirtarbaseError::Filesystem(format!("create {parent}: {err}"))
                    })?;
                }
                Connection::open(path.as_std_path())?
            }
        };
        let cache = Self::with_connection(conn, target)?;
        debug!(connection = %connection, "opened cache");
        Ok(cache)
    }

    pub fn open_in_memory() -> Result<Self, MirtarbaseError> {
        Self::with_connection(Connection::open_in_memory()?, ConnectionTarget::Memory)
    }

    fn with_connection(conn: Connection, target: ConnectionTarget) -> Result<Self, MirtarbaseError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let cache = Self { conn, target };
        if cache.needs_schema_rebuild() {
            info!("rebuilding cache tables");
            cache.drop_tables()?;
        }
        cache.init_schema()?;
        Ok(cache)
    }

    pub fn connection_target(&self) -> &ConnectionTarget {
        &self.target
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        match &self.target {
            ConnectionTarget::File(path) => Some(path),
            ConnectionTarget::Memory => None,
        }
    }

    /// Drops every table and recreates them empty.
    pub fn drop_all(&self) -> Result<(), MirtarbaseError> {
        self.drop_tables()?;
        self.init_schema()?;
        info!("dropped all cache tables");
        Ok(())
    }
}
