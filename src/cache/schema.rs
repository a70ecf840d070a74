//! Table definitions for the relational cache.

use tracing::warn;

use super::Cache;
use crate::error::MirtarbaseError;

pub const SPECIES_TABLE: &str = "mirtarbase_species";
pub const MIRNA_TABLE: &str = "mirtarbase_mirna";
pub const TARGET_TABLE: &str = "mirtarbase_target";
pub const INTERACTION_TABLE: &str = "mirtarbase_interaction";
pub const EVIDENCE_TABLE: &str = "mirtarbase_evidence";

/// Bumped whenever a table changes; older caches are dropped and recreated.
pub const SCHEMA_VERSION: i32 = 3;

impl Cache {
    pub(super) fn init_schema(&self) -> Result<(), MirtarbaseError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS mirtarbase_schema_version (
                version INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS mirtarbase_species (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                taxonomy_id TEXT
            );

            CREATE TABLE IF NOT EXISTS mirtarbase_mirna (
                id INTEGER PRIMARY KEY,
                mirtarbase_identifier TEXT NOT NULL UNIQUE,
                mirtarbase_name TEXT NOT NULL,
                mirbase_mature_id TEXT,
                mirbase_id TEXT,
                mirbase_name TEXT,
                species_id INTEGER NOT NULL REFERENCES mirtarbase_species(id)
            );
            CREATE INDEX IF NOT EXISTS idx_mirna_name ON mirtarbase_mirna(mirtarbase_name);
            CREATE INDEX IF NOT EXISTS idx_mirna_mature ON mirtarbase_mirna(mirbase_mature_id);
            CREATE INDEX IF NOT EXISTS idx_mirna_premature ON mirtarbase_mirna(mirbase_id);

            CREATE TABLE IF NOT EXISTS mirtarbase_target (
                id INTEGER PRIMARY KEY,
                entrez_identifier TEXT NOT NULL UNIQUE,
                gene_name TEXT NOT NULL,
                hgnc_symbol TEXT UNIQUE,
                hgnc_identifier TEXT UNIQUE,
                species_id INTEGER NOT NULL REFERENCES mirtarbase_species(id)
            );

            CREATE TABLE IF NOT EXISTS mirtarbase_interaction (
                id INTEGER PRIMARY KEY,
                mirtarbase_identifier TEXT NOT NULL,
                mirna_id INTEGER NOT NULL REFERENCES mirtarbase_mirna(id),
                target_id INTEGER NOT NULL REFERENCES mirtarbase_target(id),
                UNIQUE (mirtarbase_identifier, mirna_id, target_id)
            );
            CREATE INDEX IF NOT EXISTS idx_interaction_mirtarbase ON mirtarbase_interaction(mirtarbase_identifier);
            CREATE INDEX IF NOT EXISTS idx_interaction_mirna ON mirtarbase_interaction(mirna_id);
            CREATE INDEX IF NOT EXISTS idx_interaction_target ON mirtarbase_interaction(target_id);

            CREATE TABLE IF NOT EXISTS mirtarbase_evidence (
                id INTEGER PRIMARY KEY,
                experiment TEXT NOT NULL,
                support TEXT NOT NULL,
                reference TEXT NOT NULL,
                interaction_id INTEGER NOT NULL REFERENCES mirtarbase_interaction(id)
            );
            CREATE INDEX IF NOT EXISTS idx_evidence_interaction ON mirtarbase_evidence(interaction_id);
            CREATE INDEX IF NOT EXISTS idx_evidence_reference ON mirtarbase_evidence(reference);
            "#,
        )?;

        let stored: Option<i32> = self
            .conn
            .query_row(
                "SELECT version FROM mirtarbase_schema_version LIMIT 1",
                [],
                |row| row.get(0),
            )
            .ok();
        if stored.is_none() {
            self.conn.execute(
                "INSERT INTO mirtarbase_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
        }
        Ok(())
    }

    pub(super) fn needs_schema_rebuild(&self) -> bool {
        let stored: i32 = self
            .conn
            .query_row(
                "SELECT version FROM mirtarbase_schema_version LIMIT 1",
                [],
                |row| row.get(0),
            )
            .unwrap_or(SCHEMA_VERSION);
        if stored != SCHEMA_VERSION {
            warn!(stored, current = SCHEMA_VERSION, "cache schema is outdated");
        }
        stored != SCHEMA_VERSION
    }

    /// Drops every table. Evidence goes first so foreign keys never dangle.
    pub(super) fn drop_tables(&self) -> Result<(), MirtarbaseError> {
        self.conn.execute_batch(
            r#"
            DROP TABLE IF EXISTS mirtarbase_evidence;
            DROP TABLE IF EXISTS mirtarbase_interaction;
            DROP TABLE IF EXISTS mirtarbase_target;
            DROP TABLE IF EXISTS mirtarbase_mirna;
            DROP TABLE IF EXISTS mirtarbase_species;
            DROP TABLE IF EXISTS mirtarbase_schema_version;
            "#,
        )?;
        Ok(())
    }
}
