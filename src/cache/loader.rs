//! Bulk insertion of a normalized table.
//!
//! Five passes run inside one transaction: species, miRNAs, targets,
//! interactions, then evidence. Each pass keeps the first row seen for a
//! natural key; later duplicates are skipped. A failure anywhere rolls the
//! whole load back. [`Cache::repopulate`] clears the old rows inside the same
//! transaction, so a failed reload leaves the previous contents in place.

use std::collections::HashMap;
use std::time::Instant;

use rusqlite::{Transaction, params};
use serde::Serialize;
use tracing::{error, info};

use super::Cache;
use crate::error::MirtarbaseError;
use crate::normalize::Normalized;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub species: usize,
    pub mirnas: usize,
    pub targets: usize,
    pub interactions: usize,
    pub evidences: usize,
    pub elapsed_ms: u64,
}

impl Cache {
    /// Loads `normalized` into empty tables.
    pub fn populate(&mut self, normalized: &Normalized) -> Result<LoadStats, MirtarbaseError> {
        if self.is_populated()? {
            return Err(MirtarbaseError::AlreadyPopulated);
        }
        self.load_in_transaction(normalized, false)
    }

    /// Replaces whatever the cache holds with `normalized`.
    pub fn repopulate(&mut self, normalized: &Normalized) -> Result<LoadStats, MirtarbaseError> {
        self.load_in_transaction(normalized, true)
    }

    fn load_in_transaction(
        &mut self,
        normalized: &Normalized,
        clear: bool,
    ) -> Result<LoadStats, MirtarbaseError> {
        let started = Instant::now();
        let result = self
            .conn
            .transaction()
            .map_err(MirtarbaseError::from)
            .and_then(|tx| {
                if clear {
                    clear_rows(&tx)?;
                }
                let stats = load(&tx, normalized)?;
                tx.commit()?;
                Ok(stats)
            });
        match result {
            Ok(mut stats) => {
                stats.elapsed_ms = started.elapsed().as_millis() as u64;
                info!(
                    species = stats.species,
                    mirnas = stats.mirnas,
                    targets = stats.targets,
                    interactions = stats.interactions,
                    evidences = stats.evidences,
                    elapsed_ms = stats.elapsed_ms,
                    "committed cache"
                );
                Ok(stats)
            }
            Err(err) => {
                let elapsed_ms = started.elapsed().as_millis();
                error!(elapsed_ms = elapsed_ms as u64, error = %err, "populate failed; rolled back");
                Err(MirtarbaseError::Transaction {
                    elapsed_ms,
                    message: err.to_string(),
                })
            }
        }
    }
}

fn clear_rows(tx: &Transaction<'_>) -> Result<(), MirtarbaseError> {
    tx.execute_batch(
        r#"
        DELETE FROM mirtarbase_evidence;
        DELETE FROM mirtarbase_interaction;
        DELETE FROM mirtarbase_target;
        DELETE FROM mirtarbase_mirna;
        DELETE FROM mirtarbase_species;
        "#,
    )?;
    info!("cleared cache rows");
    Ok(())
}

fn load(tx: &Transaction<'_>, normalized: &Normalized) -> Result<LoadStats, MirtarbaseError> {
    let mut stats = LoadStats::default();

    let mut species_ids: HashMap<&str, i64> = HashMap::new();
    {
        let pass = Instant::now();
        let mut insert =
            tx.prepare("INSERT INTO mirtarbase_species (name, taxonomy_id) VALUES (?1, ?2)")?;
        for row in &normalized.rows {
            for (name, taxonomy_id) in [
                (&row.mirna_species_name, &row.mirna_species_taxonomy_id),
                (&row.target_species_name, &row.target_species_taxonomy_id),
            ] {
                if species_ids.contains_key(name.as_str()) {
                    continue;
                }
                insert.execute(params![name, taxonomy_id])?;
                species_ids.insert(name, tx.last_insert_rowid());
            }
        }
        stats.species = species_ids.len();
        info!(count = stats.species, elapsed_ms = pass.elapsed().as_millis() as u64, "species pass");
    }

    let mut mirna_ids: HashMap<&str, i64> = HashMap::new();
    {
        let pass = Instant::now();
        let mut insert = tx.prepare(
            "INSERT INTO mirtarbase_mirna \
             (mirtarbase_identifier, mirtarbase_name, mirbase_mature_id, mirbase_id, mirbase_name, species_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for row in &normalized.rows {
            if mirna_ids.contains_key(row.mirna_identifier.as_str()) {
                continue;
            }
            insert.execute(params![
                row.mirna_identifier,
                row.mirna_name,
                row.mirbase_mature_id,
                row.mirbase_id,
                row.mirbase_name,
                species_ids[row.mirna_species_name.as_str()],
            ])?;
            mirna_ids.insert(&row.mirna_identifier, tx.last_insert_rowid());
        }
        stats.mirnas = mirna_ids.len();
        info!(count = stats.mirnas, elapsed_ms = pass.elapsed().as_millis() as u64, "mirna pass");
    }

    let mut target_ids: HashMap<&str, i64> = HashMap::new();
    {
        let pass = Instant::now();
        let mut insert = tx.prepare(
            "INSERT INTO mirtarbase_target \
             (entrez_identifier, gene_name, hgnc_symbol, hgnc_identifier, species_id) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for row in &normalized.rows {
            if target_ids.contains_key(row.target_entrez_id.as_str()) {
                continue;
            }
            insert.execute(params![
                row.target_entrez_id,
                row.target_name,
                row.target_hgnc_symbol,
                row.target_hgnc_id,
                species_ids[row.target_species_name.as_str()],
            ])?;
            target_ids.insert(&row.target_entrez_id, tx.last_insert_rowid());
        }
        stats.targets = target_ids.len();
        info!(count = stats.targets, elapsed_ms = pass.elapsed().as_millis() as u64, "target pass");
    }

    // Evidence rows attach to the first interaction recorded for their MIRT id.
    let mut interaction_ids: HashMap<&str, i64> = HashMap::new();
    {
        let pass = Instant::now();
        let mut insert = tx.prepare(
            "INSERT INTO mirtarbase_interaction (mirtarbase_identifier, mirna_id, target_id) \
             VALUES (?1, ?2, ?3)",
        )?;
        let mut seen: HashMap<(&str, &str, &str), i64> = HashMap::new();
        for row in &normalized.rows {
            let key = (
                row.mirtarbase_id.as_str(),
                row.mirna_identifier.as_str(),
                row.target_entrez_id.as_str(),
            );
            if seen.contains_key(&key) {
                continue;
            }
            insert.execute(params![
                row.mirtarbase_id,
                mirna_ids[row.mirna_identifier.as_str()],
                target_ids[row.target_entrez_id.as_str()],
            ])?;
            let id = tx.last_insert_rowid();
            seen.insert(key, id);
            interaction_ids.entry(&row.mirtarbase_id).or_insert(id);
        }
        stats.interactions = seen.len();
        info!(
            count = stats.interactions,
            elapsed_ms = pass.elapsed().as_millis() as u64,
            "interaction pass"
        );
    }

    {
        let pass = Instant::now();
        let mut insert = tx.prepare(
            "INSERT INTO mirtarbase_evidence (experiment, support, reference, interaction_id) \
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for row in &normalized.rows {
            insert.execute(params![
                row.experiments,
                row.support_type,
                row.pubmed_id,
                interaction_ids[row.mirtarbase_id.as_str()],
            ])?;
            stats.evidences += 1;
        }
        info!(count = stats.evidences, elapsed_ms = pass.elapsed().as_millis() as u64, "evidence pass");
    }

    Ok(stats)
}
