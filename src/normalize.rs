//! Turns raw spreadsheet rows into records ready for loading.
//!
//! Every cross-reference lookup may miss; a miss leaves the field empty and
//! never rejects the row. Rows are only dropped when a join key the loader
//! needs is absent.

use std::fmt;
use std::time::Instant;

use camino::Utf8Path;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{EntrezId, MirtarbaseId, canonical_integer, non_empty};
use crate::error::MirtarbaseError;
use crate::spreadsheet::{RawRow, read_rows};
use crate::xref::XrefLookup;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRow {
    pub mirtarbase_id: String,
    pub mirna_name: String,
    /// Mature miRBase accession, or the miRTarBase name when miRBase has no match.
    pub mirna_identifier: String,
    pub mirbase_mature_id: Option<String>,
    pub mirbase_id: Option<String>,
    pub mirbase_name: Option<String>,
    pub mirna_species_name: String,
    pub mirna_species_taxonomy_id: Option<String>,
    pub target_name: String,
    pub target_entrez_id: String,
    pub target_hgnc_id: Option<String>,
    pub target_hgnc_symbol: Option<String>,
    pub target_species_name: String,
    pub target_species_taxonomy_id: Option<String>,
    pub experiments: String,
    pub support_type: String,
    pub pubmed_id: String,
}

impl NormalizedRow {
    pub fn experiment_list(&self) -> Vec<&str> {
        split_experiments(&self.experiments)
    }
}

/// Splits an experiment cell on the `//` separator.
pub fn split_experiments(value: &str) -> Vec<&str> {
    value
        .split("//")
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DropReason {
    MissingInteractionId,
    MissingMirna,
    MissingEntrezId,
    MissingSpecies,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DropReason::MissingInteractionId => "missing miRTarBase identifier",
            DropReason::MissingMirna => "missing miRNA",
            DropReason::MissingEntrezId => "missing target Entrez identifier",
            DropReason::MissingSpecies => "missing species",
        };
        write!(f, "{text}")
    }
}

/// The normalized table, materialized once so the loader can scan it repeatedly.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Normalized {
    pub rows: Vec<NormalizedRow>,
    pub dropped: usize,
}

impl Normalized {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn normalize(path: &Utf8Path, xrefs: &impl XrefLookup) -> Result<Normalized, MirtarbaseError> {
    let started = Instant::now();
    let raw = read_rows(path)?;
    info!(
        rows = raw.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "read spreadsheet"
    );
    Ok(normalize_rows(raw, xrefs))
}

pub fn normalize_rows(raw: Vec<RawRow>, xrefs: &impl XrefLookup) -> Normalized {
    let mut normalized = Normalized::default();
    for (index, row) in raw.into_iter().enumerate() {
        match normalize_row(row, xrefs) {
            Ok(row) => normalized.rows.push(row),
            Err(reason) => {
                debug!(row = index, %reason, "dropping malformed row");
                normalized.dropped += 1;
            }
        }
    }
    info!(
        kept = normalized.rows.len(),
        dropped = normalized.dropped,
        "normalized rows"
    );
    normalized
}

pub fn normalize_row(row: RawRow, xrefs: &impl XrefLookup) -> Result<NormalizedRow, DropReason> {
    let mirtarbase_id = non_empty(&row.mirtarbase_id)
        .map(|value| {
            value
                .parse::<MirtarbaseId>()
                .map(|id| id.as_str().to_string())
                .unwrap_or(value)
        })
        .ok_or(DropReason::MissingInteractionId)?;
    let mirna_name = non_empty(&row.mirna_name).ok_or(DropReason::MissingMirna)?;
    let target_entrez_id = row
        .target_entrez_id
        .parse::<EntrezId>()
        .map_err(|_| DropReason::MissingEntrezId)?
        .into_string();
    let mirna_species_name = non_empty(&row.mirna_species).ok_or(DropReason::MissingSpecies)?;
    let target_species_name = non_empty(&row.target_species).ok_or(DropReason::MissingSpecies)?;

    let mirbase_mature_id = resolve(&mirtarbase_id, "mirbase.mature", &mirna_name, |name| {
        xrefs.mature_id_for_name(name)
    });
    let mirbase_id = mirbase_mature_id.as_deref().and_then(|mature_id| {
        resolve(&mirtarbase_id, "mirbase", mature_id, |id| {
            xrefs.premature_id_for_mature(id)
        })
    });
    let mirbase_name = mirbase_id.as_deref().and_then(|premature_id| {
        resolve(&mirtarbase_id, "mirbase.name", premature_id, |id| {
            xrefs.premature_name(id)
        })
    });

    let hgnc = xrefs.hgnc_for_entrez(&target_entrez_id);
    if hgnc.is_none() {
        debug!(row = %mirtarbase_id, entrez = %target_entrez_id, "unresolved hgnc reference");
    }

    let mirna_species_taxonomy_id = resolve(&mirtarbase_id, "ncbitaxon", &mirna_species_name, |name| {
        xrefs.taxonomy_id(name)
    });
    let target_species_taxonomy_id =
        resolve(&mirtarbase_id, "ncbitaxon", &target_species_name, |name| {
            xrefs.taxonomy_id(name)
        });

    let pubmed_id = canonical_integer(&row.pubmed_id).unwrap_or_else(|| row.pubmed_id.trim().to_string());

    Ok(NormalizedRow {
        mirna_identifier: mirbase_mature_id
            .clone()
            .unwrap_or_else(|| mirna_name.clone()),
        mirtarbase_id,
        mirna_name,
        mirbase_mature_id,
        mirbase_id,
        mirbase_name,
        mirna_species_name,
        mirna_species_taxonomy_id,
        target_name: row.target_name.trim().to_string(),
        target_entrez_id,
        target_hgnc_id: hgnc.map(|record| record.hgnc_id.clone()),
        target_hgnc_symbol: hgnc.map(|record| record.symbol.clone()),
        target_species_name,
        target_species_taxonomy_id,
        experiments: row.experiments.trim().to_string(),
        support_type: row.support_type.trim().to_string(),
        pubmed_id,
    })
}

fn resolve<'a>(
    row: &str,
    namespace: &str,
    key: &str,
    lookup: impl FnOnce(&str) -> Option<&'a str>,
) -> Option<String> {
    let resolved = lookup(key).map(str::to_string);
    if resolved.is_none() {
        debug!(row, namespace, key, "unresolved reference");
    }
    resolved
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::xref::CrossReferences;

    fn raw(entrez: &str, species: &str) -> RawRow {
        RawRow {
            mirtarbase_id: "MIRT000002".to_string(),
            mirna_name: "hsa-miR-20a-5p".to_string(),
            mirna_species: species.to_string(),
            target_name: "HIF1A".to_string(),
            target_entrez_id: entrez.to_string(),
            target_species: species.to_string(),
            experiments: "Luciferase reporter assay//Western blot".to_string(),
            support_type: "Functional MTI".to_string(),
            pubmed_id: "18632605.0".to_string(),
        }
    }

    #[test]
    fn unresolved_fields_stay_empty() {
        let row = normalize_row(raw("3091.0", "Homo sapiens"), &CrossReferences::new()).unwrap();
        assert_eq!(row.target_entrez_id, "3091");
        assert_eq!(row.pubmed_id, "18632605");
        assert_eq!(row.mirna_identifier, "hsa-miR-20a-5p");
        assert!(row.mirbase_mature_id.is_none());
        assert!(row.target_hgnc_id.is_none());
        assert!(row.mirna_species_taxonomy_id.is_none());
        assert_eq!(row.experiment_list(), vec!["Luciferase reporter assay", "Western blot"]);
    }

    #[test]
    fn missing_join_keys_drop_the_row() {
        let xrefs = CrossReferences::new();
        assert_matches!(normalize_row(raw("", "Homo sapiens"), &xrefs), Err(DropReason::MissingEntrezId));
        assert_matches!(normalize_row(raw("3091", ""), &xrefs), Err(DropReason::MissingSpecies));
    }
}
