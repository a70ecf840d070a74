//! Row types of the relational cache.

use rusqlite::Row;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Species {
    pub id: i64,
    pub name: String,
    pub taxonomy_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mirna {
    pub id: i64,
    /// Mature miRBase accession, or the miRTarBase name when unmapped.
    pub mirtarbase_identifier: String,
    pub mirtarbase_name: String,
    pub mirbase_mature_id: Option<String>,
    pub mirbase_id: Option<String>,
    pub mirbase_name: Option<String>,
    pub species_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub id: i64,
    pub entrez_identifier: String,
    pub gene_name: String,
    pub hgnc_symbol: Option<String>,
    pub hgnc_identifier: Option<String>,
    pub species_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interaction {
    pub id: i64,
    pub mirtarbase_identifier: String,
    pub mirna_id: i64,
    pub target_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evidence {
    pub id: i64,
    pub experiment: String,
    pub support: String,
    /// PubMed identifier.
    pub reference: String,
    pub interaction_id: i64,
}

/// One piece of support for an interaction, with both endpoints resolved.
#[derive(Debug, Clone, Serialize)]
pub struct MtiRecord {
    pub interaction: Interaction,
    pub mirna: Mirna,
    pub target: Target,
    pub evidence: Evidence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub mirnas: i64,
    pub targets: i64,
    pub species: i64,
    pub interactions: i64,
    pub evidences: i64,
}

pub(super) const SPECIES_COLUMNS: &str = "s.id, s.name, s.taxonomy_id";
pub(super) const MIRNA_COLUMNS: &str = "m.id, m.mirtarbase_identifier, m.mirtarbase_name, \
     m.mirbase_mature_id, m.mirbase_id, m.mirbase_name, m.species_id";
pub(super) const TARGET_COLUMNS: &str =
    "t.id, t.entrez_identifier, t.gene_name, t.hgnc_symbol, t.hgnc_identifier, t.species_id";
pub(super) const INTERACTION_COLUMNS: &str =
    "i.id, i.mirtarbase_identifier, i.mirna_id, i.target_id";
pub(super) const EVIDENCE_COLUMNS: &str =
    "e.id, e.experiment, e.support, e.reference, e.interaction_id";

impl Species {
    pub(super) fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            taxonomy_id: row.get(offset + 2)?,
        })
    }
}

impl Mirna {
    pub(super) const WIDTH: usize = 7;

    pub(super) fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            mirtarbase_identifier: row.get(offset + 1)?,
            mirtarbase_name: row.get(offset + 2)?,
            mirbase_mature_id: row.get(offset + 3)?,
            mirbase_id: row.get(offset + 4)?,
            mirbase_name: row.get(offset + 5)?,
            species_id: row.get(offset + 6)?,
        })
    }
}

impl Target {
    pub(super) const WIDTH: usize = 6;

    pub(super) fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            entrez_identifier: row.get(offset + 1)?,
            gene_name: row.get(offset + 2)?,
            hgnc_symbol: row.get(offset + 3)?,
            hgnc_identifier: row.get(offset + 4)?,
            species_id: row.get(offset + 5)?,
        })
    }
}

impl Interaction {
    pub(super) const WIDTH: usize = 4;

    pub(super) fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            mirtarbase_identifier: row.get(offset + 1)?,
            mirna_id: row.get(offset + 2)?,
            target_id: row.get(offset + 3)?,
        })
    }
}

impl Evidence {
    pub(super) fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            experiment: row.get(offset + 1)?,
            support: row.get(offset + 2)?,
            reference: row.get(offset + 3)?,
            interaction_id: row.get(offset + 4)?,
        })
    }
}

impl MtiRecord {
    pub(super) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let mut offset = 0;
        let interaction = Interaction::from_row_at(row, offset)?;
        offset += Interaction::WIDTH;
        let mirna = Mirna::from_row_at(row, offset)?;
        offset += Mirna::WIDTH;
        let target = Target::from_row_at(row, offset)?;
        offset += Target::WIDTH;
        let evidence = Evidence::from_row_at(row, offset)?;
        Ok(Self {
            interaction,
            mirna,
            target,
            evidence,
        })
    }
}
