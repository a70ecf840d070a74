//! Lookups over the populated cache. A miss is `Ok(None)` or an empty list.

use rusqlite::{OptionalExtension, Params, Row, params};

use super::Cache;
use super::models::{
    EVIDENCE_COLUMNS, INTERACTION_COLUMNS, MIRNA_COLUMNS, SPECIES_COLUMNS, TARGET_COLUMNS,
};
use super::models::{Evidence, Interaction, Mirna, MtiRecord, Species, Summary, Target};
use super::schema::{
    EVIDENCE_TABLE, INTERACTION_TABLE, MIRNA_TABLE, SPECIES_TABLE, TARGET_TABLE,
};
use crate::domain::{normalize_hgnc_id, MirtarbaseId};
use crate::error::MirtarbaseError;

impl Cache {
    pub fn count_species(&self) -> Result<i64, MirtarbaseError> {
        self.count(SPECIES_TABLE)
    }

    pub fn count_mirnas(&self) -> Result<i64, MirtarbaseError> {
        self.count(MIRNA_TABLE)
    }

    pub fn count_targets(&self) -> Result<i64, MirtarbaseError> {
        self.count(TARGET_TABLE)
    }

    pub fn count_interactions(&self) -> Result<i64, MirtarbaseError> {
        self.count(INTERACTION_TABLE)
    }

    pub fn count_evidences(&self) -> Result<i64, MirtarbaseError> {
        self.count(EVIDENCE_TABLE)
    }

    /// True once any miRNA has been loaded.
    pub fn is_populated(&self) -> Result<bool, MirtarbaseError> {
        Ok(self.count_mirnas()? > 0)
    }

    pub fn summarize(&self) -> Result<Summary, MirtarbaseError> {
        Ok(Summary {
            mirnas: self.count_mirnas()?,
            targets: self.count_targets()?,
            species: self.count_species()?,
            interactions: self.count_interactions()?,
            evidences: self.count_evidences()?,
        })
    }

    fn count(&self, table: &str) -> Result<i64, MirtarbaseError> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count)
    }

    /// Finds the miRNA of the first interaction recorded under a MIRT identifier.
    pub fn find_mirna_by_interaction(
        &self,
        mirtarbase_id: &str,
    ) -> Result<Option<Mirna>, MirtarbaseError> {
        let Ok(id) = mirtarbase_id.parse::<MirtarbaseId>() else {
            return Ok(None);
        };
        self.one(
            &format!(
                "SELECT {MIRNA_COLUMNS} FROM {MIRNA_TABLE} m \
                 JOIN {INTERACTION_TABLE} i ON i.mirna_id = m.id \
                 WHERE i.mirtarbase_identifier = ?1 ORDER BY i.id LIMIT 1"
            ),
            params![id.as_str()],
            |row| Mirna::from_row_at(row, 0),
        )
    }

    /// Looks up by mature miRBase accession, or by name for unmapped miRNAs.
    pub fn find_mirna_by_identifier(&self, identifier: &str) -> Result<Option<Mirna>, MirtarbaseError> {
        self.one(
            &format!("SELECT {MIRNA_COLUMNS} FROM {MIRNA_TABLE} m WHERE m.mirtarbase_identifier = ?1"),
            params![identifier.trim()],
            |row| Mirna::from_row_at(row, 0),
        )
    }

    pub fn find_mirna_by_name(&self, name: &str) -> Result<Option<Mirna>, MirtarbaseError> {
        self.one(
            &format!(
                "SELECT {MIRNA_COLUMNS} FROM {MIRNA_TABLE} m \
                 WHERE m.mirtarbase_name = ?1 ORDER BY m.id LIMIT 1"
            ),
            params![name.trim()],
            |row| Mirna::from_row_at(row, 0),
        )
    }

    pub fn find_mirna_by_mirbase_mature_id(
        &self,
        mature_id: &str,
    ) -> Result<Option<Mirna>, MirtarbaseError> {
        self.one(
            &format!(
                "SELECT {MIRNA_COLUMNS} FROM {MIRNA_TABLE} m \
                 WHERE m.mirbase_mature_id = ?1 ORDER BY m.id LIMIT 1"
            ),
            params![mature_id.trim()],
            |row| Mirna::from_row_at(row, 0),
        )
    }

    /// Every mature miRNA derived from the given premature miRBase accession.
    pub fn find_mirnas_by_mirbase_id(
        &self,
        mirbase_id: &str,
    ) -> Result<Vec<Mirna>, MirtarbaseError> {
        self.many(
            &format!(
                "SELECT {MIRNA_COLUMNS} FROM {MIRNA_TABLE} m \
                 WHERE m.mirbase_id = ?1 ORDER BY m.id"
            ),
            params![mirbase_id.trim()],
            |row| Mirna::from_row_at(row, 0),
        )
    }

    pub fn find_target_by_entrez(
        &self,
        entrez_id: &str,
    ) -> Result<Option<Target>, MirtarbaseError> {
        self.one(
            &format!("SELECT {TARGET_COLUMNS} FROM {TARGET_TABLE} t WHERE t.entrez_identifier = ?1"),
            params![entrez_id.trim()],
            |row| Target::from_row_at(row, 0),
        )
    }

    pub fn find_target_by_hgnc_symbol(
        &self,
        symbol: &str,
    ) -> Result<Option<Target>, MirtarbaseError> {
        self.one(
            &format!("SELECT {TARGET_COLUMNS} FROM {TARGET_TABLE} t WHERE t.hgnc_symbol = ?1"),
            params![symbol.trim()],
            |row| Target::from_row_at(row, 0),
        )
    }

    /// Accepts the identifier with or without its `HGNC:` prefix.
    pub fn find_target_by_hgnc_identifier(
        &self,
        hgnc_id: &str,
    ) -> Result<Option<Target>, MirtarbaseError> {
        self.one(
            &format!("SELECT {TARGET_COLUMNS} FROM {TARGET_TABLE} t WHERE t.hgnc_identifier = ?1"),
            params![normalize_hgnc_id(hgnc_id)],
            |row| Target::from_row_at(row, 0),
        )
    }

    pub fn find_species_by_name(&self, name: &str) -> Result<Option<Species>, MirtarbaseError> {
        self.one(
            &format!("SELECT {SPECIES_COLUMNS} FROM {SPECIES_TABLE} s WHERE s.name = ?1"),
            params![name.trim()],
            |row| Species::from_row_at(row, 0),
        )
    }

    pub fn mirna(&self, id: i64) -> Result<Option<Mirna>, MirtarbaseError> {
        self.one(
            &format!("SELECT {MIRNA_COLUMNS} FROM {MIRNA_TABLE} m WHERE m.id = ?1"),
            params![id],
            |row| Mirna::from_row_at(row, 0),
        )
    }

    pub fn target(&self, id: i64) -> Result<Option<Target>, MirtarbaseError> {
        self.one(
            &format!("SELECT {TARGET_COLUMNS} FROM {TARGET_TABLE} t WHERE t.id = ?1"),
            params![id],
            |row| Target::from_row_at(row, 0),
        )
    }

    pub fn species(&self, id: i64) -> Result<Option<Species>, MirtarbaseError> {
        self.one(
            &format!("SELECT {SPECIES_COLUMNS} FROM {SPECIES_TABLE} s WHERE s.id = ?1"),
            params![id],
            |row| Species::from_row_at(row, 0),
        )
    }

    pub fn interaction(&self, id: i64) -> Result<Option<Interaction>, MirtarbaseError> {
        self.one(
            &format!("SELECT {INTERACTION_COLUMNS} FROM {INTERACTION_TABLE} i WHERE i.id = ?1"),
            params![id],
            |row| Interaction::from_row_at(row, 0),
        )
    }

    pub fn interactions_for_mirna(
        &self,
        mirna_id: i64,
    ) -> Result<Vec<Interaction>, MirtarbaseError> {
        self.many(
            &format!(
                "SELECT {INTERACTION_COLUMNS} FROM {INTERACTION_TABLE} i \
                 WHERE i.mirna_id = ?1 ORDER BY i.id"
            ),
            params![mirna_id],
            |row| Interaction::from_row_at(row, 0),
        )
    }

    pub fn interactions_for_target(
        &self,
        target_id: i64,
    ) -> Result<Vec<Interaction>, MirtarbaseError> {
        self.many(
            &format!(
                "SELECT {INTERACTION_COLUMNS} FROM {INTERACTION_TABLE} i \
                 WHERE i.target_id = ?1 ORDER BY i.id"
            ),
            params![target_id],
            |row| Interaction::from_row_at(row, 0),
        )
    }

    pub fn evidences_for_interaction(
        &self,
        interaction_id: i64,
    ) -> Result<Vec<Evidence>, MirtarbaseError> {
        self.many(
            &format!(
                "SELECT {EVIDENCE_COLUMNS} FROM {EVIDENCE_TABLE} e \
                 WHERE e.interaction_id = ?1 ORDER BY e.id"
            ),
            params![interaction_id],
            |row| Evidence::from_row_at(row, 0),
        )
    }

    pub fn list_species(&self) -> Result<Vec<Species>, MirtarbaseError> {
        self.many(
            &format!("SELECT {SPECIES_COLUMNS} FROM {SPECIES_TABLE} s ORDER BY s.id"),
            [],
            |row| Species::from_row_at(row, 0),
        )
    }

    pub fn list_mirnas(&self, offset: i64, limit: i64) -> Result<Vec<Mirna>, MirtarbaseError> {
        self.many(
            &format!("SELECT {MIRNA_COLUMNS} FROM {MIRNA_TABLE} m ORDER BY m.id LIMIT ?1 OFFSET ?2"),
            params![limit, offset],
            |row| Mirna::from_row_at(row, 0),
        )
    }

    pub fn list_targets(&self, offset: i64, limit: i64) -> Result<Vec<Target>, MirtarbaseError> {
        self.many(
            &format!(
                "SELECT {TARGET_COLUMNS} FROM {TARGET_TABLE} t ORDER BY t.id LIMIT ?1 OFFSET ?2"
            ),
            params![limit, offset],
            |row| Target::from_row_at(row, 0),
        )
    }

    pub fn list_interactions(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Interaction>, MirtarbaseError> {
        self.many(
            &format!(
                "SELECT {INTERACTION_COLUMNS} FROM {INTERACTION_TABLE} i \
                 ORDER BY i.id LIMIT ?1 OFFSET ?2"
            ),
            params![limit, offset],
            |row| Interaction::from_row_at(row, 0),
        )
    }

    pub fn list_evidences(&self, offset: i64, limit: i64) -> Result<Vec<Evidence>, MirtarbaseError> {
        self.many(
            &format!(
                "SELECT {EVIDENCE_COLUMNS} FROM {EVIDENCE_TABLE} e ORDER BY e.id LIMIT ?1 OFFSET ?2"
            ),
            params![limit, offset],
            |row| Evidence::from_row_at(row, 0),
        )
    }

    /// One record per evidence row supporting an interaction of this miRNA.
    pub fn mti_records_for_mirna(&self, mirna_id: i64) -> Result<Vec<MtiRecord>, MirtarbaseError> {
        self.many(
            &mti_query("WHERE i.mirna_id = ?1"),
            params![mirna_id],
            MtiRecord::from_row,
        )
    }

    pub fn mti_records_for_target(
        &self,
        target_id: i64,
    ) -> Result<Vec<MtiRecord>, MirtarbaseError> {
        self.many(
            &mti_query("WHERE i.target_id = ?1"),
            params![target_id],
            MtiRecord::from_row,
        )
    }

    pub fn all_mti_records(&self) -> Result<Vec<MtiRecord>, MirtarbaseError> {
        self.many(&mti_query(""), [], MtiRecord::from_row)
    }

    fn one<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Option<T>, MirtarbaseError>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        Ok(self.conn.query_row(sql, params, map).optional()?)
    }

    fn many<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Vec<T>, MirtarbaseError>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, map)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }
}

fn mti_query(filter: &str) -> String {
    format!(
        "SELECT {INTERACTION_COLUMNS}, {MIRNA_COLUMNS}, {TARGET_COLUMNS}, {EVIDENCE_COLUMNS} \
         FROM {EVIDENCE_TABLE} e \
         JOIN {INTERACTION_TABLE} i ON e.interaction_id = i.id \
         JOIN {MIRNA_TABLE} m ON i.mirna_id = m.id \
         JOIN {TARGET_TABLE} t ON i.target_id = t.id \
         {filter} ORDER BY i.id, e.id"
    )
}
