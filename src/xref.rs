//! Cross-reference tables for the identifier namespaces the normalizer joins
//! against: HGNC, miRBase (mature and premature) and NCBI Taxonomy.
//!
//! Each table is a tab-separated file with a header row, optionally
//! gzip-compressed. A table that is not present simply resolves nothing.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::MultiGzDecoder;
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::{canonical_integer, non_empty, normalize_hgnc_id};
use crate::error::MirtarbaseError;

pub const HGNC_TABLE: &str = "hgnc";
pub const MIRBASE_MATURE_TABLE: &str = "mirbase_mature";
pub const MIRBASE_TABLE: &str = "mirbase";
pub const TAXONOMY_TABLE: &str = "taxonomy";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HgncRecord {
    pub hgnc_id: String,
    pub symbol: String,
}

/// Key-value lookups the normalizer resolves identifiers through.
pub trait XrefLookup {
    fn hgnc_for_entrez(&self, entrez_id: &str) -> Option<&HgncRecord>;
    fn mature_id_for_name(&self, mature_name: &str) -> Option<&str>;
    fn premature_id_for_mature(&self, mature_id: &str) -> Option<&str>;
    fn premature_name(&self, premature_id: &str) -> Option<&str>;
    fn taxonomy_id(&self, species_name: &str) -> Option<&str>;
}

#[derive(Debug, Deserialize)]
struct HgncRow {
    hgnc_id: String,
    symbol: String,
    #[serde(default)]
    entrez_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MatureRow {
    mature_id: String,
    mature_name: String,
    #[serde(default)]
    premature_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PrematureRow {
    premature_id: String,
    premature_name: String,
}

#[derive(Debug, Deserialize)]
struct TaxonomyRow {
    taxonomy_id: String,
    name: String,
}

#[derive(Debug, Clone, Default)]
pub struct CrossReferences {
    entrez_to_hgnc: HashMap<String, HgncRecord>,
    mature_name_to_id: HashMap<String, String>,
    mature_to_premature: HashMap<String, String>,
    premature_id_to_name: HashMap<String, String>,
    taxonomy_name_to_id: HashMap<String, String>,
}

impl CrossReferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every table found in `dir`. Absent tables are logged and left empty.
    pub fn from_dir(dir: &Utf8Path) -> Result<Self, MirtarbaseError> {
        let mut xrefs = Self::new();

        match find_table(dir, HGNC_TABLE) {
            Some(path) => xrefs.load_hgnc(&path)?,
            None => warn!(%dir, "no HGNC table; targets will have no HGNC fields"),
        }

        match find_table(dir, MIRBASE_MATURE_TABLE) {
            Some(path) => {
                for row in read_table::<MatureRow>(&path)? {
                    let (Some(id), Some(name)) = (non_empty(&row.mature_id), non_empty(&row.mature_name))
                    else {
                        continue;
                    };
                    if let Some(premature) = row.premature_id.as_deref().and_then(non_empty) {
                        xrefs.mature_to_premature.insert(id.clone(), premature);
                    }
                    xrefs.mature_name_to_id.insert(name, id);
                }
            }
            None => warn!(%dir, "no miRBase mature table; miRNAs keep their miRTarBase names"),
        }

        match find_table(dir, MIRBASE_TABLE) {
            Some(path) => {
                for row in read_table::<PrematureRow>(&path)? {
                    if let (Some(id), Some(name)) =
                        (non_empty(&row.premature_id), non_empty(&row.premature_name))
                    {
                        xrefs.premature_id_to_name.insert(id, name);
                    }
                }
            }
            None => warn!(%dir, "no miRBase premature table"),
        }

        match find_table(dir, TAXONOMY_TABLE) {
            Some(path) => {
                for row in read_table::<TaxonomyRow>(&path)? {
                    if let (Some(id), Some(name)) = (non_empty(&row.taxonomy_id), non_empty(&row.name)) {
                        xrefs.taxonomy_name_to_id.insert(name, id);
                    }
                }
            }
            None => warn!(%dir, "no taxonomy table; species will have no taxonomy ids"),
        }

        info!(
            hgnc = xrefs.entrez_to_hgnc.len(),
            mirbase_mature = xrefs.mature_name_to_id.len(),
            mirbase = xrefs.premature_id_to_name.len(),
            taxonomy = xrefs.taxonomy_name_to_id.len(),
            "loaded cross-references"
        );
        Ok(xrefs)
    }

    /// Reads an HGNC complete-set style table (`hgnc_id`, `symbol`, `entrez_id`).
    pub fn load_hgnc(&mut self, path: &Utf8Path) -> Result<(), MirtarbaseError> {
        for row in read_table::<HgncRow>(path)? {
            let Some(entrez_id) = row.entrez_id.as_deref().and_then(canonical_integer) else {
                continue;
            };
            let (Some(hgnc_id), Some(symbol)) = (non_empty(&row.hgnc_id), non_empty(&row.symbol))
            else {
                continue;
            };
            self.insert_hgnc(&entrez_id, &hgnc_id, &symbol);
        }
        Ok(())
    }

    pub fn insert_hgnc(&mut self, entrez_id: &str, hgnc_id: &str, symbol: &str) -> &mut Self {
        self.entrez_to_hgnc.insert(
            entrez_id.to_string(),
            HgncRecord {
                hgnc_id: normalize_hgnc_id(hgnc_id),
                symbol: symbol.to_string(),
            },
        );
        self
    }

    pub fn insert_mature(
        &mut self,
        mature_name: &str,
        mature_id: &str,
        premature_id: Option<&str>,
    ) -> &mut Self {
        self.mature_name_to_id
            .insert(mature_name.to_string(), mature_id.to_string());
        if let Some(premature_id) = premature_id {
            self.mature_to_premature
                .insert(mature_id.to_string(), premature_id.to_string());
        }
        self
    }

    pub fn insert_premature(&mut self, premature_id: &str, premature_name: &str) -> &mut Self {
        self.premature_id_to_name
            .insert(premature_id.to_string(), premature_name.to_string());
        self
    }

    pub fn insert_taxonomy(&mut self, species_name: &str, taxonomy_id: &str) -> &mut Self {
        self.taxonomy_name_to_id
            .insert(species_name.to_string(), taxonomy_id.to_string());
        self
    }
}

impl XrefLookup for CrossReferences {
    fn hgnc_for_entrez(&self, entrez_id: &str) -> Option<&HgncRecord> {
        self.entrez_to_hgnc.get(entrez_id)
    }

    fn mature_id_for_name(&self, mature_name: &str) -> Option<&str> {
        self.mature_name_to_id.get(mature_name).map(String::as_str)
    }

    fn premature_id_for_mature(&self, mature_id: &str) -> Option<&str> {
        self.mature_to_premature.get(mature_id).map(String::as_str)
    }

    fn premature_name(&self, premature_id: &str) -> Option<&str> {
        self.premature_id_to_name.get(premature_id).map(String::as_str)
    }

    fn taxonomy_id(&self, species_name: &str) -> Option<&str> {
        self.taxonomy_name_to_id.get(species_name).map(String::as_str)
    }
}

fn find_table(dir: &Utf8Path, stem: &str) -> Option<Utf8PathBuf> {
    [format!("{stem}.tsv"), format!("{stem}.tsv.gz"), format!("{stem}.txt")]
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| path.as_std_path().is_file())
}

fn read_table<T>(path: &Utf8Path) -> Result<Vec<T>, MirtarbaseError>
where
    T: for<'de> Deserialize<'de>,
{
    let file = File::open(path.as_std_path())
        .map_err(|err| MirtarbaseError::CrossReference(format!("open {path}: {err}")))?;
    let reader: Box<dyn Read> = if path.extension() == Some("gz") {
        Box::new(MultiGzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize() {
        let record = record
            .map_err(|err| MirtarbaseError::CrossReference(format!("{path}: {err}")))?;
        rows.push(record);
    }
    Ok(rows)
}
