#![allow(dead_code)]

use camino::Utf8PathBuf;

use mirtarbase_cache::cache::Cache;
use mirtarbase_cache::normalize::{Normalized, normalize};
use mirtarbase_cache::xref::CrossReferences;

pub fn data_path(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn tsv_fixture() -> Utf8PathBuf {
    data_path("mirtarbase_mti.tsv")
}

pub fn xlsx_fixture() -> Utf8PathBuf {
    data_path("mirtarbase_mti.xlsx")
}

pub fn xref_dir() -> Utf8PathBuf {
    data_path("xrefs")
}

pub fn fixture_xrefs() -> CrossReferences {
    CrossReferences::from_dir(&xref_dir()).unwrap()
}

pub fn normalized_fixture() -> Normalized {
    normalize(&tsv_fixture(), &fixture_xrefs()).unwrap()
}

/// An in-memory cache loaded from the TSV fixture.
pub fn populated_cache() -> Cache {
    let mut cache = Cache::open_in_memory().unwrap();
    cache.populate(&normalized_fixture()).unwrap();
    cache
}
