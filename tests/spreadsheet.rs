mod common;

use mirtarbase_cache::normalize::normalize;
use mirtarbase_cache::spreadsheet::read_rows;

use common::{fixture_xrefs, tsv_fixture, xlsx_fixture};

#[test]
fn tsv_header_is_skipped() {
    let rows = read_rows(&tsv_fixture()).unwrap();
    assert_eq!(rows.len(), 11);
    assert_eq!(rows[0].mirtarbase_id, "MIRT000002");
    assert_eq!(rows[0].mirna_name, "hsa-miR-20a-5p");
    assert_eq!(rows[1].target_entrez_id, "3091.0");
    assert_eq!(rows[10].target_entrez_id, "");
}

#[test]
fn xlsx_reads_shared_strings_and_numbers() {
    let rows = read_rows(&xlsx_fixture()).unwrap();
    assert_eq!(rows.len(), 11);
    assert_eq!(rows[3].target_name, "CXCR4");
    assert_eq!(rows[3].target_entrez_id, "7852");
    assert_eq!(rows[5].mirna_species, "Mus musculus");
    assert_eq!(
        rows[1].experiments,
        "Luciferase reporter assay//qRT-PCR//Western blot//Reporter assay;Microarray"
    );
    assert_eq!(rows[10].target_entrez_id, "");
    assert_eq!(rows[10].target_species, "Homo sapiens");
}

#[test]
fn both_formats_normalize_identically() {
    let xrefs = fixture_xrefs();
    let from_tsv = normalize(&tsv_fixture(), &xrefs).unwrap();
    let from_xlsx = normalize(&xlsx_fixture(), &xrefs).unwrap();
    assert_eq!(from_tsv.rows, from_xlsx.rows);
    assert_eq!(from_tsv.dropped, from_xlsx.dropped);
}
