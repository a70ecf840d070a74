mod common;

use mirtarbase_cache::normalize::{DropReason, normalize_row};
use mirtarbase_cache::spreadsheet::{RawRow, read_rows};
use mirtarbase_cache::xref::CrossReferences;

use assert_matches::assert_matches;
use common::{fixture_xrefs, normalized_fixture, tsv_fixture};

#[test]
fn rows_without_entrez_are_dropped() {
    let normalized = normalized_fixture();
    assert_eq!(normalized.len(), 10);
    assert_eq!(normalized.dropped, 1);
    assert!(normalized.rows.iter().all(|row| row.mirtarbase_id != "MIRT000999"));
}

#[test]
fn identifiers_resolve_through_cross_references() {
    let normalized = normalized_fixture();
    let row = &normalized.rows[1];
    assert_eq!(row.target_entrez_id, "3091");
    assert_eq!(row.pubmed_id, "18619591");
    assert_eq!(row.mirbase_mature_id.as_deref(), Some("MIMAT0000075"));
    assert_eq!(row.mirna_identifier, "MIMAT0000075");
    assert_eq!(row.mirbase_id.as_deref(), Some("MI0000076"));
    assert_eq!(row.mirbase_name.as_deref(), Some("hsa-mir-20a"));
    assert_eq!(row.target_hgnc_id.as_deref(), Some("4910"));
    assert_eq!(row.target_hgnc_symbol.as_deref(), Some("HIF1A"));
    assert_eq!(row.mirna_species_taxonomy_id.as_deref(), Some("9606"));
    assert_eq!(
        row.experiment_list(),
        vec!["Luciferase reporter assay", "qRT-PCR", "Western blot", "Reporter assay;Microarray"]
    );
}

#[test]
fn misses_leave_fields_empty() {
    let normalized = normalized_fixture();
    let lin4 = normalized
        .rows
        .iter()
        .find(|row| row.mirtarbase_id == "MIRT000006")
        .unwrap();
    assert_eq!(lin4.mirbase_mature_id, None);
    assert_eq!(lin4.mirbase_id, None);
    assert_eq!(lin4.mirna_identifier, "cel-lin-4-5p");
    assert_eq!(lin4.mirna_species_name, "Caenorhabditis elegans");
    assert_eq!(lin4.mirna_species_taxonomy_id, None);
    assert_eq!(lin4.target_hgnc_id, None);
}

#[test]
fn missing_mirna_or_identifier_drops_the_row() {
    let xrefs = CrossReferences::new();
    let template = read_rows(&tsv_fixture()).unwrap().remove(0);

    let no_mirna = RawRow {
        mirna_name: "  ".to_string(),
        ..template.clone()
    };
    assert_matches!(normalize_row(no_mirna, &xrefs), Err(DropReason::MissingMirna));

    let no_id = RawRow {
        mirtarbase_id: String::new(),
        ..template.clone()
    };
    assert_matches!(normalize_row(no_id, &xrefs), Err(DropReason::MissingInteractionId));

    let nan_entrez = RawRow {
        target_entrez_id: "nan".to_string(),
        ..template
    };
    assert_matches!(normalize_row(nan_entrez, &xrefs), Err(DropReason::MissingEntrezId));
}

#[test]
fn xref_tables_load_from_directory() {
    use mirtarbase_cache::xref::XrefLookup;

    let xrefs = fixture_xrefs();
    assert_eq!(xrefs.hgnc_for_entrez("7852").unwrap().hgnc_id, "2561");
    assert_eq!(xrefs.mature_id_for_name("mmu-miR-124-3p"), Some("MIMAT0000134"));
    assert_eq!(xrefs.taxonomy_id("Caenorhabditis elegans"), None);
}
