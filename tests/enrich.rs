mod common;

use mirtarbase_cache::enrich::{
    EVIDENCE_TEXT, enrich_mirna_targets, enrich_target_regulators, to_graph,
};
use mirtarbase_cache::graph::{BelGraph, Citation, Function, KnowledgeGraph, Node, Relation};

use common::populated_cache;

fn graph_with(node: Node) -> BelGraph {
    let mut graph = BelGraph::new();
    graph.add_node(node);
    assert_eq!(graph.number_of_nodes(), 1);
    assert_eq!(graph.number_of_edges(), 0);
    graph
}

fn some(value: &str) -> Option<String> {
    Some(value.to_string())
}

#[test]
fn hif1a_is_enriched_from_every_namespace() {
    let cache = populated_cache();
    let variants = [
        Node::rna("hgnc", some("HIF1A"), some("4910")),
        Node::rna("HGNC", some("HIF1A"), None),
        Node::rna("ncbigene", some("HIF1A"), some("3091")),
        Node::rna("egid", None, some("3091")),
        Node::rna("entrez", some("3091"), None),
    ];

    for node in variants {
        let mut graph = graph_with(node.clone());
        let stats = enrich_target_regulators(&mut graph, &cache).unwrap();

        assert_eq!(stats.nodes_matched, 1, "{}", node.label());
        assert_eq!(stats.edges_added, 3);
        assert_eq!(graph.number_of_nodes(), 2, "{}", node.label());
        assert_eq!(graph.number_of_edges(), 3);
        for edge in graph.edges() {
            assert_eq!(edge.target, node);
            assert_eq!(edge.source.function, Function::MicroRna);
            assert_eq!(edge.source.name.as_deref(), Some("hsa-miR-20a-5p"));
            assert_eq!(edge.relation, Relation::Decreases);
            assert_eq!(edge.evidence.as_deref(), Some(EVIDENCE_TEXT));
        }
    }
}

#[test]
fn enrichment_is_idempotent() {
    let cache = populated_cache();
    let mut graph = graph_with(Node::rna("hgnc", some("HIF1A"), some("4910")));
    enrich_target_regulators(&mut graph, &cache).unwrap();
    let again = enrich_target_regulators(&mut graph, &cache).unwrap();
    assert_eq!(again.edges_added, 0);
    assert_eq!(graph.number_of_edges(), 3);
}

#[test]
fn edges_carry_citation_and_annotations() {
    let cache = populated_cache();
    let mut graph = graph_with(Node::rna("ncbigene", None, some("3091")));
    enrich_target_regulators(&mut graph, &cache).unwrap();

    let edge = graph
        .edges()
        .iter()
        .find(|edge| edge.citation == Some(Citation::pubmed("18619591")))
        .unwrap();
    let experiments = &edge.annotations["experiments"];
    assert_eq!(experiments.len(), 4);
    assert!(experiments.contains("Reporter assay;Microarray"));
    assert!(edge.annotations["support"].contains("Functional MTI"));
}

#[test]
fn unmapped_nodes_are_skipped() {
    let cache = populated_cache();
    let mut graph = BelGraph::new();
    graph.add_node(Node::rna("chebi", some("glucose"), None));
    graph.add_node(Node::rna("hgnc", some("NOTAGENE"), None));
    graph.add_node(Node::new(Function::Protein, "hgnc", some("HIF1A"), None));

    let stats = enrich_target_regulators(&mut graph, &cache).unwrap();
    assert_eq!(stats.nodes_skipped, 2);
    assert_eq!(stats.nodes_matched, 0);
    assert_eq!(graph.number_of_edges(), 0);
}

#[test]
fn mirna_targets_by_mature_accession() {
    let cache = populated_cache();
    let mut graph = graph_with(Node::micro_rna("mirbase.mature", None, some("MIMAT0000075")));
    let stats = enrich_mirna_targets(&mut graph, &cache).unwrap();

    assert_eq!(stats.edges_added, 4);
    assert_eq!(graph.number_of_nodes(), 3);
    let targets: Vec<_> = graph
        .edges()
        .iter()
        .filter_map(|edge| edge.target.identifier.clone())
        .collect();
    assert!(targets.contains(&"3091".to_string()));
    assert!(targets.contains(&"1869".to_string()));
}

#[test]
fn mirna_targets_by_interaction_and_name() {
    let cache = populated_cache();

    let mut by_interaction = graph_with(Node::micro_rna("mirtarbase", None, some("MIRT000005")));
    enrich_mirna_targets(&mut by_interaction, &cache).unwrap();
    assert_eq!(by_interaction.number_of_edges(), 1);
    assert_eq!(
        by_interaction.edges()[0].target.name.as_deref(),
        Some("Ctdsp1")
    );

    let mut by_name = graph_with(Node::micro_rna("mirtarbase", some("cel-let-7-5p"), None));
    enrich_mirna_targets(&mut by_name, &cache).unwrap();
    assert_eq!(by_name.number_of_edges(), 2);
    assert_eq!(by_name.number_of_nodes(), 2);

    let mut premature = graph_with(Node::micro_rna("mirbase", some("hsa-mir-146a"), some("MI0000477")));
    enrich_mirna_targets(&mut premature, &cache).unwrap();
    assert_eq!(premature.number_of_edges(), 2);

    let mut unknown = graph_with(Node::micro_rna("hgnc", some("MIR20A"), None));
    let stats = enrich_mirna_targets(&mut unknown, &cache).unwrap();
    assert_eq!(stats.nodes_skipped, 1);
    assert_eq!(unknown.number_of_edges(), 0);
}

#[test]
fn whole_cache_export() {
    let cache = populated_cache();
    let graph = to_graph(&cache).unwrap();

    // 5 mature + 4 premature miRNAs, 6 targets
    assert_eq!(graph.number_of_nodes(), 15);
    // 4 isA + 10 decreases
    assert_eq!(graph.number_of_edges(), 14);
    let is_a = graph
        .edges()
        .iter()
        .filter(|edge| edge.relation == Relation::IsA)
        .count();
    assert_eq!(is_a, 4);

    let json = graph.to_json();
    assert_eq!(json["name"], "miRTarBase");
    assert_eq!(json["version"], "6.1");
    assert_eq!(json["edges"].as_array().unwrap().len(), 14);
}
