//! Injects cached miRNA–target interactions into a knowledge graph.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{Cache, Evidence, Mirna, MtiRecord, Target};
use crate::config::MIRTARBASE_VERSION;
use crate::domain::{MirtarbaseId, Namespace};
use crate::error::MirtarbaseError;
use crate::graph::{BelGraph, Citation, Edge, Function, KnowledgeGraph, Node, Relation};
use crate::normalize::split_experiments;

pub const EVIDENCE_TEXT: &str = "From miRTarBase";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichStats {
    pub nodes_matched: usize,
    pub nodes_skipped: usize,
    pub edges_added: usize,
}

/// Adds a `decreases` edge from every resolvable miRNA node to each of its
/// cached targets, one per evidence row.
pub fn enrich_mirna_targets(
    graph: &mut impl KnowledgeGraph,
    cache: &Cache,
) -> Result<EnrichStats, MirtarbaseError> {
    let mut stats = EnrichStats::default();
    for node in graph.nodes() {
        if node.function != Function::MicroRna {
            continue;
        }
        let namespace = Namespace::parse(&node.namespace);
        let mirnas = match namespace {
            Namespace::Mirtarbase | Namespace::MirbaseMature | Namespace::Mirbase => {
                resolve_mirnas(cache, &namespace, &node)?
            }
            _ => {
                warn!(namespace = %node.namespace, node = %node.label(), "unable to map namespace");
                stats.nodes_skipped += 1;
                continue;
            }
        };
        if mirnas.is_empty() {
            warn!(node = %node.label(), "unable to find miRNA");
            stats.nodes_skipped += 1;
            continue;
        }

        stats.nodes_matched += 1;
        for mirna in &mirnas {
            for record in cache.mti_records_for_mirna(mirna.id)? {
                let edge = evidence_edge(node.clone(), target_node(&record.target), &record.evidence);
                if graph.add_edge(edge) {
                    stats.edges_added += 1;
                }
            }
        }
    }
    info!(
        matched = stats.nodes_matched,
        skipped = stats.nodes_skipped,
        edges = stats.edges_added,
        "enriched miRNA targets"
    );
    Ok(stats)
}

/// Adds a `decreases` edge into every resolvable RNA node from each miRNA
/// that regulates it, one per evidence row.
pub fn enrich_target_regulators(
    graph: &mut impl KnowledgeGraph,
    cache: &Cache,
) -> Result<EnrichStats, MirtarbaseError> {
    let mut stats = EnrichStats::default();
    for node in graph.nodes() {
        if node.function != Function::Rna {
            continue;
        }
        let namespace = Namespace::parse(&node.namespace);
        let target = match namespace {
            Namespace::Hgnc | Namespace::Entrez => resolve_target(cache, &namespace, &node)?,
            _ => {
                warn!(namespace = %node.namespace, node = %node.label(), "unable to map namespace");
                stats.nodes_skipped += 1;
                continue;
            }
        };
        let Some(target) = target else {
            warn!(node = %node.label(), "unable to find RNA");
            stats.nodes_skipped += 1;
            continue;
        };

        stats.nodes_matched += 1;
        for record in cache.mti_records_for_target(target.id)? {
            let edge = evidence_edge(mirna_node(&record.mirna), node.clone(), &record.evidence);
            if graph.add_edge(edge) {
                stats.edges_added += 1;
            }
        }
    }
    info!(
        matched = stats.nodes_matched,
        skipped = stats.nodes_skipped,
        edges = stats.edges_added,
        "enriched target regulators"
    );
    Ok(stats)
}

/// Exports the whole cache: mature miRNA `isA` premature miRNA when known,
/// and one `decreases` edge per evidence row.
pub fn to_graph(cache: &Cache) -> Result<BelGraph, MirtarbaseError> {
    let mut graph = BelGraph::with_metadata("miRTarBase", MIRTARBASE_VERSION);
    for MtiRecord {
        mirna,
        target,
        evidence,
        ..
    } in cache.all_mti_records()?
    {
        let mature = mirna_node(&mirna);
        if let Some(premature) = premature_node(&mirna) {
            graph.add_edge(Edge::is_a(mature.clone(), premature));
        }
        graph.add_edge(evidence_edge(mature, target_node(&target), &evidence));
    }
    info!(
        nodes = graph.number_of_nodes(),
        edges = graph.number_of_edges(),
        "exported cache as graph"
    );
    Ok(graph)
}

/// The graph node for a cached miRNA: mature miRBase when mapped, otherwise
/// the miRTarBase name.
pub fn mirna_node(mirna: &Mirna) -> Node {
    match &mirna.mirbase_mature_id {
        Some(mature_id) => Node::micro_rna(
            Namespace::MirbaseMature.prefix(),
            Some(mirna.mirtarbase_name.clone()),
            Some(mature_id.clone()),
        ),
        None => Node::micro_rna(
            Namespace::Mirtarbase.prefix(),
            Some(mirna.mirtarbase_name.clone()),
            None,
        ),
    }
}

fn premature_node(mirna: &Mirna) -> Option<Node> {
    mirna.mirbase_id.as_ref().map(|mirbase_id| {
        Node::micro_rna(
            Namespace::Mirbase.prefix(),
            mirna.mirbase_name.clone(),
            Some(mirbase_id.clone()),
        )
    })
}

pub fn target_node(target: &Target) -> Node {
    Node::rna(
        Namespace::Entrez.prefix(),
        Some(target.gene_name.clone()),
        Some(target.entrez_identifier.clone()),
    )
}

pub fn evidence_edge(source: Node, target: Node, evidence: &Evidence) -> Edge {
    let mut annotations = BTreeMap::new();
    let experiments: BTreeSet<String> = split_experiments(&evidence.experiment)
        .into_iter()
        .map(str::to_string)
        .collect();
    if !experiments.is_empty() {
        annotations.insert("experiments".to_string(), experiments);
    }
    if !evidence.support.is_empty() {
        annotations.insert(
            "support".to_string(),
            BTreeSet::from([evidence.support.clone()]),
        );
    }
    Edge {
        source,
        target,
        relation: Relation::Decreases,
        citation: (!evidence.reference.is_empty()).then(|| Citation::pubmed(&evidence.reference)),
        evidence: Some(EVIDENCE_TEXT.to_string()),
        annotations,
    }
}

fn resolve_mirnas(
    cache: &Cache,
    namespace: &Namespace,
    node: &Node,
) -> Result<Vec<Mirna>, MirtarbaseError> {
    let identifier = node.identifier.as_deref();
    let name = node.name.as_deref();
    let found = match namespace {
        Namespace::Mirtarbase => match (identifier, name) {
            (Some(identifier), _) if identifier.parse::<MirtarbaseId>().is_ok() => {
                cache.find_mirna_by_interaction(identifier)?
            }
            (Some(identifier), _) => cache.find_mirna_by_identifier(identifier)?,
            (None, Some(name)) => cache.find_mirna_by_name(name)?,
            (None, None) => None,
        },
        Namespace::MirbaseMature => match (identifier, name) {
            (Some(identifier), _) => cache.find_mirna_by_mirbase_mature_id(identifier)?,
            (None, Some(name)) => cache.find_mirna_by_name(name)?,
            (None, None) => None,
        },
        Namespace::Mirbase => {
            let Some(identifier) = identifier else {
                debug!(node = %node.label(), "premature miRNA without identifier");
                return Ok(Vec::new());
            };
            return cache.find_mirnas_by_mirbase_id(identifier);
        }
        _ => None,
    };
    Ok(found.into_iter().collect())
}

fn resolve_target(
    cache: &Cache,
    namespace: &Namespace,
    node: &Node,
) -> Result<Option<Target>, MirtarbaseError> {
    let identifier = node.identifier.as_deref();
    let name = node.name.as_deref();
    match namespace {
        Namespace::Hgnc => match (identifier, name) {
            (Some(identifier), _) => cache.find_target_by_hgnc_identifier(identifier),
            (None, Some(symbol)) => cache.find_target_by_hgnc_symbol(symbol),
            (None, None) => Ok(None),
        },
        Namespace::Entrez => match identifier.or(name) {
            Some(entrez_id) => cache.find_target_by_entrez(entrez_id),
            None => Ok(None),
        },
        _ => Ok(None),
    }
}
