//! A small BEL-style knowledge graph: typed, namespaced nodes and
//! relations carrying a citation, an evidence text and annotations.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Function {
    #[serde(rename = "RNA")]
    Rna,
    #[serde(rename = "miRNA")]
    MicroRna,
    #[serde(rename = "Gene")]
    Gene,
    #[serde(rename = "Protein")]
    Protein,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Node {
    pub function: Function,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl Node {
    pub fn new(
        function: Function,
        namespace: impl Into<String>,
        name: Option<String>,
        identifier: Option<String>,
    ) -> Self {
        Self {
            function,
            namespace: namespace.into(),
            name,
            identifier,
        }
    }

    pub fn rna(namespace: impl Into<String>, name: Option<String>, identifier: Option<String>) -> Self {
        Self::new(Function::Rna, namespace, name, identifier)
    }

    pub fn micro_rna(
        namespace: impl Into<String>,
        name: Option<String>,
        identifier: Option<String>,
    ) -> Self {
        Self::new(Function::MicroRna, namespace, name, identifier)
    }

    /// `miRNA(mirbase.mature:MIMAT0000075 ! hsa-miR-20a-5p)`
    pub fn label(&self) -> String {
        let function = match self.function {
            Function::Rna => "r",
            Function::MicroRna => "m",
            Function::Gene => "g",
            Function::Protein => "p",
        };
        match (&self.identifier, &self.name) {
            (Some(identifier), Some(name)) => {
                format!("{function}({}:{identifier} ! {name})", self.namespace)
            }
            (Some(value), None) | (None, Some(value)) => {
                format!("{function}({}:{value})", self.namespace)
            }
            (None, None) => format!("{function}({})", self.namespace),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Relation {
    Decreases,
    IsA,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Citation {
    pub namespace: String,
    pub identifier: String,
}

impl Citation {
    pub fn pubmed(identifier: impl Into<String>) -> Self {
        Self {
            namespace: "pubmed".to_string(),
            identifier: identifier.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub source: Node,
    pub target: Node,
    pub relation: Relation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<Citation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, BTreeSet<String>>,
}

impl Edge {
    pub fn is_a(child: Node, parent: Node) -> Self {
        Self {
            source: child,
            target: parent,
            relation: Relation::IsA,
            citation: None,
            evidence: None,
            annotations: BTreeMap::new(),
        }
    }
}

/// The collaborator interface enrichment writes through.
pub trait KnowledgeGraph {
    fn nodes(&self) -> Vec<Node>;
    /// Returns `false` when the node was already present.
    fn add_node(&mut self, node: Node) -> bool;
    /// Adds both endpoints if needed. Returns `false` for an identical edge.
    fn add_edge(&mut self, edge: Edge) -> bool;
    fn number_of_nodes(&self) -> usize;
    fn number_of_edges(&self) -> usize;
}

#[derive(Debug, Clone, Default)]
pub struct BelGraph {
    name: Option<String>,
    version: Option<String>,
    nodes: Vec<Node>,
    node_index: HashMap<Node, usize>,
    edges: Vec<Edge>,
    edge_index: HashSet<Edge>,
}

impl BelGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            version: Some(version.into()),
            ..Self::default()
        }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edges_from<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| &edge.source == node)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let edges = self
            .edges
            .iter()
            .map(|edge| SerializedEdge {
                source: self.node_index[&edge.source],
                target: self.node_index[&edge.target],
                relation: edge.relation,
                citation: edge.citation.as_ref(),
                evidence: edge.evidence.as_deref(),
                annotations: &edge.annotations,
            })
            .collect();
        let graph = SerializedGraph {
            name: self.name.as_deref(),
            version: self.version.as_deref(),
            nodes: &self.nodes,
            edges,
        };
        serde_json::to_value(graph).unwrap_or(serde_json::Value::Null)
    }
}

impl KnowledgeGraph for BelGraph {
    fn nodes(&self) -> Vec<Node> {
        self.nodes.clone()
    }

    fn add_node(&mut self, node: Node) -> bool {
        if self.node_index.contains_key(&node) {
            return false;
        }
        self.node_index.insert(node.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    fn add_edge(&mut self, edge: Edge) -> bool {
        if self.edge_index.contains(&edge) {
            return false;
        }
        self.add_node(edge.source.clone());
        self.add_node(edge.target.clone());
        self.edge_index.insert(edge.clone());
        self.edges.push(edge);
        true
    }

    fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn number_of_edges(&self) -> usize {
        self.edges.len()
    }
}

#[derive(Serialize)]
struct SerializedGraph<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    nodes: &'a [Node],
    edges: Vec<SerializedEdge<'a>>,
}

#[derive(Serialize)]
struct SerializedEdge<'a> {
    source: usize,
    target: usize,
    relation: Relation,
    #[serde(skip_serializing_if = "Option::is_none")]
    citation: Option<&'a Citation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    evidence: Option<&'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    annotations: &'a BTreeMap<String, BTreeSet<String>>,
}
