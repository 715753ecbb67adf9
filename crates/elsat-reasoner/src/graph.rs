//! 完備化グラフ (completion graph)
//!
//! ノードと辺は追加のみで、削除・変更は行わない。

use std::collections::{HashMap, HashSet};
use std::fmt;

use elsat_core::{Concept, Role};
use serde::Serialize;

/// Dense node identity within one completion graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// The node seeded with the query concept
    pub const ROOT: NodeId = NodeId(0);

    pub(crate) fn new(index: usize) -> Self {
        NodeId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Role-labelled edge to a successor node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub role: Role,
    pub target: NodeId,
}

/// Completion graph node
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    /// Implication set in insertion order
    concepts: Vec<Concept>,
    members: HashSet<Concept>,
    /// Outgoing edges in insertion order
    edges: Vec<Edge>,
    edge_set: HashSet<Edge>,
}

impl Node {
    fn new(id: NodeId, seed: Concept) -> Self {
        let mut node = Self {
            id,
            concepts: Vec::new(),
            members: HashSet::new(),
            edges: Vec::new(),
            edge_set: HashSet::new(),
        };
        node.append(seed);
        node
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The concept the node was created with
    pub fn seed(&self) -> &Concept {
        &self.concepts[0]
    }

    pub fn contains(&self, concept: &Concept) -> bool {
        self.members.contains(concept)
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn has_edge(&self, role: &Role, target: NodeId) -> bool {
        self.edge_set.contains(&Edge {
            role: role.clone(),
            target,
        })
    }

    fn append(&mut self, concept: Concept) -> bool {
        if self.members.insert(concept.clone()) {
            self.concepts.push(concept);
            true
        } else {
            false
        }
    }

    fn append_edge(&mut self, edge: Edge) -> bool {
        if self.edge_set.insert(edge.clone()) {
            self.edges.push(edge);
            true
        } else {
            false
        }
    }
}

/// All nodes created while answering a single query
#[derive(Debug, Clone)]
pub struct CompletionGraph {
    nodes: Vec<Node>,
    /// Node seeded with each concept
    seeds: HashMap<Concept, NodeId>,
    concept_count: usize,
    edge_count: usize,
}

impl CompletionGraph {
    /// Create a graph whose root node holds only `query`
    pub fn with_root(query: Concept) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            seeds: HashMap::new(),
            concept_count: 0,
            edge_count: 0,
        };
        graph.add_node(query);
        graph
    }

    pub fn root(&self) -> &Node {
        &self.nodes[NodeId::ROOT.0]
    }

    /// Node lookup; ids are only minted by this graph, so they are always valid
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn concept_count(&self) -> usize {
        self.concept_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Append a fresh node seeded with `seed`
    pub fn add_node(&mut self, seed: Concept) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.seeds.entry(seed.clone()).or_insert(id);
        self.nodes.push(Node::new(id, seed));
        self.concept_count += 1;
        id
    }

    /// Add `concept` to the implication set of `id`; false if already present
    pub fn add_concept(&mut self, id: NodeId, concept: Concept) -> bool {
        let added = self.nodes[id.0].append(concept);
        if added {
            self.concept_count += 1;
        }
        added
    }

    /// Add the `(role, target)` edge from `id`; false if it already exists
    pub fn add_edge(&mut self, id: NodeId, role: Role, target: NodeId) -> bool {
        let added = self.nodes[id.0].append_edge(Edge { role, target });
        if added {
            self.edge_count += 1;
        }
        added
    }

    /// The lowest-id node whose implication set contains `concept`
    pub fn find_node_containing(&self, concept: &Concept) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|node| node.contains(concept))
            .map(Node::id)
    }

    /// The node created with `concept` as its seed, if any
    pub fn find_node_seeded_with(&self, concept: &Concept) -> Option<NodeId> {
        self.seeds.get(concept).copied()
    }

    /// Whether `id` has a `role`-edge to some node containing `concept`
    pub fn has_successor_with(&self, id: NodeId, role: &Role, concept: &Concept) -> bool {
        self.nodes[id.0]
            .edges
            .iter()
            .any(|edge| edge.role == *role && self.nodes[edge.target.0].contains(concept))
    }
}
