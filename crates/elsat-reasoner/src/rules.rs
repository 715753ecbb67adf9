//! 完備化規則 (R1–R5)
//!
//! 各規則は一つのノードを検査し、概念・ノード・辺を追加するのみ。
//! 適用順序は到達ラウンド数にのみ影響し、最終結果には影響しない。

use std::collections::HashSet;
use std::fmt;

use elsat_core::{Concept, OntologyStore, Role};
use serde::Serialize;
use tracing::trace;

use crate::graph::{CompletionGraph, NodeId};
use crate::index::TBoxIndex;

/// Identifier of a completion rule; `index()` is the 0-based position used in rule orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RuleId {
    R1,
    R2,
    R3,
    R4,
    R5,
}

impl RuleId {
    pub const ALL: [RuleId; 5] = [RuleId::R1, RuleId::R2, RuleId::R3, RuleId::R4, RuleId::R5];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.index() + 1)
    }
}

/// Read-only state shared by every rule application of one query
pub struct RuleContext<'a> {
    pub index: &'a TBoxIndex,
    pub store: &'a OntologyStore,
    query_subexpressions: HashSet<Concept>,
}

impl<'a> RuleContext<'a> {
    pub fn new(index: &'a TBoxIndex, store: &'a OntologyStore, query: &Concept) -> Self {
        Self {
            index,
            store,
            query_subexpressions: query.subexpressions().into_iter().collect(),
        }
    }

    /// Fillers R4 may wrap into a new existential restriction.
    ///
    /// Only sub-expressions of the TBox or of the query qualify, which keeps
    /// the set of derivable concepts finite on cyclic terminologies.
    pub fn admits_filler(&self, concept: &Concept) -> bool {
        self.index.occurs(concept) || self.query_subexpressions.contains(concept)
    }
}

/// A completion rule applied to one node at a time
pub trait CompletionRule: Send + Sync {
    fn id(&self) -> RuleId;

    fn name(&self) -> &'static str;

    /// Apply the rule to `node`; returns whether anything was added
    fn apply(&self, node: NodeId, graph: &mut CompletionGraph, ctx: &RuleContext<'_>) -> bool;
}

fn add_all(rule: RuleId, graph: &mut CompletionGraph, node: NodeId, concepts: Vec<Concept>) -> bool {
    let mut changed = false;
    for concept in concepts {
        if graph.add_concept(node, concept.clone()) {
            trace!("{} added {} to {}", rule, concept, node);
            changed = true;
        }
    }
    changed
}

/// R1: C ⊓ D in a node yields C and D
pub struct ConjunctDecomposition;

impl CompletionRule for ConjunctDecomposition {
    fn id(&self) -> RuleId {
        RuleId::R1
    }

    fn name(&self) -> &'static str {
        "conjunct-decomposition"
    }

    fn apply(&self, node: NodeId, graph: &mut CompletionGraph, _ctx: &RuleContext<'_>) -> bool {
        let n = graph.node(node);
        let conjuncts = n
            .concepts()
            .iter()
            .filter_map(Concept::as_conjunction)
            .flat_map(|(left, right)| [left, right])
            .filter(|conjunct| !n.contains(conjunct))
            .cloned()
            .collect();
        add_all(self.id(), graph, node, conjuncts)
    }
}

/// R2: C and D in a node yield C ⊓ D when that conjunction occurs in the TBox
pub struct ConjunctionIntroduction;

impl CompletionRule for ConjunctionIntroduction {
    fn id(&self) -> RuleId {
        RuleId::R2
    }

    fn name(&self) -> &'static str {
        "conjunction-introduction"
    }

    fn apply(&self, node: NodeId, graph: &mut CompletionGraph, ctx: &RuleContext<'_>) -> bool {
        let n = graph.node(node);
        let introduced = ctx
            .index
            .conjunctions()
            .iter()
            .filter(|conjunction| !n.contains(conjunction))
            .filter(|conjunction| {
                conjunction
                    .as_conjunction()
                    .map_or(false, |(left, right)| n.contains(left) && n.contains(right))
            })
            .cloned()
            .collect();
        add_all(self.id(), graph, node, introduced)
    }
}

/// R3: ∃r.C in a node yields an r-edge to the node seeded with C
pub struct ExistentialEdgeCreation;

impl CompletionRule for ExistentialEdgeCreation {
    fn id(&self) -> RuleId {
        RuleId::R3
    }

    fn name(&self) -> &'static str {
        "existential-edge-creation"
    }

    fn apply(&self, node: NodeId, graph: &mut CompletionGraph, _ctx: &RuleContext<'_>) -> bool {
        let restrictions: Vec<(Role, Concept)> = graph
            .node(node)
            .concepts()
            .iter()
            .filter_map(Concept::as_existential)
            .map(|(role, filler)| (role.clone(), filler.clone()))
            .collect();

        let mut changed = false;
        for (role, filler) in restrictions {
            if graph.has_successor_with(node, &role, &filler) {
                continue;
            }
            let target = match graph.find_node_seeded_with(&filler) {
                Some(existing) => existing,
                None => {
                    let fresh = graph.add_node(filler.clone());
                    trace!("{} created {} for {}", self.id(), fresh, filler);
                    fresh
                }
            };
            trace!("{} linked {} -{}-> {}", self.id(), node, role.short_form(), target);
            changed |= graph.add_edge(node, role, target);
        }
        changed
    }
}

/// R4: an r-edge to a node containing C yields ∃r.C
pub struct ExistentialPropagation;

impl CompletionRule for ExistentialPropagation {
    fn id(&self) -> RuleId {
        RuleId::R4
    }

    fn name(&self) -> &'static str {
        "existential-propagation"
    }

    fn apply(&self, node: NodeId, graph: &mut CompletionGraph, ctx: &RuleContext<'_>) -> bool {
        let n = graph.node(node);
        let mut propagated = Vec::new();
        for edge in n.edges() {
            for filler in graph.node(edge.target).concepts() {
                if !ctx.admits_filler(filler) {
                    continue;
                }
                let restriction = ctx.store.mint_existential(edge.role.clone(), filler.clone());
                if !n.contains(&restriction) {
                    propagated.push(restriction);
                }
            }
        }
        add_all(self.id(), graph, node, propagated)
    }
}

/// R5: C in a node and C ⊑ D in the TBox yield D
pub struct InclusionApplication;

impl CompletionRule for InclusionApplication {
    fn id(&self) -> RuleId {
        RuleId::R5
    }

    fn name(&self) -> &'static str {
        "inclusion-application"
    }

    fn apply(&self, node: NodeId, graph: &mut CompletionGraph, ctx: &RuleContext<'_>) -> bool {
        let n = graph.node(node);
        let superclasses = n
            .concepts()
            .iter()
            .flat_map(|lhs| ctx.index.told_superclasses(lhs))
            .filter(|rhs| !n.contains(rhs))
            .cloned()
            .collect();
        add_all(self.id(), graph, node, superclasses)
    }
}

static RULES: [&'static dyn CompletionRule; 5] = [
    &ConjunctDecomposition,
    &ConjunctionIntroduction,
    &ExistentialEdgeCreation,
    &ExistentialPropagation,
    &InclusionApplication,
];

/// Rule registry lookup
pub fn rule(id: RuleId) -> &'static dyn CompletionRule {
    RULES[id.index()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use elsat_core::{Axiom, Inclusion};

    fn name(s: &str) -> Concept {
        Concept::named(s)
    }

    fn setup(axioms: Vec<Axiom>) -> (OntologyStore, TBoxIndex) {
        let store = OntologyStore::from_axioms(axioms);
        let index = TBoxIndex::from_store(&store);
        (store, index)
    }

    /// Apply once expecting a change, then again expecting none
    fn apply_to_fixpoint(id: RuleId, graph: &mut CompletionGraph, ctx: &RuleContext<'_>) -> bool {
        let changed = rule(id).apply(NodeId::ROOT, graph, ctx);
        while rule(id).apply(NodeId::ROOT, graph, ctx) {}
        assert!(!rule(id).apply(NodeId::ROOT, graph, ctx));
        changed
    }

    #[test]
    fn test_rule_ids_round_trip_indices() {
        for (i, id) in RuleId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(RuleId::from_index(i), Some(*id));
            assert_eq!(rule(*id).id(), *id);
        }
        assert_eq!(RuleId::from_index(5), None);
        assert_eq!(RuleId::R3.to_string(), "R3");
    }

    #[test]
    fn test_r1_decomposes_conjunctions() {
        let (store, index) = setup(vec![]);
        let query = Concept::conjunction(name("A"), name("B"));
        let ctx = RuleContext::new(&index, &store, &query);
        let mut graph = CompletionGraph::with_root(query);

        assert!(apply_to_fixpoint(RuleId::R1, &mut graph, &ctx));
        assert!(graph.root().contains(&name("A")));
        assert!(graph.root().contains(&name("B")));
    }

    #[test]
    fn test_r2_only_introduces_known_conjunctions() {
        let known = Concept::conjunction(name("B"), name("C"));
        let (store, index) = setup(vec![Axiom::inclusion(known.clone(), name("D"))]);
        let ctx = RuleContext::new(&index, &store, &name("A"));
        let mut graph = CompletionGraph::with_root(name("A"));
        graph.add_concept(NodeId::ROOT, name("B"));

        assert!(!rule(RuleId::R2).apply(NodeId::ROOT, &mut graph, &ctx));

        graph.add_concept(NodeId::ROOT, name("C"));
        assert!(apply_to_fixpoint(RuleId::R2, &mut graph, &ctx));
        assert!(graph.root().contains(&known));
        assert!(!graph.root().contains(&Concept::conjunction(name("C"), name("B"))));
        assert!(!graph.root().contains(&Concept::conjunction(name("A"), name("B"))));
    }

    #[test]
    fn test_r2_handles_self_conjunction() {
        let known = Concept::conjunction(name("A"), name("A"));
        let (store, index) = setup(vec![Axiom::inclusion(known.clone(), name("D"))]);
        let ctx = RuleContext::new(&index, &store, &name("A"));
        let mut graph = CompletionGraph::with_root(name("A"));

        assert!(apply_to_fixpoint(RuleId::R2, &mut graph, &ctx));
        assert!(graph.root().contains(&known));
    }

    #[test]
    fn test_r3_creates_and_reuses_successors() {
        let r = Role::new("r");
        let s = Role::new("s");
        let (store, index) = setup(vec![]);
        let query = Concept::conjunction(
            Concept::existential(r.clone(), name("B")),
            Concept::existential(s.clone(), name("B")),
        );
        let ctx = RuleContext::new(&index, &store, &query);
        let mut graph = CompletionGraph::with_root(query);
        rule(RuleId::R1).apply(NodeId::ROOT, &mut graph, &ctx);

        assert!(apply_to_fixpoint(RuleId::R3, &mut graph, &ctx));
        assert_eq!(graph.len(), 2);

        let successor = graph.find_node_seeded_with(&name("B")).unwrap();
        assert!(graph.root().has_edge(&r, successor));
        assert!(graph.root().has_edge(&s, successor));
        assert_eq!(graph.root().edges().len(), 2);
    }

    #[test]
    fn test_r3_reuses_root_for_self_loops() {
        let r = Role::new("r");
        let some = Concept::existential(r.clone(), name("A"));
        let (store, index) = setup(vec![Axiom::inclusion(name("A"), some.clone())]);
        let ctx = RuleContext::new(&index, &store, &name("A"));
        let mut graph = CompletionGraph::with_root(name("A"));
        graph.add_concept(NodeId::ROOT, some);

        assert!(apply_to_fixpoint(RuleId::R3, &mut graph, &ctx));
        assert_eq!(graph.len(), 1);
        assert!(graph.root().has_edge(&r, NodeId::ROOT));
    }

    #[test]
    fn test_r3_reports_change_only_for_new_edges() {
        let r = Role::new("r");
        let (store, index) = setup(vec![]);
        let query = Concept::existential(r.clone(), name("B"));
        let ctx = RuleContext::new(&index, &store, &query);
        let mut graph = CompletionGraph::with_root(query);

        let before = graph.edge_count();
        assert!(rule(RuleId::R3).apply(NodeId::ROOT, &mut graph, &ctx));
        assert_eq!(graph.edge_count(), before + 1);

        assert!(!rule(RuleId::R3).apply(NodeId::ROOT, &mut graph, &ctx));
        assert_eq!(graph.edge_count(), before + 1);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_rule_names_are_distinct() {
        let names: HashSet<&str> = RuleId::ALL.iter().map(|id| rule(*id).name()).collect();
        assert_eq!(names.len(), RuleId::ALL.len());
    }

    #[test]
    fn test_r4_propagates_admitted_fillers() {
        let r = Role::new("r");
        let (store, index) = setup(vec![Axiom::inclusion(
            Concept::existential(r.clone(), name("C")),
            name("D"),
        )]);
        let ctx = RuleContext::new(&index, &store, &name("A"));
        let mut graph = CompletionGraph::with_root(name("A"));
        let b = graph.add_node(name("B"));
        graph.add_concept(b, name("C"));
        graph.add_edge(NodeId::ROOT, r.clone(), b);

        assert!(apply_to_fixpoint(RuleId::R4, &mut graph, &ctx));
        assert!(graph.root().contains(&Concept::existential(r.clone(), name("C"))));
        // B occurs neither in the TBox nor in the query
        assert!(!graph.root().contains(&Concept::existential(r, name("B"))));
    }

    #[test]
    fn test_r5_applies_told_subsumptions() {
        let (store, index) = setup(vec![
            Axiom::Inclusion(Inclusion::new(name("A"), name("B"))),
            Axiom::inclusion(name("B"), name("C")),
        ]);
        let ctx = RuleContext::new(&index, &store, &name("A"));
        let mut graph = CompletionGraph::with_root(name("A"));

        assert!(rule(RuleId::R5).apply(NodeId::ROOT, &mut graph, &ctx));
        assert!(graph.root().contains(&name("B")));
        assert!(!graph.root().contains(&name("C")));

        assert!(rule(RuleId::R5).apply(NodeId::ROOT, &mut graph, &ctx));
        assert!(graph.root().contains(&name("C")));
        assert!(!rule(RuleId::R5).apply(NodeId::ROOT, &mut graph, &ctx));
    }
}
