//! 飽和エンジン
//!
//! クエリ概念を根ノードに置き、変化がなくなるまでラウンドを繰り返す。

use std::time::{Duration, Instant};

use elsat_core::{Concept, ConceptName, OntologyStore};
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::config::ReasonerConfig;
use crate::graph::{CompletionGraph, Node, NodeId};
use crate::index::TBoxIndex;
use crate::order::{OrderPolicy, RoundOrder};
use crate::rules::{rule, RuleContext};
use crate::Result;

/// Round-by-round driver for a single query
pub struct Saturator<'a> {
    graph: CompletionGraph,
    ctx: RuleContext<'a>,
    order: RoundOrder,
    rounds: usize,
}

impl<'a> Saturator<'a> {
    pub fn new(
        store: &'a OntologyStore,
        index: &'a TBoxIndex,
        query: Concept,
        policy: &OrderPolicy,
    ) -> Self {
        Self {
            ctx: RuleContext::new(index, store, &query),
            graph: CompletionGraph::with_root(query),
            order: policy.rounds(),
            rounds: 0,
        }
    }

    /// Apply all five rules to every node once; returns whether anything changed.
    ///
    /// Nodes created during the round are visited before it ends.
    pub fn run_round(&mut self) -> bool {
        let order = self.order.next_round();
        self.rounds += 1;

        let mut changed = false;
        let mut i = 0;
        while i < self.graph.len() {
            let node = NodeId::new(i);
            for id in order {
                let rule = rule(id);
                if rule.apply(node, &mut self.graph, &self.ctx) {
                    trace!("{} ({}) extended {}", id, rule.name(), node);
                    changed = true;
                }
            }
            i += 1;
        }

        debug!(
            "Round {} ({:?}): changed={}, nodes={}, concepts={}",
            self.rounds,
            order,
            changed,
            self.graph.len(),
            self.graph.concept_count()
        );
        changed
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn graph(&self) -> &CompletionGraph {
        &self.graph
    }

    pub fn into_graph(self) -> CompletionGraph {
        self.graph
    }
}

/// Saturation statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaturationStats {
    /// Rounds run, including the final clean one
    pub rounds: usize,
    pub nodes: usize,
    pub edges: usize,
    /// Concepts across all implication sets
    pub concepts: usize,
    pub reached_fixpoint: bool,
    pub elapsed: Duration,
}

/// Result of one query
#[derive(Debug, Clone)]
pub struct Saturation {
    pub graph: CompletionGraph,
    pub stats: SaturationStats,
}

impl Saturation {
    pub fn root(&self) -> &Node {
        self.graph.root()
    }

    /// Node 0's implication set in derivation order
    pub fn subsumers(&self) -> &[Concept] {
        self.graph.root().concepts()
    }

    /// Named subsumers, sorted by IRI
    pub fn named_subsumers(&self) -> Vec<&ConceptName> {
        let mut names: Vec<&ConceptName> = self
            .subsumers()
            .iter()
            .filter_map(Concept::as_name)
            .collect();
        names.sort();
        names
    }
}

/// Shared, read-only entry point for subsumer queries
#[derive(Debug, Clone, Copy)]
pub struct SaturationEngine<'a> {
    store: &'a OntologyStore,
    index: &'a TBoxIndex,
    max_rounds: Option<usize>,
}

impl<'a> SaturationEngine<'a> {
    pub fn new(store: &'a OntologyStore, index: &'a TBoxIndex, config: &ReasonerConfig) -> Self {
        Self {
            store,
            index,
            max_rounds: config.max_rounds,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: Option<usize>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn store(&self) -> &'a OntologyStore {
        self.store
    }

    pub fn index(&self) -> &'a TBoxIndex {
        self.index
    }

    /// Saturate a graph rooted at `query` and return it with node 0 holding the subsumers
    pub fn find_subsumers(&self, query: &Concept, policy: &OrderPolicy) -> Result<Saturation> {
        self.store.resolve(query)?;

        let start = Instant::now();
        let mut saturator = Saturator::new(self.store, self.index, query.clone(), policy);

        let reached_fixpoint = loop {
            if self.max_rounds.map_or(false, |max| saturator.rounds() >= max) {
                break false;
            }
            if !saturator.run_round() {
                break true;
            }
        };

        let rounds = saturator.rounds();
        let graph = saturator.into_graph();
        let stats = SaturationStats {
            rounds,
            nodes: graph.len(),
            edges: graph.edge_count(),
            concepts: graph.concept_count(),
            reached_fixpoint,
            elapsed: start.elapsed(),
        };

        if reached_fixpoint {
            info!(
                "Saturated {} in {} rounds: {} subsumers, {} nodes",
                query,
                stats.rounds,
                graph.root().len(),
                stats.nodes
            );
        } else {
            info!(
                "Stopped {} after {} rounds without reaching the fixpoint",
                query, stats.rounds
            );
        }

        Ok(Saturation { graph, stats })
    }

    /// Resolve `name` through the ontology store, then saturate
    pub fn find_subsumers_by_name(&self, name: &str, policy: &OrderPolicy) -> Result<Saturation> {
        let query = self.store.concept_by_name(name)?;
        self.find_subsumers(&query, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReasonerError;
    use elsat_core::{Axiom, Role};

    fn name(s: &str) -> Concept {
        Concept::named(s)
    }

    #[test]
    fn test_chain_of_inclusions() {
        let store = OntologyStore::from_axioms(vec![
            Axiom::inclusion(name("A"), name("B")),
            Axiom::inclusion(name("B"), name("C")),
        ]);
        let index = TBoxIndex::from_store(&store);
        let engine = SaturationEngine::new(&store, &index, &ReasonerConfig::default());

        let result = engine.find_subsumers(&name("A"), &OrderPolicy::default()).unwrap();

        assert_eq!(result.subsumers(), &[name("A"), name("B"), name("C")]);
        assert!(result.stats.reached_fixpoint);
        assert_eq!(result.stats.nodes, 1);
    }

    #[test]
    fn test_cyclic_tbox_terminates() {
        let r = Role::new("r");
        let store = OntologyStore::from_axioms(vec![Axiom::inclusion(
            name("A"),
            Concept::existential(r.clone(), name("A")),
        )]);
        let index = TBoxIndex::from_store(&store);
        let engine = SaturationEngine::new(&store, &index, &ReasonerConfig::default());

        let result = engine.find_subsumers(&name("A"), &OrderPolicy::randomized(3)).unwrap();

        assert!(result.stats.reached_fixpoint);
        assert_eq!(result.stats.nodes, 1);
        assert!(result.root().has_edge(&r, NodeId::ROOT));
        let nested = Concept::existential(r.clone(), Concept::existential(r, name("A")));
        assert!(result.root().contains(&nested));
        assert_eq!(result.root().len(), 3);
    }

    #[test]
    fn test_round_bound_gives_partial_result() {
        let store = OntologyStore::from_axioms(vec![
            Axiom::inclusion(name("A"), name("B")),
            Axiom::inclusion(name("B"), name("C")),
            Axiom::inclusion(name("C"), name("D")),
        ]);
        let index = TBoxIndex::from_store(&store);
        let config = ReasonerConfig {
            max_rounds: Some(1),
            ..Default::default()
        };
        let engine = SaturationEngine::new(&store, &index, &config);

        let partial = engine.find_subsumers(&name("A"), &OrderPolicy::default()).unwrap();
        let full = engine
            .with_max_rounds(None)
            .find_subsumers(&name("A"), &OrderPolicy::default())
            .unwrap();

        assert!(!partial.stats.reached_fixpoint);
        assert_eq!(partial.stats.rounds, 1);
        assert!(partial.subsumers().iter().all(|c| full.root().contains(c)));
        assert!(partial.subsumers().len() < full.subsumers().len());
    }

    #[test]
    fn test_unknown_concept() {
        let store = OntologyStore::from_axioms(vec![Axiom::inclusion(name("A"), name("B"))]);
        let index = TBoxIndex::from_store(&store);
        let engine = SaturationEngine::new(&store, &index, &ReasonerConfig::default());

        let err = engine.find_subsumers(&name("Z"), &OrderPolicy::default()).unwrap_err();
        assert!(matches!(err, ReasonerError::UnknownConcept(ref n) if n == "Z"));

        let err = engine.find_subsumers_by_name("Missing", &OrderPolicy::default()).unwrap_err();
        assert!(matches!(err, ReasonerError::UnknownConcept(_)));
    }

    #[test]
    fn test_saturator_rounds() {
        let store = OntologyStore::from_axioms(vec![Axiom::inclusion(name("A"), name("B"))]);
        let index = TBoxIndex::from_store(&store);
        let mut saturator = Saturator::new(&store, &index, name("A"), &OrderPolicy::default());

        assert!(saturator.run_round());
        assert!(!saturator.run_round());
        assert_eq!(saturator.rounds(), 2);
        assert!(saturator.graph().root().contains(&name("B")));
    }
}
