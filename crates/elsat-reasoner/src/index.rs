//! TBox インデックス

use std::collections::{HashMap, HashSet};

use elsat_core::{Concept, Inclusion, OntologyStore, Variant};
use tracing::debug;

/// Immutable, preprocessed view of the TBox used by the completion rules
#[derive(Debug, Clone, Default)]
pub struct TBoxIndex {
    inclusions: Vec<Inclusion>,
    /// Conjunctions in first-occurrence order
    conjunctions: Vec<Concept>,
    known_conjunctions: HashSet<Concept>,
    told_superclasses: HashMap<Concept, Vec<Concept>>,
    subexpressions: HashSet<Concept>,
}

impl TBoxIndex {
    /// Index inclusion axioms (equivalences must already be rewritten)
    pub fn build(inclusions: impl IntoIterator<Item = Inclusion>) -> Self {
        let mut index = Self::default();

        for inclusion in inclusions {
            for side in [&inclusion.lhs, &inclusion.rhs] {
                for sub in side.subexpressions() {
                    if sub.variant() == Variant::Conjunction && index.known_conjunctions.insert(sub.clone()) {
                        index.conjunctions.push(sub.clone());
                    }
                    index.subexpressions.insert(sub);
                }
            }

            let supers = index.told_superclasses.entry(inclusion.lhs.clone()).or_default();
            if !supers.contains(&inclusion.rhs) {
                supers.push(inclusion.rhs.clone());
            }
            index.inclusions.push(inclusion);
        }

        debug!(
            "TBox index built: {} inclusions, {} conjunctions, {} subexpressions",
            index.inclusions.len(),
            index.conjunctions.len(),
            index.subexpressions.len()
        );
        index
    }

    pub fn from_store(store: &OntologyStore) -> Self {
        Self::build(store.inclusions())
    }

    pub fn inclusions(&self) -> &[Inclusion] {
        &self.inclusions
    }

    /// Every conjunction occurring anywhere inside any axiom
    pub fn known_conjunctions(&self) -> &HashSet<Concept> {
        &self.known_conjunctions
    }

    /// Known conjunctions in a stable order
    pub fn conjunctions(&self) -> &[Concept] {
        &self.conjunctions
    }

    pub fn is_known_conjunction(&self, concept: &Concept) -> bool {
        self.known_conjunctions.contains(concept)
    }

    /// Right-hand sides of every inclusion whose left-hand side is `lhs`
    pub fn told_superclasses(&self, lhs: &Concept) -> &[Concept] {
        self.told_superclasses
            .get(lhs)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `concept` occurs as a sub-expression of some axiom
    pub fn occurs(&self, concept: &Concept) -> bool {
        self.subexpressions.contains(concept)
    }

    pub fn subexpression_count(&self) -> usize {
        self.subexpressions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elsat_core::{Axiom, Role};

    fn name(s: &str) -> Concept {
        Concept::named(s)
    }

    #[test]
    fn test_known_conjunctions_are_found_recursively() {
        let r = Role::new("r");
        let inner = Concept::conjunction(name("B"), name("C"));
        let nested = Concept::conjunction(inner.clone(), name("D"));
        let in_filler = Concept::conjunction(name("E"), name("F"));

        let index = TBoxIndex::build(vec![
            Inclusion::new(name("A"), nested.clone()),
            Inclusion::new(Concept::existential(r, in_filler.clone()), name("G")),
        ]);

        assert_eq!(index.known_conjunctions().len(), 3);
        assert!(index.is_known_conjunction(&inner));
        assert!(index.is_known_conjunction(&nested));
        assert!(index.is_known_conjunction(&in_filler));
        assert!(!index.is_known_conjunction(&Concept::conjunction(name("C"), name("B"))));
    }

    #[test]
    fn test_equivalences_from_store_are_rewritten() {
        let store = OntologyStore::from_axioms(vec![Axiom::equivalence(name("A"), name("B"))]);
        let index = TBoxIndex::from_store(&store);

        assert_eq!(index.inclusions().len(), 2);
        assert_eq!(index.told_superclasses(&name("A")), &[name("B")]);
        assert_eq!(index.told_superclasses(&name("B")), &[name("A")]);
        assert!(index.told_superclasses(&name("C")).is_empty());
    }

    #[test]
    fn test_subexpressions() {
        let r = Role::new("r");
        let some = Concept::existential(r.clone(), name("B"));
        let index = TBoxIndex::build(vec![Inclusion::new(name("A"), some.clone())]);

        assert!(index.occurs(&some));
        assert!(index.occurs(&name("A")));
        assert!(index.occurs(&name("B")));
        assert!(!index.occurs(&Concept::existential(r, name("A"))));
        assert_eq!(index.subexpression_count(), 3);
    }
}
