//! 全概念名の並列分類
//!
//! クエリごとに独立したグラフを持つため、rayon でそのまま並列化できる。

use std::collections::BTreeMap;

use elsat_core::{Concept, ConceptName};
use rayon::prelude::*;
use tracing::info;

use crate::engine::SaturationEngine;
use crate::order::OrderPolicy;
use crate::{ReasonerError, Result};

/// Named subsumers of every concept name in the signature
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
    subsumers: BTreeMap<ConceptName, Vec<ConceptName>>,
    incomplete: Vec<ConceptName>,
}

impl Taxonomy {
    /// Named subsumers of `name` (including `name` itself), sorted
    pub fn subsumers_of(&self, name: &ConceptName) -> Option<&[ConceptName]> {
        self.subsumers.get(name).map(Vec::as_slice)
    }

    pub fn is_subsumed_by(&self, sub: &ConceptName, sup: &ConceptName) -> bool {
        self.subsumers_of(sub)
            .map_or(false, |supers| supers.binary_search(sup).is_ok())
    }

    /// Names mutually subsumed with `name`, excluding `name`
    pub fn equivalents(&self, name: &ConceptName) -> Vec<&ConceptName> {
        self.subsumers_of(name)
            .unwrap_or(&[])
            .iter()
            .filter(|other| *other != name && self.is_subsumed_by(other, name))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConceptName, &[ConceptName])> {
        self.subsumers.iter().map(|(name, supers)| (name, supers.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.subsumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subsumers.is_empty()
    }

    /// Names whose saturation stopped at the round bound
    pub fn incomplete(&self) -> &[ConceptName] {
        &self.incomplete
    }

    /// Graphviz DOT rendering of the hierarchy, subclasses below superclasses.
    ///
    /// Nodes are keyed by full IRI and shown with `label`; every name gets
    /// one edge per strict named subsumer.
    pub fn to_dot(&self, label: impl Fn(&ConceptName) -> String) -> String {
        let mut out = String::from("digraph taxonomy {\n  rankdir=BT;\n  node [shape=box];\n");
        for name in self.subsumers.keys() {
            out.push_str(&format!(
                "  {} [label={}];\n",
                dot_quote(name.as_str()),
                dot_quote(&label(name))
            ));
        }
        for (name, supers) in &self.subsumers {
            for sup in supers.iter().filter(|sup| *sup != name) {
                out.push_str(&format!(
                    "  {} -> {};\n",
                    dot_quote(name.as_str()),
                    dot_quote(sup.as_str())
                ));
            }
        }
        out.push_str("}\n");
        out
    }
}

fn dot_quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Saturate every concept name of the engine's store in parallel.
///
/// `threads` sizes a dedicated pool; `None` uses the global rayon pool.
pub fn classify(
    engine: &SaturationEngine<'_>,
    policy: &OrderPolicy,
    threads: Option<usize>,
) -> Result<Taxonomy> {
    let names: Vec<&ConceptName> = engine.store().concept_names().collect();
    info!("Classifying {} concept names", names.len());

    let run = || {
        names
            .par_iter()
            .map(|&name| {
                let saturation = engine.find_subsumers(&Concept::name(name.clone()), policy)?;
                let supers: Vec<ConceptName> =
                    saturation.named_subsumers().into_iter().cloned().collect();
                Ok((name.clone(), supers, saturation.stats.reached_fixpoint))
            })
            .collect::<Result<Vec<_>>>()
    };

    let results = match threads {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| ReasonerError::ThreadPool(e.to_string()))?
            .install(run)?,
        None => run()?,
    };

    let mut taxonomy = Taxonomy::default();
    for (name, supers, reached_fixpoint) in results {
        if !reached_fixpoint {
            taxonomy.incomplete.push(name.clone());
        }
        taxonomy.subsumers.insert(name, supers);
    }
    taxonomy.incomplete.sort();

    info!(
        "Classification finished: {} names, {} incomplete",
        taxonomy.len(),
        taxonomy.incomplete.len()
    );
    Ok(taxonomy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReasonerConfig;
    use crate::index::TBoxIndex;
    use elsat_core::{Axiom, OntologyStore};

    fn name(s: &str) -> Concept {
        Concept::named(s)
    }

    fn cn(s: &str) -> ConceptName {
        ConceptName::new(s)
    }

    fn store() -> OntologyStore {
        OntologyStore::from_axioms(vec![
            Axiom::inclusion(name("A"), name("B")),
            Axiom::equivalence(name("B"), name("C")),
            Axiom::inclusion(Concept::conjunction(name("B"), name("C")), name("D")),
        ])
    }

    #[test]
    fn test_classify_all_names() {
        let store = store();
        let index = TBoxIndex::from_store(&store);
        let engine = SaturationEngine::new(&store, &index, &ReasonerConfig::default());

        let taxonomy = classify(&engine, &OrderPolicy::default(), None).unwrap();

        assert_eq!(taxonomy.len(), 4);
        assert_eq!(
            taxonomy.subsumers_of(&cn("A")).unwrap(),
            &[cn("A"), cn("B"), cn("C"), cn("D")]
        );
        assert_eq!(taxonomy.subsumers_of(&cn("D")).unwrap(), &[cn("D")]);
        assert!(taxonomy.is_subsumed_by(&cn("C"), &cn("D")));
        assert!(!taxonomy.is_subsumed_by(&cn("D"), &cn("A")));
        assert_eq!(taxonomy.equivalents(&cn("B")), vec![&cn("C")]);
        assert!(taxonomy.incomplete().is_empty());
    }

    #[test]
    fn test_dedicated_pool_matches_global_pool() {
        let store = store();
        let index = TBoxIndex::from_store(&store);
        let engine = SaturationEngine::new(&store, &index, &ReasonerConfig::default());

        let global = classify(&engine, &OrderPolicy::randomized(1), None).unwrap();
        let pooled = classify(&engine, &OrderPolicy::default(), Some(2)).unwrap();

        assert_eq!(global, pooled);
    }

    #[test]
    fn test_dot_export() {
        let store = store();
        let index = TBoxIndex::from_store(&store);
        let engine = SaturationEngine::new(&store, &index, &ReasonerConfig::default());
        let taxonomy = classify(&engine, &OrderPolicy::default(), None).unwrap();

        let dot = taxonomy.to_dot(|name| name.as_str().to_lowercase());

        assert!(dot.starts_with("digraph taxonomy {"));
        assert!(dot.contains("rankdir=BT;"));
        assert!(dot.contains("  \"A\" [label=\"a\"];\n"));
        assert!(dot.contains("  \"A\" -> \"D\";\n"));
        assert!(dot.contains("  \"B\" -> \"C\";\n"));
        assert!(dot.contains("  \"C\" -> \"B\";\n"));
        assert!(!dot.contains("\"D\" ->"));
        assert!(!dot.contains("\"A\" -> \"A\""));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_dot_quote_escapes() {
        assert_eq!(dot_quote(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn test_round_bound_marks_incomplete() {
        let store = store();
        let index = TBoxIndex::from_store(&store);
        let engine = SaturationEngine::new(&store, &index, &ReasonerConfig::default())
            .with_max_rounds(Some(1));

        let taxonomy = classify(&engine, &OrderPolicy::default(), Some(1)).unwrap();

        assert!(taxonomy.incomplete().contains(&cn("A")));
    }
}
