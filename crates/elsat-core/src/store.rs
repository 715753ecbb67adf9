//! オントロジーストア
//!
//! 正規化済みの概念式と公理を保持し、推論コアに対して
//! 名前解決と概念式の生成 (mint) を提供する。

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use itertools::Itertools;
use tracing::info;

use crate::loader::{FunctionalSyntaxLoader, LoaderOptions};
use crate::model::{Axiom, Concept, ConceptName, Inclusion, Role};
use crate::OntologyError;

/// Read-only view of an ontology: signature, prefixes and axioms.
///
/// Built once, then shared (typically behind `&` or `Arc`) by every query of a
/// reasoning session.
#[derive(Debug, Clone, Default)]
pub struct OntologyStore {
    iri: Option<String>,
    prefixes: HashMap<String, String>,
    concept_names: BTreeSet<ConceptName>,
    roles: BTreeSet<Role>,
    axioms: Vec<Axiom>,
    by_short_name: HashMap<String, Vec<ConceptName>>,
}

impl OntologyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from already-normalized axioms
    pub fn from_axioms(axioms: impl IntoIterator<Item = Axiom>) -> Self {
        let mut store = Self::new();
        for axiom in axioms {
            store.add_axiom(axiom);
        }
        store
    }

    /// Parse functional-syntax source with default loader options
    pub fn parse(source: &str) -> Result<Self, OntologyError> {
        Self::parse_with(source, &LoaderOptions::default())
    }

    pub fn parse_with(source: &str, options: &LoaderOptions) -> Result<Self, OntologyError> {
        FunctionalSyntaxLoader::new(options.clone()).load_str(source)
    }

    /// Read and parse an ontology file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OntologyError> {
        Self::load_with(path, &LoaderOptions::default())
    }

    pub fn load_with(path: impl AsRef<Path>, options: &LoaderOptions) -> Result<Self, OntologyError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let store = Self::parse_with(&source, options)?;
        info!(
            "Loaded ontology {}: {} concept names, {} roles, {} axioms",
            path.display(),
            store.concept_names.len(),
            store.roles.len(),
            store.axioms.len()
        );
        Ok(store)
    }

    pub fn set_iri(&mut self, iri: impl Into<String>) {
        self.iri = Some(iri.into());
    }

    pub fn iri(&self) -> Option<&str> {
        self.iri.as_deref()
    }

    /// Register a prefix, e.g. `("ex", "http://example.org/")`
    pub fn add_prefix(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), iri.into());
    }

    /// Expand `prefix:local` against the registered prefixes
    pub fn expand(&self, prefixed: &str) -> Option<String> {
        let (prefix, local) = prefixed.split_once(':')?;
        self.prefixes.get(prefix).map(|base| format!("{}{}", base, local))
    }

    pub fn declare_concept(&mut self, name: ConceptName) {
        if self.concept_names.insert(name.clone()) {
            self.by_short_name
                .entry(name.short_form().to_string())
                .or_default()
                .push(name);
        }
    }

    pub fn declare_role(&mut self, role: Role) {
        self.roles.insert(role);
    }

    /// Add an axiom and register every name and role it mentions
    pub fn add_axiom(&mut self, axiom: Axiom) {
        for operand in axiom.operands() {
            for name in operand.concept_names() {
                self.declare_concept(name.clone());
            }
            for role in operand.roles() {
                self.declare_role(role.clone());
            }
        }
        self.axioms.push(axiom);
    }

    pub fn concept_names(&self) -> impl Iterator<Item = &ConceptName> {
        self.concept_names.iter()
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter()
    }

    pub fn axioms(&self) -> &[Axiom] {
        &self.axioms
    }

    /// All axioms as inclusions, equivalences rewritten into both directions
    pub fn inclusions(&self) -> Vec<Inclusion> {
        self.axioms
            .iter()
            .cloned()
            .flat_map(Axiom::into_inclusions)
            .collect()
    }

    pub fn contains_concept(&self, name: &ConceptName) -> bool {
        self.concept_names.contains(name)
    }

    /// Resolve a user-supplied name to a concept of the signature.
    ///
    /// Accepts a full IRI (with or without angle brackets), a prefixed name,
    /// `owl:Thing`, or a short name that is unique in the signature.
    pub fn concept_by_name(&self, name: &str) -> Result<Concept, OntologyError> {
        let name = name.trim();
        if matches!(name, "owl:Thing" | "Thing" | "⊤" | "http://www.w3.org/2002/07/owl#Thing") {
            return Ok(Concept::top());
        }

        let bare = name
            .strip_prefix('<')
            .and_then(|n| n.strip_suffix('>'))
            .unwrap_or(name);

        let exact = ConceptName::new(bare);
        if self.contains_concept(&exact) {
            return Ok(Concept::name(exact));
        }

        if let Some(expanded) = self.expand(bare) {
            let expanded = ConceptName::new(expanded);
            if self.contains_concept(&expanded) {
                return Ok(Concept::name(expanded));
            }
        }

        match self.by_short_name.get(bare).map(Vec::as_slice) {
            Some([single]) => Ok(Concept::name(single.clone())),
            Some(candidates) if candidates.len() > 1 => Err(OntologyError::AmbiguousConcept {
                name: bare.to_string(),
                candidates: candidates.iter().map(ConceptName::as_str).join(", "),
            }),
            _ => Err(OntologyError::UnknownConcept(name.to_string())),
        }
    }

    /// Check that every name used by `concept` belongs to the signature
    pub fn resolve(&self, concept: &Concept) -> Result<(), OntologyError> {
        match concept
            .concept_names()
            .into_iter()
            .find(|name| !self.contains_concept(name))
        {
            Some(unknown) => Err(OntologyError::UnknownConcept(unknown.as_str().to_string())),
            None => Ok(()),
        }
    }

    /// Binary conjunction `a ⊓ b`; equal inputs always yield equal outputs
    pub fn mint_conjunction(&self, a: Concept, b: Concept) -> Concept {
        Concept::conjunction(a, b)
    }

    /// Existential restriction `∃role.filler`; equal inputs always yield equal outputs
    pub fn mint_existential(&self, role: Role, filler: Concept) -> Concept {
        Concept::existential(role, filler)
    }
}
