//! EL 概念・公理データモデル

use std::fmt;
use std::sync::Arc;

use crate::formatter::{ConceptFormatter, SimpleDlFormatter};

/// Local part of an IRI, used for display and short-name lookup
pub(crate) fn short_form(iri: &str) -> &str {
    let trimmed = iri.trim_end_matches(|c| c == '#' || c == '/');
    match trimmed.rfind(|c| c == '#' || c == '/' || c == ':') {
        Some(idx) if idx + 1 < trimmed.len() => &trimmed[idx + 1..],
        _ => trimmed,
    }
}

/// Named concept (atomic class) identified by its IRI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct ConceptName(Arc<str>);

impl ConceptName {
    pub fn new(iri: impl Into<Arc<str>>) -> Self {
        Self(iri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short_form(&self) -> &str {
        short_form(&self.0)
    }
}

impl fmt::Display for ConceptName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Object property used in existential restrictions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Role(Arc<str>);

impl Role {
    pub fn new(iri: impl Into<Arc<str>>) -> Self {
        Self(iri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short_form(&self) -> &str {
        short_form(&self.0)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structural shape of an EL concept expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum ConceptKind {
    /// owl:Thing (⊤)
    Top,
    /// Named concept
    Name(ConceptName),
    /// Binary conjunction: C ⊓ D
    Conjunction(Concept, Concept),
    /// Existential restriction: ∃r.C
    Existential(Role, Concept),
}

/// Cheap-to-clone handle on a concept expression.
///
/// Equality, hashing and ordering are structural, so two expressions built
/// from equal constituents are interchangeable everywhere.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Concept(Arc<ConceptKind>);

/// Variant tag shared by concepts and axioms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    ConceptName,
    Conjunction,
    ExistentialRestriction,
    Inclusion,
    Equivalence,
    Top,
}

impl Concept {
    pub fn top() -> Self {
        Self(Arc::new(ConceptKind::Top))
    }

    pub fn name(name: ConceptName) -> Self {
        Self(Arc::new(ConceptKind::Name(name)))
    }

    /// Shorthand for a named concept built straight from an IRI string
    pub fn named(iri: &str) -> Self {
        Self::name(ConceptName::new(iri))
    }

    pub fn conjunction(left: Concept, right: Concept) -> Self {
        Self(Arc::new(ConceptKind::Conjunction(left, right)))
    }

    pub fn existential(role: Role, filler: Concept) -> Self {
        Self(Arc::new(ConceptKind::Existential(role, filler)))
    }

    pub fn kind(&self) -> &ConceptKind {
        &self.0
    }

    pub fn variant(&self) -> Variant {
        match self.kind() {
            ConceptKind::Top => Variant::Top,
            ConceptKind::Name(_) => Variant::ConceptName,
            ConceptKind::Conjunction(..) => Variant::Conjunction,
            ConceptKind::Existential(..) => Variant::ExistentialRestriction,
        }
    }

    pub fn as_name(&self) -> Option<&ConceptName> {
        match self.kind() {
            ConceptKind::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_conjunction(&self) -> Option<(&Concept, &Concept)> {
        match self.kind() {
            ConceptKind::Conjunction(left, right) => Some((left, right)),
            _ => None,
        }
    }

    pub fn as_existential(&self) -> Option<(&Role, &Concept)> {
        match self.kind() {
            ConceptKind::Existential(role, filler) => Some((role, filler)),
            _ => None,
        }
    }

    /// All sub-expressions in pre-order, the expression itself first
    pub fn subexpressions(&self) -> Vec<Concept> {
        let mut out = Vec::new();
        self.collect_subexpressions(&mut out);
        out
    }

    fn collect_subexpressions(&self, out: &mut Vec<Concept>) {
        out.push(self.clone());
        match self.kind() {
            ConceptKind::Top | ConceptKind::Name(_) => {}
            ConceptKind::Conjunction(left, right) => {
                left.collect_subexpressions(out);
                right.collect_subexpressions(out);
            }
            ConceptKind::Existential(_, filler) => filler.collect_subexpressions(out),
        }
    }

    /// Concept names occurring anywhere in the expression
    pub fn concept_names(&self) -> Vec<&ConceptName> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a ConceptName>) {
        match self.kind() {
            ConceptKind::Top => {}
            ConceptKind::Name(name) => out.push(name),
            ConceptKind::Conjunction(left, right) => {
                left.collect_names(out);
                right.collect_names(out);
            }
            ConceptKind::Existential(_, filler) => filler.collect_names(out),
        }
    }

    /// Roles occurring anywhere in the expression
    pub fn roles(&self) -> Vec<&Role> {
        let mut out = Vec::new();
        self.collect_roles(&mut out);
        out
    }

    fn collect_roles<'a>(&'a self, out: &mut Vec<&'a Role>) {
        match self.kind() {
            ConceptKind::Top | ConceptKind::Name(_) => {}
            ConceptKind::Conjunction(left, right) => {
                left.collect_roles(out);
                right.collect_roles(out);
            }
            ConceptKind::Existential(role, filler) => {
                out.push(role);
                filler.collect_roles(out);
            }
        }
    }
}

impl fmt::Debug for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Concept({})", SimpleDlFormatter.format(self))
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", SimpleDlFormatter.format(self))
    }
}

/// General concept inclusion: lhs ⊑ rhs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Inclusion {
    pub lhs: Concept,
    pub rhs: Concept,
}

impl Inclusion {
    pub fn new(lhs: Concept, rhs: Concept) -> Self {
        Self { lhs, rhs }
    }
}

impl fmt::Display for Inclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ⊑ {}", self.lhs, self.rhs)
    }
}

/// Terminological axiom (EL subset)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Axiom {
    /// SubClassOf(C1 C2)
    Inclusion(Inclusion),
    /// EquivalentClasses(C1 C2)
    Equivalence(Concept, Concept),
}

impl Axiom {
    pub fn inclusion(lhs: Concept, rhs: Concept) -> Self {
        Axiom::Inclusion(Inclusion::new(lhs, rhs))
    }

    pub fn equivalence(left: Concept, right: Concept) -> Self {
        Axiom::Equivalence(left, right)
    }

    pub fn variant(&self) -> Variant {
        match self {
            Axiom::Inclusion(_) => Variant::Inclusion,
            Axiom::Equivalence(..) => Variant::Equivalence,
        }
    }

    pub fn as_inclusion(&self) -> Option<&Inclusion> {
        match self {
            Axiom::Inclusion(inclusion) => Some(inclusion),
            Axiom::Equivalence(..) => None,
        }
    }

    /// Both concept operands of the axiom
    pub fn operands(&self) -> [&Concept; 2] {
        match self {
            Axiom::Inclusion(inclusion) => [&inclusion.lhs, &inclusion.rhs],
            Axiom::Equivalence(left, right) => [left, right],
        }
    }

    /// Rewrite into inclusions: `a ≡ b` becomes `a ⊑ b` and `b ⊑ a`
    pub fn into_inclusions(self) -> Vec<Inclusion> {
        match self {
            Axiom::Inclusion(inclusion) => vec![inclusion],
            Axiom::Equivalence(left, right) => vec![
                Inclusion::new(left.clone(), right.clone()),
                Inclusion::new(right, left),
            ],
        }
    }
}

impl fmt::Display for Axiom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axiom::Inclusion(inclusion) => write!(f, "{}", inclusion),
            Axiom::Equivalence(left, right) => write!(f, "{} ≡ {}", left, right),
        }
    }
}
