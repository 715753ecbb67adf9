//! 概念式のフォーマッタ

use crate::model::{Concept, ConceptKind};

/// Renders concept expressions as displayable text
pub trait ConceptFormatter {
    fn format(&self, concept: &Concept) -> String;
}

/// DL notation using short names: `A ⊓ B`, `∃r.(A ⊓ B)`, `⊤`
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleDlFormatter;

impl SimpleDlFormatter {
    fn write(&self, concept: &Concept, nested: bool, out: &mut String) {
        match concept.kind() {
            ConceptKind::Top => out.push('⊤'),
            ConceptKind::Name(name) => out.push_str(name.short_form()),
            ConceptKind::Conjunction(left, right) => {
                if nested {
                    out.push('(');
                }
                self.write(left, true, out);
                out.push_str(" ⊓ ");
                self.write(right, true, out);
                if nested {
                    out.push(')');
                }
            }
            ConceptKind::Existential(role, filler) => {
                out.push('∃');
                out.push_str(role.short_form());
                out.push('.');
                self.write(filler, true, out);
            }
        }
    }
}

impl ConceptFormatter for SimpleDlFormatter {
    fn format(&self, concept: &Concept) -> String {
        let mut out = String::new();
        self.write(concept, false, &mut out);
        out
    }
}

/// OWL 2 functional-style syntax with full IRIs
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionalFormatter;

impl ConceptFormatter for FunctionalFormatter {
    fn format(&self, concept: &Concept) -> String {
        match concept.kind() {
            ConceptKind::Top => "owl:Thing".to_string(),
            ConceptKind::Name(name) => format!("<{}>", name.as_str()),
            ConceptKind::Conjunction(left, right) => format!(
                "ObjectIntersectionOf({} {})",
                self.format(left),
                self.format(right)
            ),
            ConceptKind::Existential(role, filler) => format!(
                "ObjectSomeValuesFrom(<{}> {})",
                role.as_str(),
                self.format(filler)
            ),
        }
    }
}
