//! EL オントロジーモデル
//!
//! このクレートは推論コアが利用する外部協調部分を提供します:
//! - EL 概念式と公理 (二項連言・存在制限・⊤)
//! - オントロジーストア (名前解決、概念式の生成)
//! - OWL 2 関数型構文ローダー
//! - 概念式フォーマッタ

pub mod formatter;
pub mod loader;
pub mod model;
pub mod store;

pub use formatter::{ConceptFormatter, FunctionalFormatter, SimpleDlFormatter};
pub use loader::{FunctionalSyntaxLoader, LoaderOptions};
pub use model::{Axiom, Concept, ConceptKind, ConceptName, Inclusion, Role, Variant};
pub use store::OntologyStore;

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OntologyError {
    #[error("Unknown concept: {0}")]
    UnknownConcept(String),

    #[error("Ambiguous concept name '{name}' (candidates: {candidates})")]
    AmbiguousConcept { name: String, candidates: String },

    #[error("Malformed axiom: {0}")]
    MalformedAxiom(String),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
