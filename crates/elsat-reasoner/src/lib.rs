//! EL 完備化推論エンジン
//!
//! このクレートは EL オントロジーに対する包摂子計算を提供します:
//! - TBox インデックス (既知の連言・told superclass・部分式集合)
//! - 完備化グラフ (クエリごとのアリーナ)
//! - 完備化規則 R1–R5
//! - 飽和エンジンと規則適用順序ポリシー
//! - rayon による全概念の並列分類
//! - TOML 設定

pub mod classify;
pub mod config;
pub mod engine;
pub mod graph;
pub mod index;
pub mod order;
pub mod rules;

pub use classify::{classify, Taxonomy};
pub use config::ReasonerConfig;
pub use engine::{Saturation, SaturationEngine, SaturationStats, Saturator};
pub use graph::{CompletionGraph, Edge, Node, NodeId};
pub use index::TBoxIndex;
pub use order::OrderPolicy;
pub use rules::{rule, CompletionRule, RuleContext, RuleId};

// Error types
use elsat_core::OntologyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReasonerError {
    #[error("Unknown concept: {0}")]
    UnknownConcept(String),

    #[error("Invalid rule order '{order}': {reason}")]
    InvalidRuleOrder { order: String, reason: String },

    #[error("Ontology error: {0}")]
    Ontology(OntologyError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

impl From<OntologyError> for ReasonerError {
    fn from(err: OntologyError) -> Self {
        match err {
            OntologyError::UnknownConcept(name) => ReasonerError::UnknownConcept(name),
            other => ReasonerError::Ontology(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReasonerError>;
