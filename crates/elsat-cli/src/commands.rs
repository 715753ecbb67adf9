//! CLI argument definitions and handlers

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use elsat_core::{
    Concept, ConceptFormatter, ConceptName, FunctionalFormatter, LoaderOptions, OntologyStore, SimpleDlFormatter,
};
use elsat_reasoner::{
    classify, OrderPolicy, ReasonerConfig, SaturationEngine, SaturationStats, TBoxIndex,
};
use serde::Serialize;
use tracing::info;

/// Main CLI structure
#[derive(Parser, Debug)]
#[command(name = "elsat")]
#[command(about = "EL completion reasoner: computes the subsumers of a concept")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Ontology in OWL 2 functional syntax
    pub ontology: PathBuf,

    /// Concept name (IRI, prefixed name or unique short name)
    #[arg(required_unless_present = "all")]
    pub concept: Option<String>,

    /// Rule order: permutation of 0-4 such as 2,0,1,3,4, or random[:SEED]
    #[arg(long)]
    pub order: Option<String>,

    /// Classify every concept name instead of a single query
    #[arg(long, conflicts_with = "concept")]
    pub all: bool,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Stop after this many rounds
    #[arg(long)]
    pub max_rounds: Option<usize>,

    /// Worker threads for --all
    #[arg(long)]
    pub threads: Option<usize>,

    /// Skip axioms outside EL instead of failing
    #[arg(long)]
    pub lenient: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Concept rendering
    #[arg(long, value_enum, default_value = "dl")]
    pub syntax: Syntax,

    /// Report saturation statistics
    #[arg(long)]
    pub stats: bool,
}

/// Output format options
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    JsonPretty,
    /// Graphviz digraph of the hierarchy (--all only)
    Dot,
}

/// Concept syntax options
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Syntax {
    /// ⊓ / ∃ notation with short names
    Dl,
    /// OWL 2 functional syntax with full IRIs
    Functional,
}

impl Syntax {
    fn formatter(self) -> Box<dyn ConceptFormatter> {
        match self {
            Syntax::Dl => Box::new(SimpleDlFormatter),
            Syntax::Functional => Box::new(FunctionalFormatter),
        }
    }
}

/// Command execution result
#[derive(Debug)]
pub struct CommandResult {
    /// Text for stdout
    pub output: String,
    /// Diagnostics for stderr (statistics in text mode)
    pub message: String,
    pub data: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct QueryReport<'a> {
    concept: String,
    order: String,
    subsumers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<&'a SaturationStats>,
}

#[derive(Serialize)]
struct TaxonomyReport {
    order: String,
    taxonomy: BTreeMap<String, Vec<String>>,
    incomplete: Vec<String>,
}

/// Resolve the effective configuration: file values first, then flags
pub fn resolve_config(cli: &Cli) -> Result<ReasonerConfig> {
    let mut config = match &cli.config {
        Some(path) => ReasonerConfig::load(path)?,
        None => ReasonerConfig::default(),
    };

    if let Some(order) = &cli.order {
        config.order = order.clone();
    }
    if cli.max_rounds.is_some() {
        config.max_rounds = cli.max_rounds;
    }
    if cli.threads.is_some() {
        config.threads = cli.threads;
    }
    config.lenient |= cli.lenient;

    Ok(config)
}

/// Execute a parsed command line
pub struct CommandExecutor {
    config: ReasonerConfig,
    policy: OrderPolicy,
}

impl CommandExecutor {
    /// Validate configuration and rule order before any ontology work
    pub fn new(cli: &Cli) -> Result<Self> {
        if cli.format == OutputFormat::Dot && !cli.all {
            anyhow::bail!("--format dot is only available with --all");
        }
        let config = resolve_config(cli)?;
        let policy = config.order_policy()?;
        Ok(Self { config, policy })
    }

    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }

    pub fn execute(&self, cli: &Cli) -> Result<CommandResult> {
        let options = LoaderOptions {
            lenient: self.config.lenient,
        };
        let store = OntologyStore::load_with(&cli.ontology, &options)
            .with_context(|| format!("failed to load {}", cli.ontology.display()))?;
        let index = TBoxIndex::from_store(&store);
        let engine = SaturationEngine::new(&store, &index, &self.config);

        match (&cli.concept, cli.all) {
            (_, true) => self.execute_classify(&engine, cli),
            (Some(concept), false) => self.execute_query(&engine, concept, cli),
            (None, false) => anyhow::bail!("a concept name or --all is required"),
        }
    }

    fn execute_query(
        &self,
        engine: &SaturationEngine<'_>,
        concept: &str,
        cli: &Cli,
    ) -> Result<CommandResult> {
        info!("Computing subsumers of {} with order {}", concept, self.policy);
        let saturation = engine.find_subsumers_by_name(concept, &self.policy)?;

        let formatter = cli.syntax.formatter();
        let subsumers: Vec<String> = saturation
            .subsumers()
            .iter()
            .map(|c| formatter.format(c))
            .collect();
        let report = QueryReport {
            concept: formatter.format(saturation.root().seed()),
            order: self.policy.to_string(),
            subsumers,
            stats: cli.stats.then_some(&saturation.stats),
        };
        let data = serde_json::to_value(&report)?;

        let mut message = String::new();
        let output = match cli.format {
            OutputFormat::Text | OutputFormat::Dot => {
                if cli.stats {
                    message = format_stats(&saturation.stats);
                }
                report.subsumers.iter().fold(String::new(), |mut out, line| {
                    let _ = writeln!(out, "{}", line);
                    out
                })
            }
            OutputFormat::Json => format!("{}\n", serde_json::to_string(&report)?),
            OutputFormat::JsonPretty => format!("{}\n", serde_json::to_string_pretty(&report)?),
        };

        Ok(CommandResult {
            output,
            message,
            data: Some(data),
        })
    }

    fn execute_classify(&self, engine: &SaturationEngine<'_>, cli: &Cli) -> Result<CommandResult> {
        let taxonomy = classify(engine, &self.policy, self.config.threads)?;

        let formatter = cli.syntax.formatter();
        let render = |name: &ConceptName| formatter.format(&Concept::name(name.clone()));

        // JSON keys are full IRIs; short names may collide across namespaces
        let iri = |name: &ConceptName| name.as_str().to_string();

        let mut report = TaxonomyReport {
            order: self.policy.to_string(),
            taxonomy: BTreeMap::new(),
            incomplete: taxonomy.incomplete().iter().map(iri).collect(),
        };
        let mut output = String::new();
        for (name, supers) in taxonomy.iter() {
            let strict: Vec<&ConceptName> = supers.iter().filter(|s| *s != name).collect();
            if cli.format == OutputFormat::Text {
                let rendered: Vec<String> = strict.iter().map(|s| render(*s)).collect();
                let _ = if rendered.is_empty() {
                    writeln!(output, "{}", render(name))
                } else {
                    writeln!(output, "{} ⊑ {}", render(name), rendered.join(", "))
                };
            }
            report
                .taxonomy
                .insert(iri(name), strict.into_iter().map(iri).collect());
        }

        let output = match cli.format {
            OutputFormat::Text => output,
            OutputFormat::Json => format!("{}\n", serde_json::to_string(&report)?),
            OutputFormat::JsonPretty => format!("{}\n", serde_json::to_string_pretty(&report)?),
            OutputFormat::Dot => taxonomy.to_dot(&render),
        };
        let message = if taxonomy.incomplete().is_empty() {
            String::new()
        } else {
            let names: Vec<String> = taxonomy.incomplete().iter().map(render).collect();
            format!("round bound reached for: {}\n", names.join(", "))
        };

        Ok(CommandResult {
            output,
            message,
            data: Some(serde_json::to_value(&report)?),
        })
    }
}

fn format_stats(stats: &SaturationStats) -> String {
    format!(
        "rounds: {}\nnodes: {}\nedges: {}\nconcepts: {}\nfixpoint: {}\nelapsed: {:.3?}\n",
        stats.rounds, stats.nodes, stats.edges, stats.concepts, stats.reached_fixpoint, stats.elapsed
    )
}
