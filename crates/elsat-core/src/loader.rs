//! OWL 2 関数型構文ローダー
//!
//! EL に該当するクラス公理のみを取り込み、n 項の交差は
//! 深さ log n の平衡した二項連言の木に変換する。

use logos::Logos;
use tracing::{debug, warn};

use crate::model::{Axiom, Concept, ConceptName, Role};
use crate::store::OntologyStore;
use crate::OntologyError;

const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";
const OWL_NOTHING: &str = "http://www.w3.org/2002/07/owl#Nothing";

/// Prefixes every functional-syntax document may use without declaring them
const STANDARD_PREFIXES: [(&str, &str); 4] = [
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

/// Class constructors outside the EL profile
const NON_EL_CONSTRUCTORS: [&str; 16] = [
    "ObjectUnionOf",
    "ObjectComplementOf",
    "ObjectOneOf",
    "ObjectAllValuesFrom",
    "ObjectHasValue",
    "ObjectHasSelf",
    "ObjectMinCardinality",
    "ObjectMaxCardinality",
    "ObjectExactCardinality",
    "ObjectInverseOf",
    "DataSomeValuesFrom",
    "DataAllValuesFrom",
    "DataHasValue",
    "DataMinCardinality",
    "DataMaxCardinality",
    "DataExactCardinality",
];

/// Functional-syntax tokens
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token<'a> {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("=")]
    Equals,

    #[token("^^")]
    DoubleCaret,

    #[regex(r"<[^<>\s]*>")]
    FullIri(&'a str),

    #[regex(r#""([^"\\]|\\.)*""#)]
    StringLiteral(&'a str),

    #[regex(r"@[a-zA-Z]+(-[a-zA-Z0-9]+)*")]
    LangTag(&'a str),

    #[regex(r"[0-9]+")]
    Integer(&'a str),

    #[regex(r"[A-Za-z][A-Za-z0-9_]*")]
    Keyword(&'a str),

    #[regex(r"([A-Za-z_][A-Za-z0-9_\-\.]*)?:[A-Za-z0-9_\-\.]*")]
    PrefixedName(&'a str),
}

/// Loader behaviour switches
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Skip class axioms using non-EL constructors instead of failing
    pub lenient: bool,
}

/// Parenthesised syntax tree produced from the token stream
#[derive(Debug, Clone, PartialEq)]
enum SExpr<'a> {
    Atom { token: Token<'a>, line: usize },
    List { head: &'a str, items: Vec<SExpr<'a>>, line: usize },
}

impl<'a> SExpr<'a> {
    fn line(&self) -> usize {
        match self {
            SExpr::Atom { line, .. } | SExpr::List { line, .. } => *line,
        }
    }

    fn is_annotation(&self) -> bool {
        matches!(self, SExpr::List { head: "Annotation", .. })
    }
}

enum ExprError {
    Syntax { line: usize, message: String },
    NonEl { line: usize, construct: String },
}

impl ExprError {
    fn syntax(line: usize, message: impl Into<String>) -> Self {
        ExprError::Syntax { line, message: message.into() }
    }
}

/// Byte offset → 1-based line number
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }
}

/// Functional-syntax ontology loader
pub struct FunctionalSyntaxLoader {
    options: LoaderOptions,
}

impl FunctionalSyntaxLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Parse a whole document into an ontology store
    pub fn load_str(&self, source: &str) -> Result<OntologyStore, OntologyError> {
        let tokens = tokenize(source)?;
        let tree = build_tree(&tokens)?;

        let mut store = OntologyStore::new();
        for (prefix, iri) in STANDARD_PREFIXES {
            store.add_prefix(prefix, iri);
        }

        let mut skipped = 0usize;
        for expr in &tree {
            skipped += self.load_top_level(expr, &mut store)?;
        }

        debug!(
            "Functional syntax loaded: {} axioms, {} skipped",
            store.axioms().len(),
            skipped
        );
        Ok(store)
    }

    fn load_top_level(&self, expr: &SExpr<'_>, store: &mut OntologyStore) -> Result<usize, OntologyError> {
        match expr {
            SExpr::List { head: "Prefix", items, line } => {
                load_prefix(items, *line, store)?;
                Ok(0)
            }
            SExpr::List { head: "Ontology", items, .. } => {
                let mut skipped = 0;
                let mut header_iris = 0;
                for item in items {
                    match item {
                        SExpr::Atom { token: Token::FullIri(iri), .. } if header_iris < 2 => {
                            if header_iris == 0 {
                                store.set_iri(strip_brackets(iri));
                            }
                            header_iris += 1;
                        }
                        other => skipped += self.load_axiom(other, store)?,
                    }
                }
                Ok(skipped)
            }
            other => self.load_axiom(other, store),
        }
    }

    /// Returns the number of skipped axioms (0 or 1)
    fn load_axiom(&self, expr: &SExpr<'_>, store: &mut OntologyStore) -> Result<usize, OntologyError> {
        let (head, items, line) = match expr {
            SExpr::List { head, items, line } => (*head, items, *line),
            SExpr::Atom { line, token } => {
                return Err(OntologyError::Parse {
                    line: *line,
                    message: format!("expected an axiom, found {:?}", token),
                })
            }
        };

        let operands: Vec<&SExpr<'_>> = items.iter().filter(|i| !i.is_annotation()).collect();

        let result = match head {
            "Declaration" => {
                load_declaration(&operands, line, store)?;
                return Ok(0);
            }
            "SubClassOf" => {
                if operands.len() != 2 {
                    return Err(OntologyError::Parse {
                        line,
                        message: format!("SubClassOf expects 2 class expressions, found {}", operands.len()),
                    });
                }
                self.class_expression(operands[0], store).and_then(|lhs| {
                    self.class_expression(operands[1], store)
                        .map(|rhs| vec![Axiom::inclusion(lhs, rhs)])
                })
            }
            "EquivalentClasses" => {
                if operands.len() < 2 {
                    return Err(OntologyError::Parse {
                        line,
                        message: "EquivalentClasses expects at least 2 class expressions".to_string(),
                    });
                }
                operands
                    .iter()
                    .map(|op| self.class_expression(op, store))
                    .collect::<Result<Vec<_>, _>>()
                    .map(|classes| {
                        classes[1..]
                            .iter()
                            .map(|other| Axiom::equivalence(classes[0].clone(), other.clone()))
                            .collect()
                    })
            }
            "Import" | "Annotation" => return Ok(0),
            other => {
                debug!("Skipping non-class axiom {} at line {}", other, line);
                return Ok(1);
            }
        };

        match result {
            Ok(axioms) => {
                for axiom in axioms {
                    store.add_axiom(axiom);
                }
                Ok(0)
            }
            Err(ExprError::Syntax { line, message }) => Err(OntologyError::Parse { line, message }),
            Err(ExprError::NonEl { line, construct }) if self.options.lenient => {
                warn!("Skipping {} axiom at line {}: {} is outside EL", head, line, construct);
                Ok(1)
            }
            Err(ExprError::NonEl { line, construct }) => Err(OntologyError::MalformedAxiom(format!(
                "{} at line {} uses {}, which is outside the EL profile",
                head, line, construct
            ))),
        }
    }

    fn class_expression(&self, expr: &SExpr<'_>, store: &OntologyStore) -> Result<Concept, ExprError> {
        match expr {
            SExpr::Atom { token, line } => {
                let iri = entity_iri(token, *line, store)?;
                match iri.as_str() {
                    OWL_THING => Ok(Concept::top()),
                    OWL_NOTHING => Err(ExprError::NonEl {
                        line: *line,
                        construct: "owl:Nothing".to_string(),
                    }),
                    _ => Ok(Concept::name(ConceptName::new(iri))),
                }
            }
            SExpr::List { head: "ObjectIntersectionOf", items, line } => {
                let conjuncts = items
                    .iter()
                    .map(|item| self.class_expression(item, store))
                    .collect::<Result<Vec<_>, _>>()?;
                balanced_conjunction(conjuncts)
                    .ok_or_else(|| ExprError::syntax(*line, "ObjectIntersectionOf without operands"))
            }
            SExpr::List { head: "ObjectSomeValuesFrom", items, line } => {
                if items.len() != 2 {
                    return Err(ExprError::syntax(
                        *line,
                        format!("ObjectSomeValuesFrom expects 2 operands, found {}", items.len()),
                    ));
                }
                let role = self.role(&items[0], store)?;
                let filler = self.class_expression(&items[1], store)?;
                Ok(Concept::existential(role, filler))
            }
            SExpr::List { head, line, .. } if NON_EL_CONSTRUCTORS.contains(head) => Err(ExprError::NonEl {
                line: *line,
                construct: head.to_string(),
            }),
            SExpr::List { head, line, .. } => Err(ExprError::syntax(
                *line,
                format!("unknown class expression {}", head),
            )),
        }
    }

    fn role(&self, expr: &SExpr<'_>, store: &OntologyStore) -> Result<Role, ExprError> {
        match expr {
            SExpr::Atom { token, line } => Ok(Role::new(entity_iri(token, *line, store)?)),
            SExpr::List { head, line, .. } if NON_EL_CONSTRUCTORS.contains(head) => Err(ExprError::NonEl {
                line: *line,
                construct: head.to_string(),
            }),
            other => Err(ExprError::syntax(other.line(), "expected an object property")),
        }
    }
}

fn strip_brackets(iri: &str) -> &str {
    iri.trim_start_matches('<').trim_end_matches('>')
}

/// Resolve an entity token to a full IRI
fn entity_iri(token: &Token<'_>, line: usize, store: &OntologyStore) -> Result<String, ExprError> {
    match token {
        Token::FullIri(iri) => Ok(strip_brackets(iri).to_string()),
        Token::PrefixedName(name) => store
            .expand(name)
            .ok_or_else(|| ExprError::syntax(line, format!("undeclared prefix in {}", name))),
        Token::Keyword(name) => Ok(name.to_string()),
        other => Err(ExprError::syntax(line, format!("expected an entity, found {:?}", other))),
    }
}

fn load_prefix(items: &[SExpr<'_>], line: usize, store: &mut OntologyStore) -> Result<(), OntologyError> {
    match items {
        [SExpr::Atom { token: Token::PrefixedName(name), .. }, SExpr::Atom { token: Token::Equals, .. }, SExpr::Atom { token: Token::FullIri(iri), .. }] =>
        {
            store.add_prefix(name.trim_end_matches(':'), strip_brackets(iri));
            Ok(())
        }
        _ => Err(OntologyError::Parse {
            line,
            message: "malformed Prefix declaration".to_string(),
        }),
    }
}

fn load_declaration(operands: &[&SExpr<'_>], line: usize, store: &mut OntologyStore) -> Result<(), OntologyError> {
    let (kind, entity) = match operands {
        [SExpr::List { head, items, .. }] if items.len() == 1 => (*head, &items[0]),
        _ => {
            return Err(OntologyError::Parse {
                line,
                message: "malformed Declaration".to_string(),
            })
        }
    };
    let token = match entity {
        SExpr::Atom { token, .. } => token,
        SExpr::List { line, .. } => {
            return Err(OntologyError::Parse {
                line: *line,
                message: "expected an entity in Declaration".to_string(),
            })
        }
    };
    let iri = entity_iri(token, line, store).map_err(|e| match e {
        ExprError::Syntax { line, message } => OntologyError::Parse { line, message },
        ExprError::NonEl { line, construct } => OntologyError::Parse { line, message: construct },
    })?;

    match kind {
        "Class" if iri != OWL_THING && iri != OWL_NOTHING => store.declare_concept(ConceptName::new(iri)),
        "ObjectProperty" => store.declare_role(Role::new(iri)),
        _ => {}
    }
    Ok(())
}

fn tokenize(source: &str) -> Result<Vec<(Token<'_>, usize)>, OntologyError> {
    let lines = LineIndex::new(source);
    Token::lexer(source)
        .spanned()
        .map(|(token, span)| {
            let line = lines.line_of(span.start);
            token.map(|t| (t, line)).map_err(|_| OntologyError::Parse {
                line,
                message: format!("unexpected input {:?}", &source[span]),
            })
        })
        .collect()
}

fn build_tree<'a>(tokens: &[(Token<'a>, usize)]) -> Result<Vec<SExpr<'a>>, OntologyError> {
    let mut pos = 0;
    let items = parse_items(tokens, &mut pos)?;
    if let Some((_, line)) = tokens.get(pos) {
        return Err(OntologyError::Parse {
            line: *line,
            message: "unbalanced ')'".to_string(),
        });
    }
    Ok(items)
}

/// Parse expressions until a closing parenthesis or end of input
fn parse_items<'a>(tokens: &[(Token<'a>, usize)], pos: &mut usize) -> Result<Vec<SExpr<'a>>, OntologyError> {
    let mut items = Vec::new();
    while let Some((token, line)) = tokens.get(*pos) {
        match token {
            Token::RParen => break,
            Token::Keyword(head) if matches!(tokens.get(*pos + 1), Some((Token::LParen, _))) => {
                *pos += 2;
                let children = parse_items(tokens, pos)?;
                match tokens.get(*pos) {
                    Some((Token::RParen, _)) => *pos += 1,
                    _ => {
                        return Err(OntologyError::Parse {
                            line: *line,
                            message: format!("unclosed {}(", head),
                        })
                    }
                }
                items.push(SExpr::List {
                    head: *head,
                    items: children,
                    line: *line,
                });
            }
            Token::LParen => {
                return Err(OntologyError::Parse {
                    line: *line,
                    message: "'(' must follow a keyword".to_string(),
                })
            }
            other => {
                *pos += 1;
                items.push(SExpr::Atom {
                    token: other.clone(),
                    line: *line,
                });
            }
        }
    }
    Ok(items)
}

/// Pairs up neighbouring conjuncts until one remains, so `A B C D`
/// becomes `(A ⊓ B) ⊓ (C ⊓ D)` and `A B C` becomes `(A ⊓ B) ⊓ C`
fn balanced_conjunction(mut layer: Vec<Concept>) -> Option<Concept> {
    while layer.len() > 1 {
        let mut next = Vec::with_capacity(layer.len().div_ceil(2));
        let mut conjuncts = layer.into_iter();
        while let Some(left) = conjuncts.next() {
            next.push(match conjuncts.next() {
                Some(right) => Concept::conjunction(left, right),
                None => left,
            });
        }
        layer = next;
    }
    layer.pop()
}
