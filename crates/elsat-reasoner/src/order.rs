//! 規則適用順序ポリシー

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::rules::RuleId;
use crate::{ReasonerError, Result};

/// How the five rules are sequenced within each pass over a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderPolicy {
    /// The same permutation for every node in every round
    Fixed([RuleId; 5]),
    /// A fresh permutation drawn from a seeded generator at the start of each round
    Randomized { seed: u64 },
}

impl Default for OrderPolicy {
    fn default() -> Self {
        OrderPolicy::Fixed(RuleId::ALL)
    }
}

fn invalid(order: impl Into<String>, reason: impl Into<String>) -> ReasonerError {
    ReasonerError::InvalidRuleOrder {
        order: order.into(),
        reason: reason.into(),
    }
}

impl OrderPolicy {
    /// Build a fixed policy from 0-based rule indices; must be a permutation of 0..=4
    pub fn fixed(indices: &[usize]) -> Result<Self> {
        let rendered = indices
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",");

        if indices.len() != RuleId::ALL.len() {
            return Err(invalid(
                rendered,
                format!("expected {} rule indices, got {}", RuleId::ALL.len(), indices.len()),
            ));
        }

        let mut order = RuleId::ALL;
        let mut seen = [false; 5];
        for (slot, &index) in order.iter_mut().zip(indices) {
            let id = RuleId::from_index(index)
                .ok_or_else(|| invalid(rendered.clone(), format!("no rule with index {}", index)))?;
            if seen[index] {
                return Err(invalid(rendered, format!("rule index {} appears twice", index)));
            }
            seen[index] = true;
            *slot = id;
        }

        Ok(OrderPolicy::Fixed(order))
    }

    pub fn randomized(seed: u64) -> Self {
        OrderPolicy::Randomized { seed }
    }

    pub fn is_randomized(&self) -> bool {
        matches!(self, OrderPolicy::Randomized { .. })
    }

    /// Start a per-query sequencer
    pub fn rounds(&self) -> RoundOrder {
        match *self {
            OrderPolicy::Fixed(order) => RoundOrder { order, rng: None },
            OrderPolicy::Randomized { seed } => RoundOrder {
                order: RuleId::ALL,
                rng: Some(StdRng::seed_from_u64(seed)),
            },
        }
    }
}

impl fmt::Display for OrderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderPolicy::Fixed(order) => {
                let indices: Vec<String> = order.iter().map(|id| id.index().to_string()).collect();
                write!(f, "{}", indices.join(","))
            }
            OrderPolicy::Randomized { seed } => write!(f, "random:{}", seed),
        }
    }
}

/// Accepts `2,0,1,3,4`, `20134`, `random` and `random:SEED`
impl FromStr for OrderPolicy {
    type Err = ReasonerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(invalid(s, "empty rule order"));
        }

        if let Some(rest) = s.strip_prefix("random") {
            return match rest.strip_prefix(':') {
                None if rest.is_empty() => Ok(OrderPolicy::randomized(rand::random())),
                Some(seed) => seed
                    .trim()
                    .parse::<u64>()
                    .map(OrderPolicy::randomized)
                    .map_err(|_| invalid(s, format!("invalid seed '{}'", seed))),
                None => Err(invalid(s, "expected 'random' or 'random:SEED'")),
            };
        }

        let parts: Vec<&str> = if s.contains(',') {
            s.split(',').map(str::trim).collect()
        } else {
            s.char_indices().map(|(i, c)| &s[i..i + c.len_utf8()]).collect()
        };

        let indices = parts
            .iter()
            .map(|part| {
                part.parse::<usize>()
                    .map_err(|_| invalid(s, format!("'{}' is not a rule index", part)))
            })
            .collect::<Result<Vec<_>>>()?;

        OrderPolicy::fixed(&indices).map_err(|err| match err {
            ReasonerError::InvalidRuleOrder { reason, .. } => invalid(s, reason),
            other => other,
        })
    }
}

/// Rule sequence source for the rounds of one saturation
#[derive(Debug, Clone)]
pub struct RoundOrder {
    order: [RuleId; 5],
    rng: Option<StdRng>,
}

impl RoundOrder {
    /// The order to use for the next round
    pub fn next_round(&mut self) -> [RuleId; 5] {
        if let Some(rng) = self.rng.as_mut() {
            self.order.shuffle(rng);
        }
        self.order
    }
}
