//! Choosing among competing rules.
//!
//! A router usually holds several rules that could explain the same turn.
//! [`RuleSet`] keeps them in registration order and compares their matches
//! relative to each other; registration order breaks ties.

use super::matcher::Matcher;
use crate::{CompiledRule, Match, RuleDefinition, RuleError, TurnRequest};
use serde::Serialize;

/// A rule's match, tagged with the key the rule was registered under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch<'a, K> {
    pub key: &'a K,
    #[serde(flatten)]
    pub result: Match,
}

/// Named compiled rules, evaluated together.
#[derive(Debug, Clone)]
pub struct RuleSet<K> {
    rules: Vec<(K, CompiledRule)>,
}

impl<K> Default for RuleSet<K> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<K> RuleSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every `(key, definition)` pair; the first malformed rule aborts.
    pub fn compile<I, D>(definitions: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = (K, D)>,
        D: Into<RuleDefinition>,
    {
        let rules = definitions
            .into_iter()
            .map(|(key, def)| CompiledRule::compile(def).map(|rule| (key, rule)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn insert(&mut self, key: K, rule: CompiledRule) {
        self.rules.push((key, rule));
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &CompiledRule)> {
        self.rules.iter().map(|(key, rule)| (key, rule))
    }

    /// Every matching rule, best first. Equal scores keep registration order.
    pub fn rank<R: TurnRequest + ?Sized>(&self, matcher: &Matcher, req: &R) -> Vec<RankedMatch<'_, K>> {
        let mut ranked: Vec<RankedMatch<'_, K>> = self
            .rules
            .iter()
            .filter_map(|(key, rule)| matcher.evaluate(req, rule).map(|result| RankedMatch { key, result }))
            .collect();
        ranked.sort_by(|a, b| b.result.score.total_cmp(&a.result.score));
        ranked
    }

    /// The highest scoring match that reaches `min_score`; the earliest rule
    /// wins a tie.
    pub fn best<R: TurnRequest + ?Sized>(
        &self,
        matcher: &Matcher,
        req: &R,
        min_score: f64,
    ) -> Option<RankedMatch<'_, K>> {
        let mut best: Option<RankedMatch<'_, K>> = None;
        for (key, rule) in &self.rules {
            let Some(result) = matcher.evaluate(req, rule) else {
                continue;
            };
            if result.score < min_score {
                continue;
            }
            if best.as_ref().is_none_or(|b| result.score > b.result.score) {
                best = Some(RankedMatch { key, result });
            }
        }
        best
    }
}
