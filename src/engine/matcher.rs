//! Scoring a compiled rule against one turn.
//!
//! ```text
//! regexes ── any match? ──┐
//!                         ├─ yes, or rule has only entities ──▶ entity/regex mode
//!                         └─ no ─────────────────────────────▶ intent mode
//! ```
//!
//! **Entity/regex mode** (`intent = None`):
//!
//! - no entity requirements: the regex must have matched;
//!   `1 - no_intent - observed * redundant`
//! - otherwise align entities;
//!   `(alignment - no_intent - handicap) * gain^extra`, where `extra` does not
//!   count the first matched entity unless a regex also matched
//!
//! `no_intent` is `redundant_handicap` when the classifier proposed any intent
//! for the turn, since a non-intent rule then competes with intent rules.
//!
//! **Intent mode**: every wanted intent is scored against every observed
//! intent of the same name. Without entity requirements the score is
//! `intent - observed * redundant`; with them it is
//! `(intent - handicap) * gain^matched`. The strictly highest positive score
//! wins, ties keep the first candidate.

use super::alignment::Alignment;
use super::trace::{AlignmentSummary, CandidateTrace, Evaluation, EvaluationTrace, MatchMode};
use crate::{CompiledRule, Match, MatchFeatures, ObservedEntity, ObservedIntent, TurnRequest};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Score adjustments. Instance-level so an embedding router can tune them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Handicaps {
    /// Subtracted for every optional requirement that did match.
    pub optional_handicap: f64,
    /// Subtracted for every optional requirement that did not match and for
    /// every observed entity the rule did not ask for.
    pub redundant_handicap: f64,
    /// Multiplier applied once per additional corroborating feature.
    pub multi_match_gain: f64,
}

impl Default for Handicaps {
    fn default() -> Self {
        Self { optional_handicap: 0.001, redundant_handicap: 0.05, multi_match_gain: 1.2 }
    }
}

/// Evaluates compiled rules. Holds no per-turn state; share it freely.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    handicaps: Handicaps,
}

impl Matcher {
    pub fn new(handicaps: Handicaps) -> Self {
        Self { handicaps }
    }

    pub fn handicaps(&self) -> &Handicaps {
        &self.handicaps
    }

    /// Score `rule` against `req`. `None` means the rule does not apply.
    pub fn evaluate<R: TurnRequest + ?Sized>(&self, req: &R, rule: &CompiledRule) -> Option<Match> {
        self.run(req, rule, None)
    }

    /// Like [`evaluate`](Self::evaluate), also recording how the result came about.
    pub fn explain<R: TurnRequest + ?Sized>(&self, req: &R, rule: &CompiledRule) -> Evaluation {
        let start = Instant::now();
        let mut trace = EvaluationTrace::default();
        let result = self.run(req, rule, Some(&mut trace));
        trace.elapsed = start.elapsed();
        Evaluation { result, trace }
    }

    fn run<R: TurnRequest + ?Sized>(
        &self,
        req: &R,
        rule: &CompiledRule,
        mut trace: Option<&mut EvaluationTrace>,
    ) -> Option<Match> {
        let regex_matched = rule.regexes.iter().any(|r| r.matches(req));
        let mode = if regex_matched || rule.is_pure_entity() { MatchMode::EntityRegex } else { MatchMode::Intent };

        debug!(?mode, regex_matched, "evaluating rule");
        if let Some(t) = trace.as_deref_mut() {
            t.mode = mode;
            t.regex_matched = regex_matched;
        }

        match mode {
            MatchMode::EntityRegex => self.entity_mode(req, rule, regex_matched, trace),
            MatchMode::Intent => self.intent_mode(req, rule, trace),
        }
    }

    fn entity_mode<R: TurnRequest + ?Sized>(
        &self,
        req: &R,
        rule: &CompiledRule,
        regex_matched: bool,
        trace: Option<&mut EvaluationTrace>,
    ) -> Option<Match> {
        let h = &self.handicaps;
        let intents_proposed = req.intents().is_some_and(|intents| !intents.is_empty());
        let no_intent_handicap = if intents_proposed { h.redundant_handicap } else { 0.0 };
        let observed = req.entities();

        if rule.entities.is_empty() {
            if !regex_matched {
                return None;
            }
            return Some(Match {
                intent: None,
                entities: Vec::new(),
                score: 1.0 - no_intent_handicap - observed.len() as f64 * h.redundant_handicap,
                features: MatchFeatures::REGEX,
            });
        }

        let alignment = Alignment::align(&rule.entities, observed, h);
        if let Some(t) = trace {
            t.alignment = Some(AlignmentSummary::from(&alignment));
        }
        if alignment.score == 0.0 {
            return None;
        }

        let extra = alignment.matched.len().saturating_sub(if regex_matched { 0 } else { 1 });
        let score = (alignment.score - no_intent_handicap - alignment.handicap) * gain(h, extra);

        let mut features = MatchFeatures::ENTITY;
        features.set(MatchFeatures::REGEX, regex_matched);

        Some(Match { intent: None, entities: alignment.matched.into_iter().cloned().collect(), score, features })
    }

    fn intent_mode<R: TurnRequest + ?Sized>(
        &self,
        req: &R,
        rule: &CompiledRule,
        mut trace: Option<&mut EvaluationTrace>,
    ) -> Option<Match> {
        let observed = req.intents().filter(|intents| !intents.is_empty())?;

        let mut best: Option<Match> = None;
        let mut max = 0.0;

        for wanted in &rule.intents {
            for candidate in observed {
                if candidate.intent.as_deref() != Some(wanted.as_str()) {
                    continue;
                }

                let scored = self.score_candidate(candidate, rule, req.entities());
                if let Some(t) = trace.as_deref_mut() {
                    t.candidates.push(CandidateTrace {
                        intent: wanted.clone(),
                        observed_score: candidate.score,
                        score: scored.as_ref().map_or(0.0, |(score, _)| *score),
                        matched_entities: scored.as_ref().map_or(0, |(_, matched)| matched.len()),
                    });
                }

                let Some((score, matched)) = scored else {
                    continue;
                };
                if score > max {
                    max = score;
                    let mut features = MatchFeatures::INTENT;
                    features.set(MatchFeatures::ENTITY, !matched.is_empty());
                    best = Some(Match {
                        intent: candidate.intent.clone(),
                        entities: matched.into_iter().cloned().collect(),
                        score,
                        features,
                    });
                }
            }
        }

        best
    }

    /// Score one observed intent already known to carry the wanted name.
    /// `None` when the rule's entity requirements reject it.
    fn score_candidate<'a>(
        &self,
        candidate: &'a ObservedIntent,
        rule: &CompiledRule,
        turn_entities: &'a [ObservedEntity],
    ) -> Option<(f64, Vec<&'a ObservedEntity>)> {
        let h = &self.handicaps;
        let entities = candidate.entities.as_deref().unwrap_or(turn_entities);

        if rule.entities.is_empty() {
            return Some((candidate.score - entities.len() as f64 * h.redundant_handicap, Vec::new()));
        }

        let alignment = Alignment::align(&rule.entities, entities, h);
        if alignment.score == 0.0 {
            return None;
        }

        let score = (candidate.score - alignment.handicap) * gain(h, alignment.matched.len());
        Some((score, alignment.matched))
    }
}

fn gain(h: &Handicaps, count: usize) -> f64 {
    h.multi_match_gain.powi(count as i32)
}
