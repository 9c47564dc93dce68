//! Evaluation traces.
//!
//! Opt-in: only [`Matcher::explain`](super::Matcher::explain) collects them,
//! so the `evaluate` hot path allocates nothing beyond its result.

use super::alignment::Alignment;
use crate::Match;
use serde::Serialize;
use std::time::Duration;

/// Which branch of the engine handled the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// A literal matched, or the rule has only entity requirements.
    #[default]
    EntityRegex,
    Intent,
}

/// One observed intent scored against a wanted intent of the same name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateTrace {
    pub intent: String,
    pub observed_score: f64,
    /// `0` when the entity requirements rejected the candidate.
    pub score: f64,
    pub matched_entities: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentSummary {
    pub score: f64,
    pub handicap: f64,
    pub matched: usize,
}

impl From<&Alignment<'_>> for AlignmentSummary {
    fn from(alignment: &Alignment<'_>) -> Self {
        AlignmentSummary { score: alignment.score, handicap: alignment.handicap, matched: alignment.matched.len() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationTrace {
    pub mode: MatchMode,
    pub regex_matched: bool,
    /// Entity/regex mode alignment, when the rule has entity requirements.
    pub alignment: Option<AlignmentSummary>,
    /// Intent mode candidates, in evaluation order.
    pub candidates: Vec<CandidateTrace>,
    pub elapsed: Duration,
}

/// Result of [`Matcher::explain`](super::Matcher::explain).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub result: Option<Match>,
    pub trace: EvaluationTrace,
}
