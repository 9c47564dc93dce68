//! Intent / entity / regex-literal matching and scoring for conversational routing.
//!
//! A routing rule is written as a handful of tokens: plain intent names,
//! `@entity` expressions (optionally with a comparator) and `#literal`
//! patterns. [`CompiledRule::compile`] turns such a definition into an
//! immutable, reusable form once; [`Matcher::evaluate`] then scores it against
//! the NLU result of a single turn and returns either `None` or a [`Match`].
//!
//! ```
//! use intentmatch::{compile, evaluate, ObservedEntity, ObservedIntent, Utterance};
//!
//! let rule = compile(["order", "@count>0"]).unwrap();
//! let turn = Utterance::new("two pizzas please")
//!     .with_intents(vec![ObservedIntent::new("order", 0.9)])
//!     .with_entities(vec![ObservedEntity::new("count", "2", 0.8)]);
//!
//! let found = evaluate(&turn, &rule).unwrap();
//! assert_eq!(found.intent.as_deref(), Some("order"));
//! ```

extern crate self as intentmatch;

#[macro_use]
mod macros;
mod api;
mod compiler;
mod engine;
mod error;
mod normalize;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub use api::{compile, evaluate, evaluate_with, explain_with};
pub use compiler::{
    CompareValue, CompiledRule, Comparison, ComparisonOperator, EntityExpression, EntityRequirement,
    RegexComparator, RuleDefinition, RuleToken,
};
pub use engine::{
    Alignment, AlignmentSummary, CandidateTrace, Evaluation, EvaluationTrace, Handicaps, MatchMode, Matcher,
    RankedMatch, RuleSet,
};
pub use error::RuleError;
pub use normalize::{normalize_text, replace_diacritics};

// --- Observed turn data -----------------------------------------------------

/// One entity instance recognized in the current turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedEntity {
    /// Entity type, e.g. `"color"`.
    pub entity: String,
    /// Recognized value as text. Numeric comparators parse it on demand.
    pub value: String,
    /// Recognizer confidence in `0..=1`.
    #[serde(default = "full_confidence")]
    pub score: f64,
}

impl ObservedEntity {
    pub fn new(entity: impl Into<String>, value: impl Into<String>, score: f64) -> Self {
        Self { entity: entity.into(), value: value.into(), score }
    }
}

/// One candidate intent proposed by the classifier for the current turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedIntent {
    #[serde(default)]
    pub intent: Option<String>,
    pub score: f64,
    /// Entities attached to this intent. When absent, the turn-level entity
    /// list is used instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<ObservedEntity>>,
}

impl ObservedIntent {
    pub fn new(intent: impl Into<String>, score: f64) -> Self {
        Self { intent: Some(intent.into()), score, entities: None }
    }

    /// Attach intent-local entities.
    pub fn with_entities(mut self, entities: Vec<ObservedEntity>) -> Self {
        self.entities = Some(entities);
        self
    }
}

fn full_confidence() -> f64 {
    1.0
}

bitflags::bitflags! {
    /// Which kinds of evidence corroborated a match.
    ///
    /// Informational only: the score is computed independently of these bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MatchFeatures: u8 {
        const INTENT = 1 << 0;
        const ENTITY = 1 << 1;
        const REGEX  = 1 << 2;
    }
}

impl Serialize for MatchFeatures {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        names.serialize(serializer)
    }
}

/// Result of a successful evaluation.
///
/// Scores are relative: handicaps subtract and the multi-match gain
/// multiplies, so a score may leave `0..=1`. Compare matches with each other,
/// not against a fixed ceiling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    /// Winning observed intent, or `None` for entity / regex driven matches.
    pub intent: Option<String>,
    /// Entities consumed by the rule's entity requirements. In intent mode this
    /// is the aligned subset, not every entity the observed intent carried.
    pub entities: Vec<ObservedEntity>,
    pub score: f64,
    pub features: MatchFeatures,
}

// --- Turn input -------------------------------------------------------------

/// What the engine needs to know about the current turn.
///
/// `intents()` returning `None` means the classifier was not consulted, which
/// the engine treats the same as an empty candidate list.
pub trait TurnRequest {
    /// Raw text (`normalized == false`) or its diacritic-folded, lower-cased
    /// form (`normalized == true`).
    fn text(&self, normalized: bool) -> Cow<'_, str>;
    fn intents(&self) -> Option<&[ObservedIntent]>;
    fn entities(&self) -> &[ObservedEntity];
}

/// Stock [`TurnRequest`] holding the turn's text and NLU output.
///
/// The normalized text is computed once on construction (see
/// [`normalize_text`]).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "UtteranceFields")]
pub struct Utterance {
    text: String,
    normalized: String,
    intents: Option<Vec<ObservedIntent>>,
    entities: Vec<ObservedEntity>,
}

#[derive(Deserialize)]
struct UtteranceFields {
    #[serde(default)]
    text: String,
    #[serde(default)]
    intents: Option<Vec<ObservedIntent>>,
    #[serde(default)]
    entities: Vec<ObservedEntity>,
}

impl From<UtteranceFields> for Utterance {
    fn from(fields: UtteranceFields) -> Self {
        Utterance::new(fields.text).with_optional_intents(fields.intents).with_entities(fields.entities)
    }
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let normalized = normalize_text(&text);
        Self { text, normalized, intents: None, entities: Vec::new() }
    }

    pub fn with_intents(self, intents: Vec<ObservedIntent>) -> Self {
        self.with_optional_intents(Some(intents))
    }

    /// `None` marks the classifier as not consulted for this turn.
    pub fn with_optional_intents(mut self, intents: Option<Vec<ObservedIntent>>) -> Self {
        self.intents = intents;
        self
    }

    pub fn with_entities(mut self, entities: Vec<ObservedEntity>) -> Self {
        self.entities = entities;
        self
    }

    /// Replace the text, keeping the NLU output.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.normalized = normalize_text(&self.text);
    }
}

impl TurnRequest for Utterance {
    fn text(&self, normalized: bool) -> Cow<'_, str> {
        if normalized { Cow::Borrowed(&self.normalized) } else { Cow::Borrowed(&self.text) }
    }

    fn intents(&self) -> Option<&[ObservedIntent]> {
        self.intents.as_deref()
    }

    fn entities(&self) -> &[ObservedEntity] {
        &self.entities
    }
}
