use crate::engine::{Evaluation, Handicaps, Matcher};
use crate::{CompiledRule, Match, RuleDefinition, RuleError, TurnRequest};
use once_cell::sync::Lazy;

static DEFAULT_MATCHER: Lazy<Matcher> = Lazy::new(Matcher::default);

/// Compile a rule definition: a single token (`"hello"`, `"@age>=18"`,
/// `"#yes|yeah"`) or an ordered list of them.
///
/// # Example
/// ```
/// use intentmatch::compile;
///
/// let rule = compile(["hello", "@name?"]).unwrap();
/// assert_eq!(rule.intents, vec!["hello".to_string()]);
/// assert!(compile("@=oops").is_err());
/// ```
pub fn compile(definition: impl Into<RuleDefinition>) -> Result<CompiledRule, RuleError> {
    CompiledRule::compile(definition)
}

/// Evaluate `rule` against `req` with the default [`Handicaps`].
///
/// # Example
/// ```
/// use intentmatch::{compile, evaluate, Utterance};
///
/// let rule = compile("#yes|yeah").unwrap();
/// assert!(evaluate(&Utterance::new("Yeah!"), &rule).is_some());
/// assert!(evaluate(&Utterance::new("yeah, no"), &rule).is_none());
/// ```
pub fn evaluate<R: TurnRequest + ?Sized>(req: &R, rule: &CompiledRule) -> Option<Match> {
    DEFAULT_MATCHER.evaluate(req, rule)
}

/// Evaluate `rule` against `req` with custom handicaps.
pub fn evaluate_with<R: TurnRequest + ?Sized>(req: &R, rule: &CompiledRule, handicaps: &Handicaps) -> Option<Match> {
    Matcher::new(*handicaps).evaluate(req, rule)
}

/// Evaluate and return a trace of the decision (mode, candidates, timing).
///
/// Meant for debugging rule scores; [`evaluate`] skips the bookkeeping.
pub fn explain_with<R: TurnRequest + ?Sized>(req: &R, rule: &CompiledRule, handicaps: &Handicaps) -> Evaluation {
    Matcher::new(*handicaps).explain(req, rule)
}
