use crate::{
    CompiledRule, Handicaps, MatchFeatures, MatchMode, Matcher, ObservedEntity, ObservedIntent, TurnRequest,
    Utterance,
};
use std::borrow::Cow;

fn approx(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
}

fn entity(name: &str, value: &str, score: f64) -> ObservedEntity {
    ObservedEntity::new(name, value, score)
}

fn compile(tokens: &[&str]) -> CompiledRule {
    CompiledRule::compile(tokens.to_vec()).unwrap()
}

/// Turn whose raw and normalized texts are set independently.
struct SplitTurn {
    raw: &'static str,
    normalized: &'static str,
}

impl TurnRequest for SplitTurn {
    fn text(&self, normalized: bool) -> Cow<'_, str> {
        Cow::Borrowed(if normalized { self.normalized } else { self.raw })
    }

    fn intents(&self) -> Option<&[ObservedIntent]> {
        None
    }

    fn entities(&self) -> &[ObservedEntity] {
        &[]
    }
}

#[test]
fn evaluation_is_deterministic() {
    let rule = compile(&["order", "@count>0", "@size?"]);
    let turn = Utterance::new("two large")
        .with_intents(vec![ObservedIntent::new("order", 0.83), ObservedIntent::new("order", 0.61)])
        .with_entities(vec![entity("count", "2", 0.7), entity("size", "large", 0.4)]);
    let matcher = Matcher::default();

    let first = matcher.evaluate(&turn, &rule);
    for _ in 0..10 {
        assert_eq!(matcher.evaluate(&turn, &rule), first);
    }
    assert_eq!(first.unwrap().score.to_bits(), matcher.evaluate(&turn, &rule).unwrap().score.to_bits());
}

#[test]
fn existence_only_entity_rule() {
    let rule = compile(&["@color"]);
    let red = entity("color", "red", 0.9);
    let turn = Utterance::new("red").with_entities(vec![red.clone()]);

    let found = Matcher::default().evaluate(&turn, &rule).unwrap();
    assert_eq!(found.intent, None);
    assert_eq!(found.entities, vec![red.clone()]);
    assert_eq!(found.features, MatchFeatures::ENTITY);
    approx(found.score, 0.9);

    // A classifier proposal for the turn costs a non-intent rule one handicap.
    let turn = turn.with_intents(vec![ObservedIntent::new("smalltalk", 0.4)]);
    approx(Matcher::default().evaluate(&turn, &rule).unwrap().score, 0.85);
}

#[test]
fn strict_numeric_comparator() {
    let rule = compile(&["@age>=18"]);
    let matcher = Matcher::default();
    let turn = |age: &str| Utterance::new(age).with_entities(vec![entity("age", age, 1.0)]);

    assert!(matcher.evaluate(&turn("17"), &rule).is_none());
    approx(matcher.evaluate(&turn("18"), &rule).unwrap().score, 1.0);
    approx(matcher.evaluate(&turn("30"), &rule).unwrap().score, 1.0);
    assert!(matcher.evaluate(&turn("adult"), &rule).is_none());
}

#[test]
fn optional_entity_fallback() {
    let rule = compile(&["@color", "@size?"]);
    let matcher = Matcher::default();
    let h = Handicaps::default();

    let both = Utterance::new("").with_entities(vec![entity("color", "red", 1.0), entity("size", "M", 1.0)]);
    let both = matcher.explain(&both, &rule);
    approx(both.trace.alignment.as_ref().unwrap().handicap, h.optional_handicap);
    approx(both.result.unwrap().score, (1.0 - h.optional_handicap) * h.multi_match_gain);

    let only_color = Utterance::new("").with_entities(vec![entity("color", "red", 1.0)]);
    let only_color = matcher.explain(&only_color, &rule);
    approx(only_color.trace.alignment.as_ref().unwrap().handicap, h.redundant_handicap);

    let found = only_color.result.unwrap();
    assert_eq!(found.entities.len(), 1);
    approx(found.score, 1.0 - h.redundant_handicap);
}

#[test]
fn repeated_entity_types_consume_in_order() {
    let rule = compile(&["@color", "@color"]);
    let red = entity("color", "red", 0.8);
    let blue = entity("color", "blue", 0.6);
    let turn = Utterance::new("red and blue").with_entities(vec![red.clone(), blue.clone()]);

    let found = Matcher::default().evaluate(&turn, &rule).unwrap();
    assert_eq!(found.entities, vec![red, blue]);
    // Mean 0.7, one extra matched entity.
    approx(found.score, 0.7 * 1.2);

    let single = Utterance::new("red").with_entities(vec![entity("color", "red", 0.8)]);
    assert!(Matcher::default().evaluate(&single, &rule).is_none());
}

#[test]
fn open_word_list_needs_exact_text() {
    let rule = compile(&["#abc|xyz"]);
    let matcher = Matcher::default();

    assert!(matcher.evaluate(&Utterance::new("ABC"), &rule).is_some());
    assert!(matcher.evaluate(&Utterance::new("xyz!"), &rule).is_some());
    assert!(matcher.evaluate(&Utterance::new("abc xyz"), &rule).is_none());
    assert!(matcher.evaluate(&Utterance::new("abcd"), &rule).is_none());
}

#[test]
fn closed_literal_matches_anywhere() {
    let rule = compile(&["#abc|xyz#"]);
    let matcher = Matcher::default();

    let found = matcher.evaluate(&Utterance::new("I said XYZ, twice"), &rule).unwrap();
    assert_eq!(found.features, MatchFeatures::REGEX);
    approx(found.score, 1.0);
    assert!(matcher.evaluate(&Utterance::new("nothing here"), &rule).is_none());
}

#[test]
fn accented_text_matches_folded_literal() {
    let rule = compile(&["#word-match|foo-match"]);
    let matcher = Matcher::default();

    assert!(matcher.evaluate(&Utterance::new("Word matčh"), &rule).is_some());
    assert!(matcher.evaluate(&Utterance::new("Not Word matčh"), &rule).is_none());
}

#[test]
fn emoji_literal_reads_raw_text_only() {
    let rule = compile(&["#😀😃😄"]);
    let matcher = Matcher::default();

    assert!(matcher.evaluate(&Utterance::new("😃😄😃😄😃😄"), &rule).is_some());
    assert!(matcher.evaluate(&Utterance::new("😃😄😃😄😃😄."), &rule).is_none());
    assert!(matcher.evaluate(&Utterance::new("😃😎"), &rule).is_none());

    let folded_only = SplitTurn { raw: "smile", normalized: "😀" };
    assert!(matcher.evaluate(&folded_only, &rule).is_none());
    let raw_only = SplitTurn { raw: "😀", normalized: "" };
    assert!(matcher.evaluate(&raw_only, &rule).is_some());
}

#[test]
fn regex_with_entities_counts_every_match_as_extra() {
    let rule = compile(&["#yes|sure", "@count"]);
    let turn = Utterance::new("yes").with_intents(vec![]).with_entities(vec![entity("count", "3", 0.8)]);

    let found = Matcher::default().evaluate(&turn, &rule).unwrap();
    assert_eq!(found.features, MatchFeatures::REGEX | MatchFeatures::ENTITY);
    approx(found.score, 0.8 * 1.2);
}

#[test]
fn regex_only_rule_pays_for_unrequested_entities() {
    let rule = compile(&["#yes#"]);
    let entities = vec![entity("count", "3", 0.8), entity("color", "red", 0.8)];

    let turn = Utterance::new("oh yes").with_entities(entities.clone());
    approx(Matcher::default().evaluate(&turn, &rule).unwrap().score, 0.9);

    let turn = turn.with_intents(vec![ObservedIntent::new("confirm", 0.9)]);
    approx(Matcher::default().evaluate(&turn, &rule).unwrap().score, 0.85);
}

#[test]
fn unmatched_literal_falls_back_to_intent_mode() {
    let rule = compile(&["hello", "#bye#"]);
    let turn = Utterance::new("hi there").with_intents(vec![ObservedIntent::new("hello", 0.9)]);

    let evaluation = Matcher::default().explain(&turn, &rule);
    assert_eq!(evaluation.trace.mode, MatchMode::Intent);
    assert!(!evaluation.trace.regex_matched);

    let found = evaluation.result.unwrap();
    assert_eq!(found.intent.as_deref(), Some("hello"));
    assert_eq!(found.features, MatchFeatures::INTENT);
    approx(found.score, 0.9);
}

#[test]
fn intent_rule_pays_for_unrequested_entities() {
    let rule = compile(&["hello"]);
    let turn = Utterance::new("hi")
        .with_intents(vec![ObservedIntent::new("hello", 0.9)])
        .with_entities(vec![entity("name", "Bob", 1.0), entity("time", "now", 1.0)]);

    let found = Matcher::default().evaluate(&turn, &rule).unwrap();
    assert!(found.entities.is_empty());
    approx(found.score, 0.8);
}

#[test]
fn intent_local_entities_override_turn_entities() {
    let rule = compile(&["book", "@city"]);
    let prague = entity("city", "Prague", 0.9);
    let turn = Utterance::new("book Prague")
        .with_intents(vec![ObservedIntent::new("book", 0.8).with_entities(vec![prague.clone()])])
        .with_entities(vec![entity("person", "Anna", 1.0)]);

    let found = Matcher::default().evaluate(&turn, &rule).unwrap();
    assert_eq!(found.entities, vec![prague]);
    assert_eq!(found.features, MatchFeatures::INTENT | MatchFeatures::ENTITY);
    approx(found.score, 0.8 * 1.2);

    let without_local = Utterance::new("book")
        .with_intents(vec![ObservedIntent::new("book", 0.8)])
        .with_entities(vec![entity("person", "Anna", 1.0)]);
    assert!(Matcher::default().evaluate(&without_local, &rule).is_none());
}

#[test]
fn intent_mode_returns_only_aligned_entities() {
    let rule = compile(&["book", "@city"]);
    let prague = entity("city", "Prague", 0.9);
    let turn = Utterance::new("book Prague tomorrow").with_intents(vec![
        ObservedIntent::new("book", 0.8).with_entities(vec![prague.clone(), entity("date", "tomorrow", 0.9)]),
    ]);

    let found = Matcher::default().evaluate(&turn, &rule).unwrap();
    assert_eq!(found.entities, vec![prague]);
}

#[test]
fn intent_mode_keeps_strictly_higher_score() {
    let rule = compile(&["greet", "hello"]);
    let turn = Utterance::new("hey").with_intents(vec![
        ObservedIntent::new("hello", 0.5),
        ObservedIntent::new("other", 0.99),
        ObservedIntent::new("greet", 0.7),
    ]);

    let evaluation = Matcher::default().explain(&turn, &rule);
    assert_eq!(evaluation.trace.candidates.len(), 2);

    let found = evaluation.result.unwrap();
    assert_eq!(found.intent.as_deref(), Some("greet"));
    approx(found.score, 0.7);
}

#[test]
fn intent_mode_ties_keep_first_candidate() {
    let rule = compile(&["hello", "@color"]);
    let red = entity("color", "red", 1.0);
    let turn = Utterance::new("hello").with_intents(vec![
        ObservedIntent::new("hello", 0.7).with_entities(vec![red.clone()]),
        ObservedIntent::new("hello", 0.7).with_entities(vec![entity("color", "blue", 1.0)]),
    ]);

    let found = Matcher::default().evaluate(&turn, &rule).unwrap();
    assert_eq!(found.entities, vec![red]);
    approx(found.score, 0.7 * 1.2);
}

#[test]
fn intent_rule_without_observed_intents_fails() {
    let rule = compile(&["hello"]);
    let matcher = Matcher::default();

    assert!(matcher.evaluate(&Utterance::new("hello"), &rule).is_none());
    assert!(matcher.evaluate(&Utterance::new("hello").with_intents(vec![]), &rule).is_none());
}

#[test]
fn non_positive_intent_scores_never_win() {
    let rule = compile(&["hello"]);
    let turn = Utterance::new("hello")
        .with_intents(vec![ObservedIntent::new("hello", 0.04)])
        .with_entities(vec![entity("noise", "x", 1.0)]);

    assert!(Matcher::default().evaluate(&turn, &rule).is_none());
}

#[test]
fn handicaps_are_configurable() {
    let rule = compile(&["hello"]);
    let turn = Utterance::new("hello")
        .with_intents(vec![ObservedIntent::new("hello", 0.9)])
        .with_entities(vec![entity("noise", "x", 1.0)]);
    let matcher = Matcher::new(Handicaps { redundant_handicap: 0.2, ..Handicaps::default() });

    approx(matcher.evaluate(&turn, &rule).unwrap().score, 0.7);
}

#[test]
fn rules_evaluate_concurrently() {
    let rule = compile(&["order", "@count>0"]);
    let matcher = Matcher::default();
    let turn = Utterance::new("order two")
        .with_intents(vec![ObservedIntent::new("order", 0.9)])
        .with_entities(vec![entity("count", "2", 1.0)]);
    let expected = matcher.evaluate(&turn, &rule);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| matcher.evaluate(&turn, &rule))).collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
