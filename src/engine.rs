//! Matching and scoring engine.
//!
//! This is the per-turn half of the crate: given a [`CompiledRule`] and the
//! NLU result of a turn it decides whether the rule applies and how well.
//!
//! ```text
//! CompiledRule ──┐
//!                │  Matcher::evaluate                 (matcher.rs)
//! turn ──────────┼─ regex check → mode selection
//!                │        │
//!                │        └─ Alignment::align         (alignment.rs)
//!                v
//!          Option<Match>
//!                │
//!                └─ RuleSet::rank / best              (selection.rs)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `alignment.rs`: greedy pairing of wanted entity expressions with observed
//!   entities, producing a mean score, a handicap and the consumed entities.
//! - `matcher.rs`: mode selection and the scoring formulas; holds the
//!   configurable [`Handicaps`].
//! - `selection.rs`: comparing the matches of several competing rules.
//! - `trace.rs`: opt-in evaluation traces for debugging rule scores.
//!
//! Evaluation is pure: no I/O, no shared mutable state, output fully
//! determined by the inputs. A `Matcher` and a `CompiledRule` can be shared
//! across threads and evaluated concurrently.
//!
//! ## Debugging
//!
//! Mode selection and alignment rejections are logged through `tracing` at
//! `debug` / `trace` level.
//!
//! [`CompiledRule`]: crate::CompiledRule

#[path = "engine/alignment.rs"]
mod alignment;
#[path = "engine/matcher.rs"]
mod matcher;
#[path = "engine/selection.rs"]
mod selection;
#[path = "engine/trace.rs"]
mod trace;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub use alignment::Alignment;
pub use matcher::{Handicaps, Matcher};
pub use selection::{RankedMatch, RuleSet};
pub use trace::{AlignmentSummary, CandidateTrace, Evaluation, EvaluationTrace, MatchMode};
