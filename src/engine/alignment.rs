//! Greedy alignment of wanted entity expressions to observed entities.
//!
//! Wanted expressions are processed in order. Each one takes the first
//! observed entity of its type at or after that type's cursor; a consumed
//! entity moves the cursor past it, so repeated types pair up in order and an
//! observed instance is never consumed twice:
//!
//! ```text
//! wanted:   @color        @color        @size?
//! observed: color=red  size=M  color=blue
//!           ^ cursor[color]=0 → red, cursor[color]=1
//!                              ^ scan from 1 → blue, cursor[color]=3
//!                   ^ cursor[size]=0 → M
//! ```
//!
//! A failed required expression aborts the whole alignment. A failed optional
//! one costs `redundant_handicap`, a matched optional one
//! `optional_handicap`, and every observed entity left unconsumed costs
//! another `redundant_handicap`.

use super::matcher::Handicaps;
use crate::{EntityExpression, ObservedEntity};
use std::collections::HashMap;
use tracing::trace;

/// Outcome of aligning a rule's entity requirements with a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment<'a> {
    /// Mean score of the consumed entities, `0` when nothing was consumed.
    pub score: f64,
    pub handicap: f64,
    /// Consumed entities, in the order of the expressions that took them.
    pub matched: Vec<&'a ObservedEntity>,
}

impl<'a> Alignment<'a> {
    fn rejected() -> Self {
        Alignment { score: 0.0, handicap: 0.0, matched: Vec::new() }
    }

    pub fn align(wanted: &[EntityExpression], observed: &'a [ObservedEntity], handicaps: &Handicaps) -> Self {
        // Next index each entity type may be taken from.
        let mut cursors: HashMap<&str, usize> = HashMap::new();
        let mut matched: Vec<&'a ObservedEntity> = Vec::with_capacity(wanted.len());
        let mut handicap = 0.0;
        let mut sum = 0.0;

        for expr in wanted {
            let start = cursors.get(expr.entity.as_str()).copied().unwrap_or(0);
            let found = observed
                .iter()
                .enumerate()
                .skip(start)
                .find(|(_, e)| e.entity == expr.entity)
                .filter(|(_, e)| expr.accepts(&e.value));

            match found {
                Some((index, entity)) => {
                    if expr.optional {
                        handicap += handicaps.optional_handicap;
                    }
                    matched.push(entity);
                    sum += entity.score;
                    cursors.insert(expr.entity.as_str(), index + 1);
                }
                None if expr.optional => handicap += handicaps.redundant_handicap,
                None => {
                    trace!(expression = %expr, "required entity missing, alignment rejected");
                    return Self::rejected();
                }
            }
        }

        handicap += (observed.len() - matched.len()) as f64 * handicaps.redundant_handicap;
        let score = if matched.is_empty() { 0.0 } else { sum / matched.len() as f64 };

        Alignment { score, handicap, matched }
    }
}
