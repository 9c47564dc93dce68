//! Rule compilation.
//!
//! A rule definition is a single token or an ordered list of tokens. Each
//! token is classified once, here, and compiled into the immutable
//! [`CompiledRule`] that the engine evaluates on every turn:
//!
//! ```text
//! "buy"            ──▶ intents
//! "@age>=18"       ──▶ expression.rs ──▶ comparator.rs ──▶ entities
//! EntityRequirement ─────────────────────┘
//! "#yes|yeah"      ──▶ literal.rs ──▶ regexes
//! ```
//!
//! ## Responsibilities by module
//!
//! - `comparator.rs`: operator tokens and compare-value normalization, plus
//!   the value test used during alignment.
//! - `expression.rs`: the `@entity` grammar and the pre-structured object form.
//! - `literal.rs`: `#literal` forms (emoji run, closed substring, open word
//!   list) and the tolerant fallback for patterns that do not compile.
//! - `preprocess.rs`: token classification and `CompiledRule` assembly.

#[path = "compiler/comparator.rs"]
mod comparator;
#[path = "compiler/expression.rs"]
mod expression;
#[path = "compiler/literal.rs"]
mod literal;
#[path = "compiler/preprocess.rs"]
mod preprocess;

pub use comparator::{CompareValue, Comparison, ComparisonOperator};
pub use expression::{EntityExpression, EntityRequirement};
pub use literal::RegexComparator;
pub use preprocess::{CompiledRule, RuleDefinition, RuleToken};
