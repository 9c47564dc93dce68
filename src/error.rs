/// Errors raised while compiling a rule definition.
///
/// Evaluation itself never fails; only malformed rules are reported, so they
/// surface when the rule is built instead of silently matching nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// An `@entity` token that does not follow
    /// `@<entity>[?][<op><compare,...>]`.
    #[error("invalid entity expression: {0:?}")]
    InvalidExpression(String),

    /// A rule definition without any token.
    #[error("rule definition contains no tokens")]
    EmptyRule,
}
