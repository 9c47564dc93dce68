/// Lazily compiled static regex. Panics only when the literal itself is not a
/// valid pattern, which is a programming error caught by the test suite.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a [`RuleDefinition`](crate::RuleDefinition) from a list of tokens.
///
/// Each item goes through `RuleToken::from`, so plain `&str` tokens are
/// classified by their prefix and `EntityExpression` values are taken as-is.
///
/// ```
/// use intentmatch::rule;
///
/// let def = rule!["buy-ticket", "@age>=18", "@seat?"];
/// assert_eq!(def.tokens().len(), 3);
/// ```
#[macro_export]
macro_rules! rule {
    ( $($tok:expr),* $(,)? ) => {{
        $crate::RuleDefinition::List(vec![ $($crate::RuleToken::from($tok)),* ])
    }};
}
