//! Token classification and [`CompiledRule`] assembly.

use super::expression::{EntityExpression, EntityRequirement};
use super::literal::RegexComparator;
use crate::RuleError;
use serde::Deserialize;
use tracing::debug;

/// One token of a rule definition, classified once at construction.
///
/// Plain strings are sniffed by prefix: `@` is an entity expression, `#` a
/// literal, anything else an intent name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawToken")]
pub enum RuleToken {
    Intent(String),
    /// Unparsed `@...` text; parsed (and validated) by [`CompiledRule::compile`].
    Entity(String),
    Literal(String),
    Expression(EntityExpression),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawToken {
    Text(String),
    Object(EntityRequirement),
}

impl From<RawToken> for RuleToken {
    fn from(raw: RawToken) -> Self {
        match raw {
            RawToken::Text(text) => RuleToken::from(text),
            RawToken::Object(req) => RuleToken::Expression(req.into()),
        }
    }
}

impl From<String> for RuleToken {
    fn from(text: String) -> Self {
        if text.starts_with('@') {
            RuleToken::Entity(text)
        } else if text.starts_with('#') {
            RuleToken::Literal(text)
        } else {
            RuleToken::Intent(text)
        }
    }
}

impl From<&str> for RuleToken {
    fn from(text: &str) -> Self {
        RuleToken::from(text.to_string())
    }
}

impl From<&String> for RuleToken {
    fn from(text: &String) -> Self {
        RuleToken::from(text.clone())
    }
}

impl From<EntityExpression> for RuleToken {
    fn from(expr: EntityExpression) -> Self {
        RuleToken::Expression(expr)
    }
}

impl From<EntityRequirement> for RuleToken {
    fn from(req: EntityRequirement) -> Self {
        RuleToken::Expression(req.into())
    }
}

/// A rule as written: one token or an ordered list of them.
///
/// Deserializes from a string, an entity-requirement object, or an array
/// mixing both.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RuleDefinition {
    List(Vec<RuleToken>),
    Single(RuleToken),
}

impl RuleDefinition {
    pub fn tokens(&self) -> &[RuleToken] {
        match self {
            RuleDefinition::List(tokens) => tokens,
            RuleDefinition::Single(token) => std::slice::from_ref(token),
        }
    }
}

impl From<RuleToken> for RuleDefinition {
    fn from(token: RuleToken) -> Self {
        RuleDefinition::Single(token)
    }
}

impl From<&str> for RuleDefinition {
    fn from(token: &str) -> Self {
        RuleDefinition::Single(token.into())
    }
}

impl From<String> for RuleDefinition {
    fn from(token: String) -> Self {
        RuleDefinition::Single(token.into())
    }
}

impl From<EntityExpression> for RuleDefinition {
    fn from(expr: EntityExpression) -> Self {
        RuleDefinition::Single(expr.into())
    }
}

impl<T: Into<RuleToken>> From<Vec<T>> for RuleDefinition {
    fn from(tokens: Vec<T>) -> Self {
        RuleDefinition::List(tokens.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<RuleToken>, const N: usize> From<[T; N]> for RuleDefinition {
    fn from(tokens: [T; N]) -> Self {
        RuleDefinition::List(tokens.into_iter().map(Into::into).collect())
    }
}

/// Immutable, reusable form of a rule definition.
///
/// Build it once per rule and share it; evaluation only reads it, so one
/// instance can serve any number of concurrent evaluations.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub regexes: Vec<RegexComparator>,
    pub intents: Vec<String>,
    pub entities: Vec<EntityExpression>,
}

impl CompiledRule {
    /// Classify and compile every token of `definition`, keeping each
    /// category in definition order.
    pub fn compile(definition: impl Into<RuleDefinition>) -> Result<Self, RuleError> {
        let definition = definition.into();
        let tokens = definition.tokens();
        if tokens.is_empty() {
            return Err(RuleError::EmptyRule);
        }

        let mut rule = CompiledRule { regexes: Vec::new(), intents: Vec::new(), entities: Vec::new() };

        for token in tokens {
            match token {
                RuleToken::Intent(name) => rule.intents.push(name.clone()),
                RuleToken::Entity(text) => rule.entities.push(EntityExpression::parse(text)?),
                RuleToken::Literal(text) => rule.regexes.push(RegexComparator::compile(text)),
                RuleToken::Expression(expr) => rule.entities.push(expr.clone()),
            }
        }

        debug!(
            intents = rule.intents.len(),
            entities = rule.entities.len(),
            regexes = rule.regexes.len(),
            "compiled rule"
        );

        Ok(rule)
    }

    /// A rule made only of entity requirements.
    pub fn is_pure_entity(&self) -> bool {
        self.intents.is_empty() && self.regexes.is_empty()
    }
}
