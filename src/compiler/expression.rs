//! Entity expressions: `@<entity>[?][<op><compare,compare,...>]`.
//!
//! ```text
//! @color            existence only
//! @size?            optional existence
//! @age>=18          numeric bound
//! @count<>1,5       inclusive range
//! @color=red,blue   membership (also the default operator)
//! ```
//!
//! The entity name excludes `= > < ! ?`. An operator without compare values
//! (or compare values without an operator) degrades to an existence check.

use super::comparator::{CompareValue, Comparison, ComparisonOperator};
use crate::RuleError;
use serde::{Deserialize, Deserializer};
use std::fmt;

/// A requirement on one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityExpression {
    pub entity: String,
    pub optional: bool,
    /// `None` requires only that the entity is present.
    pub comparison: Option<Comparison>,
}

impl EntityExpression {
    /// Required existence check for `entity`.
    pub fn new(entity: impl Into<String>) -> Self {
        Self { entity: entity.into(), optional: false, comparison: None }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = Some(comparison);
        self
    }

    /// Parse one `@...` token.
    pub fn parse(token: &str) -> Result<Self, RuleError> {
        let re = regex!(r"(?i)^@([^=><!?]+)(\?)?([!=><]{1,2})?([^=><!]+)?$");
        let caps = re.captures(token.trim()).ok_or_else(|| RuleError::InvalidExpression(token.to_string()))?;

        let entity = caps[1].to_string();
        let optional = caps.get(2).is_some();

        let comparison = match (caps.get(3), caps.get(4)) {
            (Some(op), Some(compare)) => {
                let op = ComparisonOperator::from_token(Some(op.as_str()));
                let values: Vec<CompareValue> = compare.as_str().split(',').map(CompareValue::from).collect();
                Some(Comparison::normalize(op, &values))
            }
            _ => None,
        };

        Ok(Self { entity, optional, comparison })
    }

    /// Whether an observed value satisfies this expression.
    pub fn accepts(&self, value: &str) -> bool {
        self.comparison.as_ref().is_none_or(|c| c.test(value))
    }
}

impl fmt::Display for EntityExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.entity)?;
        if self.optional {
            f.write_str("?")?;
        }
        if let Some(comparison) = &self.comparison {
            write!(f, "{comparison}")?;
        }
        Ok(())
    }
}

/// Pre-structured entity requirement, for callers that build rules in code
/// or load them from JSON instead of writing `@...` tokens.
///
/// `compare` accepts a single value or a list. When `op` is missing but
/// `compare` is present the values are matched for equality.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EntityRequirement {
    pub entity: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub op: Option<ComparisonOperator>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub compare: Option<Vec<CompareValue>>,
}

impl From<EntityRequirement> for EntityExpression {
    fn from(req: EntityRequirement) -> Self {
        let comparison = match (req.op, req.compare) {
            (Some(op), compare) => Some(Comparison::normalize(op, compare.as_deref().unwrap_or_default())),
            (None, Some(compare)) => Some(Comparison::normalize(ComparisonOperator::Eq, &compare)),
            (None, None) => None,
        };
        EntityExpression { entity: req.entity, optional: req.optional, comparison }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<CompareValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<CompareValue>),
        One(CompareValue),
    }

    Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(|v| match v {
        OneOrMany::Many(values) => values,
        OneOrMany::One(value) => vec![value],
    }))
}
