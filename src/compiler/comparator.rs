//! Comparison operators and compare-value normalization.
//!
//! The operator decides the shape of the compare set:
//!
//! | operator              | compare set                                   |
//! |-----------------------|-----------------------------------------------|
//! | `eq`, `ne`            | any number of stringified values              |
//! | `gt`, `gte`, `lt`, `lte` | one numeric bound, `None` when unparseable |
//! | `range`               | `min, max`, `-inf` / `+inf` when unparseable  |
//!
//! [`Comparison`] fuses the operator with its set so the shape cannot drift
//! from the operator after construction.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Range,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ComparisonOperator {
    /// Map an operator token. Absent or unknown tokens compare for equality.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(">") => Self::Gt,
            Some(">=") | Some("=>") => Self::Gte,
            Some("<") => Self::Lt,
            Some("<=") | Some("=<") => Self::Lte,
            Some("!=") => Self::Ne,
            Some("<>") | Some("><") => Self::Range,
            _ => Self::Eq,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Range => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

/// A raw compare value as written by the rule author: text from an
/// `@entity` token, or either form from a structured requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompareValue {
    Number(f64),
    Text(String),
}

impl CompareValue {
    fn to_number(&self) -> Option<f64> {
        match self {
            CompareValue::Number(n) => Some(*n),
            CompareValue::Text(s) => parse_number(s),
        }
    }
}

impl fmt::Display for CompareValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareValue::Number(n) => f.write_str(&format_number(*n)),
            CompareValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CompareValue {
    fn from(s: &str) -> Self {
        CompareValue::Text(s.to_string())
    }
}

impl From<f64> for CompareValue {
    fn from(n: f64) -> Self {
        CompareValue::Number(n)
    }
}

/// An operator together with its normalized compare set.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Eq(Vec<String>),
    Ne(Vec<String>),
    Range { min: f64, max: f64 },
    Gt(Option<f64>),
    Gte(Option<f64>),
    Lt(Option<f64>),
    Lte(Option<f64>),
}

impl Comparison {
    /// Normalize `values` for `op`.
    ///
    /// Single-bound operators keep only the first value; `range` keeps the
    /// first two, substituting infinities for missing or unparseable bounds.
    pub fn normalize(op: ComparisonOperator, values: &[CompareValue]) -> Self {
        let bound = || values.first().and_then(CompareValue::to_number);
        match op {
            ComparisonOperator::Eq => Comparison::Eq(values.iter().map(ToString::to_string).collect()),
            ComparisonOperator::Ne => Comparison::Ne(values.iter().map(ToString::to_string).collect()),
            ComparisonOperator::Range => Comparison::Range {
                min: values.first().and_then(CompareValue::to_number).unwrap_or(f64::NEG_INFINITY),
                max: values.get(1).and_then(CompareValue::to_number).unwrap_or(f64::INFINITY),
            },
            ComparisonOperator::Gt => Comparison::Gt(bound()),
            ComparisonOperator::Gte => Comparison::Gte(bound()),
            ComparisonOperator::Lt => Comparison::Lt(bound()),
            ComparisonOperator::Lte => Comparison::Lte(bound()),
        }
    }

    pub fn operator(&self) -> ComparisonOperator {
        match self {
            Comparison::Eq(_) => ComparisonOperator::Eq,
            Comparison::Ne(_) => ComparisonOperator::Ne,
            Comparison::Range { .. } => ComparisonOperator::Range,
            Comparison::Gt(_) => ComparisonOperator::Gt,
            Comparison::Gte(_) => ComparisonOperator::Gte,
            Comparison::Lt(_) => ComparisonOperator::Lt,
            Comparison::Lte(_) => ComparisonOperator::Lte,
        }
    }

    /// Test an observed entity value.
    ///
    /// Numeric operators parse `value` first; a value that is not a number
    /// never matches, and neither does a bound that failed to parse.
    pub fn test(&self, value: &str) -> bool {
        match self {
            Comparison::Eq(set) => set.iter().any(|c| c == value),
            Comparison::Ne(set) => !set.iter().any(|c| c == value),
            Comparison::Range { min, max } => parse_number(value).is_some_and(|n| n >= *min && n <= *max),
            Comparison::Gt(bound) => numeric(value, *bound, |n, b| n > b),
            Comparison::Gte(bound) => numeric(value, *bound, |n, b| n >= b),
            Comparison::Lt(bound) => numeric(value, *bound, |n, b| n < b),
            Comparison::Lte(bound) => numeric(value, *bound, |n, b| n <= b),
        }
    }
}

fn numeric(value: &str, bound: Option<f64>, cmp: fn(f64, f64) -> bool) -> bool {
    match (parse_number(value), bound) {
        (Some(n), Some(b)) => cmp(n, b),
        _ => false,
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.operator().symbol();
        match self {
            Comparison::Eq(set) | Comparison::Ne(set) => write!(f, "{symbol}{}", set.join(",")),
            Comparison::Range { min, max } => write!(f, "{symbol}{},{}", format_number(*min), format_number(*max)),
            Comparison::Gt(bound) | Comparison::Gte(bound) | Comparison::Lt(bound) | Comparison::Lte(bound) => {
                match bound {
                    Some(b) => write!(f, "{symbol}{}", format_number(*b)),
                    None => write!(f, "{symbol}?"),
                }
            }
        }
    }
}

/// Parse the leading decimal number of `text`, ignoring leading whitespace
/// and any trailing garbage (`"18 years"` parses as `18`).
fn parse_number(text: &str) -> Option<f64> {
    let re = regex!(r"^[+-]?(?:Infinity|(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)");
    let literal = re.find(text.trim_start())?.as_str();

    if let Some(sign) = literal.strip_suffix("Infinity") {
        return Some(if sign == "-" { f64::NEG_INFINITY } else { f64::INFINITY });
    }

    // Drop a dangling mantissa dot ("5.", "5.e3") before `f64::from_str`.
    let literal = match literal.find(['e', 'E']) {
        Some(exp) if literal[..exp].ends_with('.') => format!("{}{}", &literal[..exp - 1], &literal[exp..]),
        _ => literal.trim_end_matches('.').to_string(),
    };
    literal.parse::<f64>().ok()
}

/// Stringify a number the way rule authors write it (`18`, not `18.0`).
fn format_number(n: f64) -> String {
    if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<CompareValue> {
        values.iter().map(|v| CompareValue::from(*v)).collect()
    }

    #[test]
    fn maps_operator_tokens() {
        let cases = [
            (">", ComparisonOperator::Gt),
            (">=", ComparisonOperator::Gte),
            ("=>", ComparisonOperator::Gte),
            ("<", ComparisonOperator::Lt),
            ("<=", ComparisonOperator::Lte),
            ("=<", ComparisonOperator::Lte),
            ("!=", ComparisonOperator::Ne),
            ("<>", ComparisonOperator::Range),
            ("><", ComparisonOperator::Range),
            ("=", ComparisonOperator::Eq),
            ("==", ComparisonOperator::Eq),
            ("!<", ComparisonOperator::Eq),
        ];
        for (token, expected) in cases {
            assert_eq!(ComparisonOperator::from_token(Some(token)), expected, "token {token:?}");
        }
        assert_eq!(ComparisonOperator::from_token(None), ComparisonOperator::Eq);
    }

    #[test]
    fn single_bound_keeps_first_numeric_value() {
        assert_eq!(Comparison::normalize(ComparisonOperator::Gte, &texts(&["18", "40"])), Comparison::Gte(Some(18.0)));
        assert_eq!(Comparison::normalize(ComparisonOperator::Lt, &texts(&["abc"])), Comparison::Lt(None));
        assert_eq!(Comparison::normalize(ComparisonOperator::Gt, &[]), Comparison::Gt(None));
    }

    #[test]
    fn range_defaults_to_infinite_bounds() {
        assert_eq!(
            Comparison::normalize(ComparisonOperator::Range, &texts(&["x", "10"])),
            Comparison::Range { min: f64::NEG_INFINITY, max: 10.0 }
        );
        assert_eq!(
            Comparison::normalize(ComparisonOperator::Range, &texts(&["1"])),
            Comparison::Range { min: 1.0, max: f64::INFINITY }
        );
    }

    #[test]
    fn equality_sets_are_stringified() {
        let values = vec![CompareValue::Number(3.0), CompareValue::Number(2.5), CompareValue::from("red")];
        assert_eq!(
            Comparison::normalize(ComparisonOperator::Eq, &values),
            Comparison::Eq(vec!["3".into(), "2.5".into(), "red".into()])
        );
    }

    #[test]
    fn parses_leading_numbers_like_a_lenient_reader() {
        assert_eq!(parse_number("18"), Some(18.0));
        assert_eq!(parse_number("  -2.5e2kg"), Some(-250.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("5."), Some(5.0));
        assert_eq!(parse_number("18 years"), Some(18.0));
        assert_eq!(parse_number("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("-"), None);
    }

    #[test]
    fn tests_values_per_operator() {
        let gte = Comparison::Gte(Some(18.0));
        assert!(!gte.test("17"));
        assert!(gte.test("18"));
        assert!(gte.test("30"));
        assert!(!gte.test("adult"));

        assert!(!Comparison::Gt(None).test("5"));

        let range = Comparison::Range { min: 1.0, max: 5.0 };
        assert!(range.test("1"));
        assert!(range.test("5"));
        assert!(!range.test("5.1"));
        assert!(!range.test("many"));

        let eq = Comparison::Eq(vec!["red".into(), "blue".into()]);
        assert!(eq.test("blue"));
        assert!(!eq.test("green"));

        let ne = Comparison::Ne(vec!["red".into()]);
        assert!(ne.test("green"));
        assert!(!ne.test("red"));
    }

    #[test]
    fn displays_in_token_syntax() {
        assert_eq!(Comparison::Gte(Some(18.0)).to_string(), ">=18");
        assert_eq!(Comparison::Range { min: 1.0, max: f64::INFINITY }.to_string(), "<>1,Infinity");
        assert_eq!(Comparison::Ne(vec!["a".into(), "b".into()]).to_string(), "!=a,b");
    }
}
