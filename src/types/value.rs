use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single datum flowing through the evaluation graph.
///
/// Values are immutable once constructed and compare structurally. Lists are
/// ordered and may nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// The absent value. Evaluates to an empty sequence.
    Null,
    /// A boolean, produced by predicate-normalizing operators.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A UTF-8 string.
    Str(String),
    /// An ordered list of values.
    List(Vec<Value>),
}

impl Value {
    /// Text rendering used by the string operators. Scalars stringify;
    /// `Null` and `List` have no text form and are skipped by matchers.
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Str(s) => Some(Cow::Borrowed(s)),
            Value::Int(n) => Some(Cow::Owned(n.to_string())),
            Value::Float(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            Value::Null | Value::List(_) => None,
        }
    }

    /// Whether this value counts as a positive result on its own.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    /// View this value as a sequence: `Null` is empty, a list contributes
    /// its elements, a scalar contributes itself.
    #[must_use]
    pub fn to_seq(&self) -> ValueSeq {
        match self {
            Value::Null => ValueSeq::empty(),
            Value::List(vs) => ValueSeq::from(vs.clone()),
            scalar => ValueSeq::one(scalar.clone()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "'{v}'"),
            Value::List(vs) => {
                write!(f, "[")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// An ordered, finite sequence of values, the result of evaluating a node.
///
/// Sequences are materialized; producers honor an optional item limit so an
/// early-terminating consumer never pays for items it will not read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueSeq {
    values: Vec<Value>,
}

impl ValueSeq {
    /// The empty sequence. Absent fields and failed matches produce this.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A one-element sequence.
    #[must_use]
    pub fn one(value: impl Into<Value>) -> Self {
        Self {
            values: vec![value.into()],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A sequence is truthy when it is non-empty and not a lone negative
    /// indicator (`false` or `null`). Rule actions fire on truthy results.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self.values.as_slice() {
            [] => false,
            [only] => only.is_truthy(),
            _ => true,
        }
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }

    /// Whether the sequence has reached the producer's item limit.
    #[must_use]
    pub fn at_limit(&self, limit: Option<usize>) -> bool {
        limit.is_some_and(|n| self.values.len() >= n)
    }

    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Collapse into a single value: `Null` when empty, the lone element
    /// when singular, a `List` otherwise. Used by literal folding.
    #[must_use]
    pub fn into_value(mut self) -> Value {
        match self.values.len() {
            0 => Value::Null,
            1 => self.values.pop().unwrap_or(Value::Null),
            _ => Value::List(self.values),
        }
    }
}

impl From<Vec<Value>> for ValueSeq {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<Value> for ValueSeq {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ValueSeq {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValueSeq {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl fmt::Display for ValueSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_conversions() {
        assert_eq!(Value::from(42_i64), Value::Int(42));
        assert_eq!(Value::from(2.5_f64), Value::Float(2.5));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::Str("hello".to_owned()));
        assert_eq!(
            Value::from(vec![Value::Int(1)]),
            Value::List(vec![Value::Int(1)])
        );
    }

    #[test]
    fn as_text_scalars() {
        assert_eq!(Value::Str("a".into()).as_text().as_deref(), Some("a"));
        assert_eq!(Value::Int(7).as_text().as_deref(), Some("7"));
        assert_eq!(Value::Bool(false).as_text().as_deref(), Some("false"));
        assert_eq!(Value::Null.as_text(), None);
        assert_eq!(Value::List(vec![]).as_text(), None);
    }

    #[test]
    fn display_matches_log_format() {
        let seq = ValueSeq::from(vec![Value::from("a"), Value::from("ab")]);
        assert_eq!(seq.to_string(), "['a' 'ab']");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn truthiness() {
        assert!(!ValueSeq::empty().is_truthy());
        assert!(!ValueSeq::one(false).is_truthy());
        assert!(!ValueSeq::one(Value::Null).is_truthy());
        assert!(ValueSeq::one(true).is_truthy());
        assert!(ValueSeq::one("x").is_truthy());
        assert!(ValueSeq::from(vec![Value::Bool(false), Value::Bool(false)]).is_truthy());
    }

    #[test]
    fn into_value_collapse() {
        assert_eq!(ValueSeq::empty().into_value(), Value::Null);
        assert_eq!(ValueSeq::one(1_i64).into_value(), Value::Int(1));
        assert_eq!(
            ValueSeq::from(vec![Value::Int(1), Value::Int(2)]).into_value(),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn at_limit() {
        let mut seq = ValueSeq::empty();
        assert!(!seq.at_limit(Some(1)));
        seq.push("a");
        assert!(seq.at_limit(Some(1)));
        assert!(!seq.at_limit(None));
    }

    #[test]
    fn serde_untagged_round_trip() {
        let v: Value = serde_json::from_str("\"GET\"").unwrap();
        assert_eq!(v, Value::Str("GET".into()));
        let v: Value = serde_json::from_str("null").unwrap();
        assert_eq!(v, Value::Null);
        let v: Value = serde_json::from_str("[1, \"a\"]").unwrap();
        assert_eq!(v, Value::List(vec![Value::Int(1), Value::Str("a".into())]));
    }
}
