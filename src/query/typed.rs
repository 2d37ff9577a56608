//! Typed Query Module
//!
//! One query type per value kind, all sharing the same comparison rules.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::query::{Comparator, Value};

/// Timestamp rendering used by pattern queries.
const TIME_PATTERN_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

// == Query Kind ==
/// A scalar kind a [`TypedQuery`] can compare.
pub trait QueryKind: Clone + PartialEq + PartialOrd {
    /// Borrows the candidates of this kind out of `value`.
    ///
    /// A single value yields one candidate, a same-kind sequence yields all
    /// of its elements, any other kind yields None.
    fn candidates(value: &Value) -> Option<&[Self]>;

    /// Text form a pattern is matched against.
    fn render(&self) -> String;

    /// Partial match of `pattern` against the rendering. The regex is
    /// compiled on every call; an invalid pattern never matches.
    fn pattern_matches(&self, pattern: &str) -> bool {
        match Regex::new(pattern) {
            Ok(re) => re.is_match(&self.render()),
            Err(err) => {
                trace!("Invalid query pattern {:?}: {}", pattern, err);
                false
            }
        }
    }
}

impl QueryKind for i64 {
    fn candidates(value: &Value) -> Option<&[Self]> {
        match value {
            Value::Int(v) => Some(std::slice::from_ref(v)),
            Value::IntList(v) => Some(v),
            _ => None,
        }
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl QueryKind for f64 {
    fn candidates(value: &Value) -> Option<&[Self]> {
        match value {
            Value::Float(v) => Some(std::slice::from_ref(v)),
            Value::FloatList(v) => Some(v),
            _ => None,
        }
    }

    fn render(&self) -> String {
        format!("{:.4}", self)
    }
}

impl QueryKind for String {
    fn candidates(value: &Value) -> Option<&[Self]> {
        match value {
            Value::Text(v) => Some(std::slice::from_ref(v)),
            Value::TextList(v) => Some(v),
            _ => None,
        }
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl QueryKind for bool {
    fn candidates(value: &Value) -> Option<&[Self]> {
        match value {
            Value::Bool(v) => Some(std::slice::from_ref(v)),
            _ => None,
        }
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl QueryKind for u8 {
    fn candidates(value: &Value) -> Option<&[Self]> {
        match value {
            Value::Byte(v) => Some(std::slice::from_ref(v)),
            _ => None,
        }
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl QueryKind for Vec<u8> {
    fn candidates(value: &Value) -> Option<&[Self]> {
        match value {
            Value::Bytes(v) => Some(std::slice::from_ref(v)),
            Value::BytesList(v) => Some(v),
            _ => None,
        }
    }

    fn render(&self) -> String {
        String::from_utf8_lossy(self).into_owned()
    }

    // raw bytes, not the lossy text form
    fn pattern_matches(&self, pattern: &str) -> bool {
        match regex::bytes::Regex::new(pattern) {
            Ok(re) => re.is_match(self),
            Err(err) => {
                trace!("Invalid query pattern {:?}: {}", pattern, err);
                false
            }
        }
    }
}

impl QueryKind for DateTime<Utc> {
    fn candidates(value: &Value) -> Option<&[Self]> {
        match value {
            Value::Time(v) => Some(std::slice::from_ref(v)),
            Value::TimeList(v) => Some(v),
            _ => None,
        }
    }

    fn render(&self) -> String {
        self.format(TIME_PATTERN_FORMAT).to_string()
    }
}

// == Typed Query ==
/// A predicate over one value kind.
///
/// An inactive query is a wildcard and matches anything, which lets a
/// composite query leave some fields unconstrained. The default query is
/// inactive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypedQuery<T> {
    /// Reference value the candidate is compared against
    pub reference: T,
    /// Comparison to apply
    pub comparator: Comparator,
    /// Regex used by `Comparator::Pattern`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Inactive queries match everything
    #[serde(default)]
    pub active: bool,
}

pub type IntQuery = TypedQuery<i64>;
pub type FloatQuery = TypedQuery<f64>;
pub type StringQuery = TypedQuery<String>;
pub type BoolQuery = TypedQuery<bool>;
pub type ByteQuery = TypedQuery<u8>;
pub type BytesQuery = TypedQuery<Vec<u8>>;
pub type TimeQuery = TypedQuery<DateTime<Utc>>;

impl<T: QueryKind> TypedQuery<T> {
    // == Constructor ==
    /// Creates an active query.
    pub fn new(reference: impl Into<T>, comparator: Comparator) -> Self {
        Self {
            reference: reference.into(),
            comparator,
            pattern: None,
            active: true,
        }
    }

    /// Creates an active pattern query. An empty pattern falls back to
    /// equality with `reference`.
    pub fn pattern(reference: impl Into<T>, pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            ..Self::new(reference, Comparator::Pattern)
        }
    }

    // == Match ==
    /// Tests a candidate value.
    ///
    /// Kind mismatches are non-matches, never errors. A sequence of the
    /// query's kind matches when any element does.
    pub fn matches(&self, value: &Value) -> bool {
        if !self.active {
            return true;
        }
        match T::candidates(value) {
            Some(candidates) => candidates.iter().any(|c| self.compare(c)),
            None => {
                trace!("Query kind mismatch against {} value", value.kind());
                false
            }
        }
    }

    fn compare(&self, candidate: &T) -> bool {
        let reference = &self.reference;
        match self.comparator {
            Comparator::Greater => candidate > reference,
            Comparator::Less => candidate < reference,
            Comparator::GreaterEq => candidate >= reference,
            Comparator::LessEq => candidate <= reference,
            Comparator::Eq => candidate == reference,
            Comparator::Neq => candidate != reference,
            Comparator::Pattern => match self.pattern.as_deref() {
                Some(pattern) if !pattern.is_empty() => candidate.pattern_matches(pattern),
                _ => candidate == reference,
            },
        }
    }
}

// == Query ==
/// A typed query of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    Int(IntQuery),
    Float(FloatQuery),
    Text(StringQuery),
    Bool(BoolQuery),
    Byte(ByteQuery),
    Bytes(BytesQuery),
    Time(TimeQuery),
}

impl Query {
    /// Tests a candidate value with the wrapped query.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Query::Int(q) => q.matches(value),
            Query::Float(q) => q.matches(value),
            Query::Text(q) => q.matches(value),
            Query::Bool(q) => q.matches(value),
            Query::Byte(q) => q.matches(value),
            Query::Bytes(q) => q.matches(value),
            Query::Time(q) => q.matches(value),
        }
    }

    /// Whether the wrapped query constrains anything.
    pub fn is_active(&self) -> bool {
        match self {
            Query::Int(q) => q.active,
            Query::Float(q) => q.active,
            Query::Text(q) => q.active,
            Query::Bool(q) => q.active,
            Query::Byte(q) => q.active,
            Query::Bytes(q) => q.active,
            Query::Time(q) => q.active,
        }
    }
}

impl From<IntQuery> for Query {
    fn from(q: IntQuery) -> Self {
        Query::Int(q)
    }
}

impl From<FloatQuery> for Query {
    fn from(q: FloatQuery) -> Self {
        Query::Float(q)
    }
}

impl From<StringQuery> for Query {
    fn from(q: StringQuery) -> Self {
        Query::Text(q)
    }
}

impl From<BoolQuery> for Query {
    fn from(q: BoolQuery) -> Self {
        Query::Bool(q)
    }
}

impl From<ByteQuery> for Query {
    fn from(q: ByteQuery) -> Self {
        Query::Byte(q)
    }
}

impl From<BytesQuery> for Query {
    fn from(q: BytesQuery) -> Self {
        Query::Bytes(q)
    }
}

impl From<TimeQuery> for Query {
    fn from(q: TimeQuery) -> Self {
        Query::Time(q)
    }
}
