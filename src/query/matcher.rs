//! Matcher Module
//!
//! Composable predicates over stored values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::query::{Query, QueryKind, TypedQuery, Value};

// == Matcher ==
/// A boolean test over a stored value.
///
/// Implemented by plain closures, by every typed query (over [`Value`]) and
/// by [`FieldMatcher`] (over records implementing [`Fields`]). Matchers are
/// shared with the writer task, hence `Send + Sync`.
pub trait Matcher<V>: Send + Sync {
    fn is_match(&self, value: &V) -> bool;
}

impl<V, F> Matcher<V> for F
where
    F: Fn(&V) -> bool + Send + Sync,
{
    fn is_match(&self, value: &V) -> bool {
        self(value)
    }
}

impl<T> Matcher<Value> for TypedQuery<T>
where
    T: QueryKind + Send + Sync,
{
    fn is_match(&self, value: &Value) -> bool {
        self.matches(value)
    }
}

impl Matcher<Value> for Query {
    fn is_match(&self, value: &Value) -> bool {
        self.matches(value)
    }
}

// == Combinators ==
/// True when every input is true. Inputs are already evaluated.
pub fn and(inputs: &[bool]) -> bool {
    inputs.iter().all(|v| *v)
}

/// True when any input is true. Inputs are already evaluated.
pub fn or(inputs: &[bool]) -> bool {
    inputs.iter().any(|v| *v)
}

// == Fields ==
/// A record that exposes named fields to queries.
pub trait Fields {
    /// Returns the field's value, or None when the record has no such field.
    fn field(&self, name: &str) -> Option<Value>;
}

impl Fields for HashMap<String, Value> {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// How a [`FieldMatcher`] folds its clause results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combine {
    #[default]
    All,
    Any,
}

// == Field Matcher ==
/// Composite query: one typed query per named field.
///
/// Every clause is evaluated, then the results are folded with [`and`] or
/// [`or`]. A missing field only satisfies an inactive (wildcard) clause.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMatcher {
    clauses: Vec<(String, Query)>,
    combine: Combine,
}

impl FieldMatcher {
    /// Matches when every clause matches.
    pub fn all() -> Self {
        Self {
            clauses: Vec::new(),
            combine: Combine::All,
        }
    }

    /// Matches when at least one clause matches.
    pub fn any() -> Self {
        Self {
            clauses: Vec::new(),
            combine: Combine::Any,
        }
    }

    /// Adds a clause on `field`.
    pub fn with(mut self, field: impl Into<String>, query: impl Into<Query>) -> Self {
        self.clauses.push((field.into(), query.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluates the clauses against a record.
    pub fn matches<V: Fields>(&self, record: &V) -> bool {
        let results: Vec<bool> = self
            .clauses
            .iter()
            .map(|(name, query)| match record.field(name) {
                Some(value) => query.matches(&value),
                None => !query.is_active(),
            })
            .collect();

        match self.combine {
            Combine::All => and(&results),
            Combine::Any => or(&results),
        }
    }
}

impl<V: Fields> Matcher<V> for FieldMatcher {
    fn is_match(&self, record: &V) -> bool {
        self.matches(record)
    }
}
