//! Query comparators.

use serde::{Deserialize, Serialize};

/// How a query compares a candidate against its reference value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    Greater,
    Less,
    GreaterEq,
    LessEq,
    #[default]
    Eq,
    Neq,
    /// Partial regex match against the candidate's text rendering
    Pattern,
}
