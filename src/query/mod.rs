//! Query Module
//!
//! Typed predicates used to filter cached values without runtime reflection.

mod comparator;
mod matcher;
mod typed;
mod value;

// Re-export public types
pub use comparator::Comparator;
pub use matcher::{and, or, Combine, FieldMatcher, Fields, Matcher};
pub use typed::{
    BoolQuery, ByteQuery, BytesQuery, FloatQuery, IntQuery, Query, QueryKind, StringQuery,
    TimeQuery, TypedQuery,
};
pub use value::Value;
