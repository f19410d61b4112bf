//! Deterministic text heuristics shared by the pipeline stages.
//!
//! Every table here is built once per process and never mutated, so the
//! stages can run concurrently on different transcripts.

pub mod dates;
pub mod lexicon;
pub mod owners;
pub mod priority;
pub mod sentences;

pub use dates::{
    find_date_expressions, find_explicit_date, first_date_expression, resolve_deadline,
    DateExpression, DateMatch,
};
pub use owners::{resolve_owner, OwnerContext, OwnerResolver, OWNER_RESOLVERS};
pub use priority::infer_priority;
pub use sentences::{split_sentences, words, SentenceRecord};
