//! quizcast-core — Assignment distribution and answer-grading engine.
//!
//! This crate owns the in-memory entities (assignments, subscribers,
//! pending-answer state, answer records), the broadcast fan-out engine,
//! the grading rules, and the statistics read model that the rest of
//! the quizcast system builds on.

pub mod broadcast;
pub mod error;
pub mod grader;
pub mod inbound;
pub mod ledger;
pub mod model;
pub mod parser;
pub mod registry;
pub mod stats;
pub mod store;
pub mod traits;
