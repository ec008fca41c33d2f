//! sheetquiz-core: Question normalization, quiz sessions, and scoring.
//!
//! This crate defines the question model, the CSV normalizer, the session
//! state machine with its countdown, and the summary aggregator that the
//! rest of sheetquiz builds on.

pub mod error;
pub mod loader;
pub mod model;
pub mod normalizer;
pub mod random;
pub mod report;
pub mod session;
pub mod summary;
pub mod timer;
pub mod traits;
