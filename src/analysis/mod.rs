//! The four-stage document analysis workflow.
//!
//! ```text
//! source_text ─▶ Summarize ─▶ ExtractMetadata ─▶ AnalyzeSentiment ─▶ ExtractEntities ─▶ project
//! ```
//!
//! - [`stages`]   — the stage enum and what each stage reads and writes
//! - [`metadata`] — parser for the model's four-line metadata template
//! - [`rules`]    — local sentiment and entity rules, entity validation
//! - [`topics`]   — keyword extraction and topic classification
//! - [`runner`]   — workflow assembly and bounded-wait execution
//! - [`project`]  — final state + task selection → results mapping

pub mod metadata;
pub mod project;
pub mod rules;
pub mod runner;
pub mod stages;
pub mod topics;
