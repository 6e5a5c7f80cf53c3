//! Text-source plumbing: everything between a query or file and plain text.
//!
//! ## Data Flow
//!
//! ```text
//! query ──▶ search ──▶ download ──▶ extract ──▶ (document_id, text)
//!                                     ▲
//! path / URL / bytes ──▶ input ───────┘
//! ```
//!
//! 1. [`search`]   — scrape a Scholar results page for direct PDF links
//! 2. [`download`] — fetch those links into a per-topic folder
//! 3. [`input`]    — normalise a single path, URL or upload to a local PDF
//! 4. [`extract`]  — read page text via pdfium; runs in `spawn_blocking`
//!    because pdfium is not async-safe

pub mod download;
pub mod extract;
pub mod input;
pub mod search;
