//! Fixed prompts for the two model-backed analysis stages.
//!
//! The metadata parser's labels are checked against the template here, so
//! both sides change together.

/// System instruction for the summarization stage.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes text.";

/// System instruction for the metadata stage.
///
/// The four labelled lines must stay in sync with the patterns in
/// [`crate::analysis::metadata`].
pub const METADATA_SYSTEM_PROMPT: &str = "You are an assistant specialized in extracting metadata from research papers. \
Your output should strictly follow this format:\n\
**Title:** <title>\n\
**Authors:** <author1>, <author2>, ...\n\
**Publication Date:** <date>\n\
**Abstract:** <abstract>";

/// User message for the summarization stage.
pub fn summary_user_message(content: &str) -> String {
    format!("Summarize the following text:\n\n{content}")
}

/// User message for the metadata stage.
pub fn metadata_user_message(content: &str) -> String {
    format!("Extract the metadata from the following text:\n\n{content}")
}
