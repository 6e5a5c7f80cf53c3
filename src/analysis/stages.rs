//! The four analysis stages.
//!
//! Stages are a closed enum rather than boxed closures: the sequence is fixed,
//! each stage owns exactly one [`DocumentState`] field, and the enum gives
//! logs, progress events and errors a stable name for free.
//!
//! | Stage               | Reads         | Writes      | Model call |
//! |---------------------|---------------|-------------|------------|
//! | `Summarize`         | `source_text` | `summary`   | yes        |
//! | `ExtractMetadata`   | `source_text` | `metadata`  | yes        |
//! | `AnalyzeSentiment`  | `summary`     | `sentiment` | no         |
//! | `ExtractEntities`   | `summary`     | `entities`  | no         |
//!
//! Sentiment and entities look at the summary, not the document.

use crate::analysis::{metadata, rules};
use crate::config::AnalysisConfig;
use crate::error::PipelineError;
use crate::llm::{CancellationToken, CompletionRequest, LanguageModel};
use crate::prompts;
use crate::state::DocumentState;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// One step of the analysis sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Summarize,
    ExtractMetadata,
    AnalyzeSentiment,
    ExtractEntities,
}

impl Stage {
    /// The only order the stages ever run in.
    pub const ORDER: [Stage; 4] = [
        Stage::Summarize,
        Stage::ExtractMetadata,
        Stage::AnalyzeSentiment,
        Stage::ExtractEntities,
    ];

    /// Node name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Summarize => "summarization",
            Stage::ExtractMetadata => "metadata_extraction",
            Stage::AnalyzeSentiment => "sentiment_analysis",
            Stage::ExtractEntities => "entity_recognition",
        }
    }

    /// `true` for the two stages that call the language model.
    pub fn uses_model(&self) -> bool {
        matches!(self, Stage::Summarize | Stage::ExtractMetadata)
    }

    /// Run this stage against `state`, writing only the stage's own field.
    pub(crate) async fn run(
        self,
        state: &mut DocumentState,
        ctx: &StageContext<'_>,
    ) -> Result<(), PipelineError> {
        match self {
            Stage::Summarize => {
                let request = CompletionRequest {
                    system_instruction: prompts::SUMMARY_SYSTEM_PROMPT.to_string(),
                    user_content: prompts::summary_user_message(ctx.prompt_text(state)),
                    max_tokens: ctx.config.summary_max_tokens,
                    temperature: ctx.config.temperature,
                    candidate_count: ctx.config.candidate_count,
                };
                let summary = ctx.complete(self, &request).await?;
                if !state.set_summary(summary.trim().to_string()) {
                    debug!("{}: summary already set, keeping the first one", self);
                }
            }
            Stage::ExtractMetadata => {
                let request = CompletionRequest {
                    system_instruction: prompts::METADATA_SYSTEM_PROMPT.to_string(),
                    user_content: prompts::metadata_user_message(ctx.prompt_text(state)),
                    max_tokens: ctx.config.metadata_max_tokens,
                    temperature: ctx.config.temperature,
                    candidate_count: ctx.config.candidate_count,
                };
                let response = ctx.complete(self, &request).await?;
                state.set_metadata(metadata::parse_metadata(&response));
            }
            Stage::AnalyzeSentiment => {
                let sentiment = rules::classify_sentiment(state.summary().unwrap_or_default());
                state.set_sentiment(sentiment);
            }
            Stage::ExtractEntities => {
                let entities = rules::extract_entities(state.summary().unwrap_or_default());
                state.set_entities(entities);
            }
        }
        Ok(())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collaborators handed to every stage of one run.
pub(crate) struct StageContext<'a> {
    pub model: &'a dyn LanguageModel,
    pub config: &'a AnalysisConfig,
    pub cancel: &'a CancellationToken,
}

impl StageContext<'_> {
    async fn complete(
        &self,
        stage: Stage,
        request: &CompletionRequest,
    ) -> Result<String, PipelineError> {
        self.model
            .complete(request, self.cancel)
            .await
            .map_err(|e| PipelineError::Stage {
                stage,
                detail: e.to_string(),
            })
    }

    /// Source text as sent to the model, cut to `max_prompt_chars` if set.
    fn prompt_text<'s>(&self, state: &'s DocumentState) -> &'s str {
        let text = state.source_text();
        match self.config.max_prompt_chars {
            Some(limit) => truncate_chars(text, limit),
            None => text,
        }
    }
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::state::Sentiment;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns canned replies and remembers every request it saw.
    struct Recorder {
        reply: String,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl Recorder {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for Recorder {
        async fn complete(
            &self,
            request: &CompletionRequest,
            _cancel: &CancellationToken,
        ) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl LanguageModel for Failing {
        async fn complete(
            &self,
            _request: &CompletionRequest,
            _cancel: &CancellationToken,
        ) -> Result<String, LlmError> {
            Err(LlmError::Api("rate limited".into()))
        }
    }

    #[test]
    fn names_match_node_names() {
        let names: Vec<&str> = Stage::ORDER.iter().map(Stage::name).collect();
        assert_eq!(
            names,
            vec![
                "summarization",
                "metadata_extraction",
                "sentiment_analysis",
                "entity_recognition"
            ]
        );
        assert!(Stage::Summarize.uses_model());
        assert!(!Stage::ExtractEntities.uses_model());
    }

    #[tokio::test]
    async fn summarize_trims_padded_reply() {
        let model = Recorder::new("  Good finance research summary.\n");
        let config = AnalysisConfig::default();
        let cancel = CancellationToken::new();
        let ctx = StageContext {
            model: &model,
            config: &config,
            cancel: &cancel,
        };
        let mut state = DocumentState::new("This is good research on finance.");

        Stage::Summarize.run(&mut state, &ctx).await.unwrap();
        Stage::AnalyzeSentiment.run(&mut state, &ctx).await.unwrap();

        assert_eq!(state.summary(), Some("Good finance research summary."));
        assert_eq!(state.sentiment(), Some(Sentiment::Positive));
    }

    #[tokio::test]
    async fn empty_metadata_reply_keeps_defaults() {
        let model = Recorder::new("");
        let config = AnalysisConfig::default();
        let cancel = CancellationToken::new();
        let ctx = StageContext {
            model: &model,
            config: &config,
            cancel: &cancel,
        };
        let mut state = DocumentState::new("doc");

        Stage::ExtractMetadata.run(&mut state, &ctx).await.unwrap();

        assert!(state.metadata().is_unknown());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[tokio::test]
    async fn summarize_sends_budget_and_stores_reply() {
        let model = Recorder::new("Good finance research summary.");
        let config = AnalysisConfig::default();
        let cancel = CancellationToken::new();
        let ctx = StageContext {
            model: &model,
            config: &config,
            cancel: &cancel,
        };
        let mut state = DocumentState::new("This is good research on finance.");

        Stage::Summarize.run(&mut state, &ctx).await.unwrap();

        assert_eq!(state.summary(), Some("Good finance research summary."));
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].max_tokens, 300);
        assert_eq!(seen[0].candidate_count, 1);
        assert_eq!(seen[0].system_instruction, prompts::SUMMARY_SYSTEM_PROMPT);
        assert!(seen[0].user_content.ends_with("This is good research on finance."));
    }

    #[tokio::test]
    async fn metadata_uses_larger_budget_and_truncated_text() {
        let model = Recorder::new("**Title:** Foo");
        let config = AnalysisConfig::builder()
            .max_prompt_chars(4)
            .build()
            .unwrap();
        let cancel = CancellationToken::new();
        let ctx = StageContext {
            model: &model,
            config: &config,
            cancel: &cancel,
        };
        let mut state = DocumentState::new("abcdefgh");

        Stage::ExtractMetadata.run(&mut state, &ctx).await.unwrap();

        assert_eq!(state.metadata().title, "Foo");
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].max_tokens, 500);
        assert!(seen[0].user_content.ends_with("\n\nabcd"));
        assert_eq!(state.source_text(), "abcdefgh");
    }

    #[tokio::test]
    async fn local_stages_read_summary_without_calling_model() {
        let model = Recorder::new("unused");
        let config = AnalysisConfig::default();
        let cancel = CancellationToken::new();
        let ctx = StageContext {
            model: &model,
            config: &config,
            cancel: &cancel,
        };
        let mut state = DocumentState::new("Alice is good, 2025, $1000");

        Stage::AnalyzeSentiment.run(&mut state, &ctx).await.unwrap();
        Stage::ExtractEntities.run(&mut state, &ctx).await.unwrap();

        // No summary yet, so the source text's triggers are ignored.
        assert_eq!(state.sentiment(), Some(Sentiment::Neutral));
        assert!(state.entities().is_empty());
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn model_failure_is_a_stage_error() {
        let config = AnalysisConfig::default();
        let cancel = CancellationToken::new();
        let ctx = StageContext {
            model: &Failing,
            config: &config,
            cancel: &cancel,
        };
        let mut state = DocumentState::new("text");

        let err = Stage::ExtractMetadata
            .run(&mut state, &ctx)
            .await
            .unwrap_err();
        match err {
            PipelineError::Stage { stage, detail } => {
                assert_eq!(stage, Stage::ExtractMetadata);
                assert!(detail.contains("rate limited"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(state.metadata().is_unknown());
    }
}
