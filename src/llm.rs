//! The language-model seam: one trait every analysis stage talks to.
//!
//! Stages never see a concrete provider. They build a [`CompletionRequest`]
//! and hand it to an `Arc<dyn LanguageModel>` injected by the caller, which
//! makes the whole workflow runnable against a deterministic stub in tests.
//!
//! [`EdgequakeModel`] is the production implementation: it forwards requests
//! to any `edgequake_llm` provider (OpenAI, Anthropic, Gemini, Ollama, …) and
//! races each call against a [`CancellationToken`] so that a run abandoned by
//! the workflow timeout stops waiting on the network.

use crate::config::AnalysisConfig;
use crate::error::{InsightError, LlmError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// One prompt for the model: a system instruction plus user content.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub user_content: String,
    pub max_tokens: usize,
    pub temperature: f32,
    /// Candidates requested from the provider; only the first is used.
    pub candidate_count: u8,
}

/// A capability that turns a prompt into generated text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Produce a single completion for `request`.
    ///
    /// Implementations should return [`LlmError::Cancelled`] promptly once
    /// `cancel` fires; callers that gave up will ignore the result anyway.
    async fn complete(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<String, LlmError>;

    /// Short identifier for logs.
    fn name(&self) -> &str {
        "language-model"
    }
}

// ── Cancellation ─────────────────────────────────────────────────────────

/// A cooperative cancellation token shared between a workflow run and the
/// caller waiting on it.
///
/// The caller cancels; the run checks [`is_cancelled`](Self::is_cancelled)
/// between stages and model clients may await [`cancelled`](Self::cancelled).
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

#[derive(Default)]
struct TokenInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Signal cancellation and wake every waiter.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a cancel in between is not lost.
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

// ── edgequake-llm adapter ────────────────────────────────────────────────

/// [`LanguageModel`] backed by an `edgequake_llm` provider.
pub struct EdgequakeModel {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl EdgequakeModel {
    /// Wrap `provider`; `label` (e.g. `"openai/gpt-4o"`) is used in logs.
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }
}

#[async_trait]
impl LanguageModel for EdgequakeModel {
    async fn complete(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<String, LlmError> {
        if cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }

        let messages = vec![
            ChatMessage::system(request.system_instruction.as_str()),
            ChatMessage::user(request.user_content.as_str()),
        ];
        let options = build_options(request);

        let start = Instant::now();
        let response = tokio::select! {
            r = self.provider.chat(&messages, Some(&options)) => {
                r.map_err(|e| LlmError::Api(e.to_string()))?
            }
            _ = cancel.cancelled() => return Err(LlmError::Cancelled),
        };

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.label,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        let text = response.content.trim().to_string();
        if text.is_empty() {
            // Callers treat an empty reply as malformed output, not a failure.
            warn!("{}: empty completion", self.label);
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Build `CompletionOptions` from a request.
///
/// The provider always returns a single choice, which matches the one
/// candidate the stages consume.
fn build_options(request: &CompletionRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: Some(request.max_tokens),
        ..Default::default()
    }
}

// ── Provider resolution ──────────────────────────────────────────────────

/// Resolve the language model, from most-specific to least-specific.
///
/// 1. **Injected model** (`config.language_model`) — used as-is; this is how
///    tests substitute a stub.
/// 2. **Named provider + model** (`config.provider_name`).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_language_model(
    config: &AnalysisConfig,
) -> Result<Arc<dyn LanguageModel>, InsightError> {
    if let Some(ref model) = config.language_model {
        return Ok(Arc::clone(model));
    }

    let (provider, label) = resolve_provider(config)?;
    Ok(Arc::new(EdgequakeModel::new(provider, label)))
}

type ResolvedProvider = (Arc<dyn LLMProvider>, String);

fn resolve_provider(config: &AnalysisConfig) -> Result<ResolvedProvider, InsightError> {
    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    // Prefer OpenAI when its key is present, even if other provider keys are set.
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", config.model_or_default());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| InsightError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok((llm_provider, "auto".to_string()))
}

fn create_provider(provider_name: &str, model: &str) -> Result<ResolvedProvider, InsightError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        InsightError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok((provider, format!("{provider_name}/{model}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request() -> CompletionRequest {
        CompletionRequest {
            system_instruction: "sys".into(),
            user_content: "user".into(),
            max_tokens: 300,
            temperature: 0.7,
            candidate_count: 1,
        }
    }

    #[test]
    fn build_options_copies_budgets() {
        let opts = build_options(&request());
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, Some(300));
    }

    #[tokio::test]
    async fn adapter_trims_and_passes_empty_replies_through() {
        let provider = edgequake_llm::MockProvider::new();
        provider.add_response("  Padded reply.\n").await;
        provider.add_response("   ").await;
        let model = EdgequakeModel::new(Arc::new(provider), "mock/mock-model");
        let cancel = CancellationToken::new();

        assert_eq!(model.complete(&request(), &cancel).await.unwrap(), "Padded reply.");
        assert_eq!(model.complete(&request(), &cancel).await.unwrap(), "");
        assert_eq!(model.name(), "mock/mock-model");
    }

    #[tokio::test]
    async fn adapter_refuses_work_after_cancel() {
        let model = EdgequakeModel::new(Arc::new(edgequake_llm::MockProvider::new()), "mock");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = model.complete(&request(), &cancel).await.unwrap_err();
        assert!(matches!(err, LlmError::Cancelled));
    }

    #[test]
    fn token_starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cloned_token_shares_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_after_cancel() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_returns_immediately_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("already-cancelled token should resolve at once");
    }

    #[test]
    fn injected_model_wins_resolution() {
        struct Fixed;

        #[async_trait]
        impl LanguageModel for Fixed {
            async fn complete(
                &self,
                _request: &CompletionRequest,
                _cancel: &CancellationToken,
            ) -> Result<String, LlmError> {
                Ok("fixed".into())
            }

            fn name(&self) -> &str {
                "fixed"
            }
        }

        let config = AnalysisConfig::builder()
            .language_model(Arc::new(Fixed))
            .provider_name("definitely-not-a-provider")
            .build()
            .unwrap();
        let model = resolve_language_model(&config).unwrap();
        assert_eq!(model.name(), "fixed");
    }
}
