//! Workflow assembly and bounded-wait execution.
//!
//! [`Workflow`] is the built, validated stage list: a plain ordered `Vec`
//! run front to back. [`PipelineRunner`] owns the injected language model and
//! runs one document's build-and-execute unit on a Tokio task, waiting at
//! most `config.timeout` for it.
//!
//! On timeout the runner cancels the shared [`CancellationToken`] and drops
//! the task's `JoinHandle`, which detaches it. The stage checks the token
//! before starting, and the model adapter races its request against it, so an
//! abandoned run stops at the next await point instead of finishing unseen.

use crate::analysis::project::project;
use crate::analysis::stages::{Stage, StageContext};
use crate::config::AnalysisConfig;
use crate::error::PipelineError;
use crate::llm::{CancellationToken, LanguageModel};
use crate::output::AnalysisResults;
use crate::state::DocumentState;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A validated, ready-to-run stage sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    stages: Vec<Stage>,
}

impl Workflow {
    /// Assemble the standard four-stage sequence for `config`.
    pub fn build(config: &AnalysisConfig) -> Result<Self, PipelineError> {
        Self::from_stages(Stage::ORDER.to_vec(), config)
    }

    /// Assemble from an explicit stage list.
    ///
    /// The list must be exactly the four stages in their fixed order, and the
    /// generation budgets must be usable.
    pub fn from_stages(stages: Vec<Stage>, config: &AnalysisConfig) -> Result<Self, PipelineError> {
        if stages != Stage::ORDER {
            let names: Vec<&str> = stages.iter().map(Stage::name).collect();
            return Err(PipelineError::Build(format!(
                "stage list must be summarization → metadata_extraction → \
                 sentiment_analysis → entity_recognition, got [{}]",
                names.join(", ")
            )));
        }
        if config.summary_max_tokens == 0 || config.metadata_max_tokens == 0 {
            return Err(PipelineError::Build("max_tokens must be ≥ 1".into()));
        }
        if !(0.0..=2.0).contains(&config.temperature) {
            return Err(PipelineError::Build(format!(
                "temperature {} outside 0.0–2.0",
                config.temperature
            )));
        }
        if config.timeout.is_zero() {
            return Err(PipelineError::Build("timeout must be greater than zero".into()));
        }
        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run every stage in order over `state`, returning the final state.
    ///
    /// The first failing stage aborts the run; its error is returned and the
    /// partially written state is dropped.
    pub async fn execute(
        &self,
        mut state: DocumentState,
        model: &dyn LanguageModel,
        config: &AnalysisConfig,
        cancel: &CancellationToken,
    ) -> Result<DocumentState, PipelineError> {
        let ctx = StageContext {
            model,
            config,
            cancel,
        };

        for &stage in &self.stages {
            if cancel.is_cancelled() {
                debug!("Run cancelled before {}", stage);
                return Err(timeout_error(config.timeout));
            }
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage_start(stage);
            }

            if stage.uses_model() {
                debug!("{}: calling {}", stage, model.name());
            }
            let start = Instant::now();
            stage.run(&mut state, &ctx).await?;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            debug!("{} done in {}ms", stage, elapsed_ms);
            if let Some(ref cb) = config.progress_callback {
                cb.on_stage_complete(stage, elapsed_ms);
            }
        }

        Ok(state)
    }
}

fn timeout_error(budget: Duration) -> PipelineError {
    PipelineError::Timeout {
        budget_ms: budget.as_millis() as u64,
    }
}

/// Runs the workflow for one document at a time under a wall-clock budget.
#[derive(Clone)]
pub struct PipelineRunner {
    model: Arc<dyn LanguageModel>,
    config: AnalysisConfig,
}

impl PipelineRunner {
    pub fn new(model: Arc<dyn LanguageModel>, config: AnalysisConfig) -> Self {
        Self { model, config }
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Build and execute the workflow for `source_text`.
    ///
    /// Returns the final state, or a build, stage or timeout error. Never
    /// waits longer than the configured timeout.
    pub async fn run(&self, source_text: impl Into<String>) -> Result<DocumentState, PipelineError> {
        let state = DocumentState::new(source_text);
        let model = Arc::clone(&self.model);
        let config = self.config.clone();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            let workflow = Workflow::build(&config)?;
            workflow
                .execute(state, model.as_ref(), &config, &worker_cancel)
                .await
        });

        match tokio::time::timeout(self.config.timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(PipelineError::Build(format!(
                "workflow worker stopped unexpectedly: {join_err}"
            ))),
            Err(_) => {
                cancel.cancel();
                warn!(
                    "Workflow exceeded {:?} with model '{}'; abandoning run",
                    self.config.timeout,
                    self.model.name()
                );
                Err(timeout_error(self.config.timeout))
            }
        }
    }

    /// [`run`](Self::run), then project the final state through the
    /// configured task selection.
    pub async fn analyze(
        &self,
        source_text: impl Into<String>,
    ) -> Result<AnalysisResults, PipelineError> {
        let state = self.run(source_text).await?;
        Ok(project(&state, &self.config.tasks))
    }
}
