//! Configuration types for document analysis.
//!
//! All analysis behaviour is controlled through [`AnalysisConfig`], built via
//! its [`AnalysisConfigBuilder`]. One struct holds every knob: the workflow
//! timeout, the generation budgets of the two model-backed stages, where
//! papers are searched for and stored, and which tasks the caller wants to see.
//!
//! The task enumeration lives here too: [`TaskSelection`] decides what the
//! result projector surfaces, never which stages run.

use crate::error::InsightError;
use crate::llm::LanguageModel;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for analysing one or more documents.
///
/// Built via [`AnalysisConfig::builder()`] or using
/// [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use paper_insight::{AnalysisConfig, Task, TaskSelection};
///
/// let config = AnalysisConfig::builder()
///     .timeout_secs(60)
///     .model("gpt-4o-mini")
///     .tasks(TaskSelection::from_tasks([Task::Summary, Task::SentimentAnalysis]))
///     .build()
///     .unwrap();
/// assert_eq!(config.timeout.as_secs(), 60);
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Wall-clock budget for one document's whole workflow. Default: 30 s.
    ///
    /// Covers building the stage list and running all four stages. When it
    /// elapses the caller gets a timeout failure and no state.
    pub timeout: Duration,

    /// Maximum tokens generated by the summarization call. Default: 300.
    pub summary_max_tokens: usize,

    /// Maximum tokens generated by the metadata call. Default: 500.
    ///
    /// The abstract line alone often runs past 300 tokens, so the metadata
    /// call gets a larger budget than the summary.
    pub metadata_max_tokens: usize,

    /// Sampling temperature for both model calls. Default: 0.7.
    pub temperature: f32,

    /// Number of candidates requested per call. Default: 1.
    ///
    /// Only the first candidate is ever used.
    pub candidate_count: u8,

    /// Truncate the source text to this many characters before it is sent to
    /// the model. Default: None (send everything).
    pub max_prompt_chars: Option<usize>,

    /// LLM model identifier. Default: "gpt-4o".
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `language_model`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed language model. Takes precedence over `provider_name`.
    pub language_model: Option<Arc<dyn LanguageModel>>,

    /// Which results the caller wants to see. Default: Summary only.
    pub tasks: TaskSelection,

    /// Number of pages read from each PDF. Default: 10.
    pub max_pages: usize,

    /// Number of search results (and downloads) per query. Default: 5.
    pub num_results: usize,

    /// Root folder for downloaded papers; each query gets a sub-folder. Default: `data/`.
    pub data_dir: PathBuf,

    /// Base URL of the scholar search frontend. Default: `https://scholar.google.com`.
    pub scholar_base_url: String,

    /// Download timeout for search pages and PDFs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Keywords reported per document; 0 skips keyword extraction. Default: 0.
    pub keyword_count: usize,

    /// Optional progress callback receiving batch, document and stage events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            summary_max_tokens: 300,
            metadata_max_tokens: 500,
            temperature: 0.7,
            candidate_count: 1,
            max_prompt_chars: None,
            model: None,
            provider_name: None,
            language_model: None,
            tasks: TaskSelection::default(),
            max_pages: 10,
            num_results: 5,
            data_dir: PathBuf::from("data"),
            scholar_base_url: "https://scholar.google.com".to_string(),
            download_timeout_secs: 120,
            keyword_count: 0,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("timeout", &self.timeout)
            .field("summary_max_tokens", &self.summary_max_tokens)
            .field("metadata_max_tokens", &self.metadata_max_tokens)
            .field("temperature", &self.temperature)
            .field("candidate_count", &self.candidate_count)
            .field("max_prompt_chars", &self.max_prompt_chars)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field(
                "language_model",
                &self.language_model.as_ref().map(|_| "<dyn LanguageModel>"),
            )
            .field("tasks", &self.tasks)
            .field("max_pages", &self.max_pages)
            .field("num_results", &self.num_results)
            .field("data_dir", &self.data_dir)
            .field("scholar_base_url", &self.scholar_base_url)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("keyword_count", &self.keyword_count)
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// Model used when none is configured.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Builder for [`AnalysisConfig`].
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl fmt::Debug for AnalysisConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl AnalysisConfigBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout = Duration::from_secs(secs);
        self
    }

    pub fn summary_max_tokens(mut self, n: usize) -> Self {
        self.config.summary_max_tokens = n;
        self
    }

    pub fn metadata_max_tokens(mut self, n: usize) -> Self {
        self.config.metadata_max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn candidate_count(mut self, n: u8) -> Self {
        self.config.candidate_count = n.max(1);
        self
    }

    pub fn max_prompt_chars(mut self, n: usize) -> Self {
        self.config.max_prompt_chars = Some(n);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.config.language_model = Some(model);
        self
    }

    pub fn tasks(mut self, tasks: TaskSelection) -> Self {
        self.config.tasks = tasks;
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n.max(1);
        self
    }

    pub fn num_results(mut self, n: usize) -> Self {
        self.config.num_results = n.max(1);
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    pub fn scholar_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.scholar_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn keyword_count(mut self, n: usize) -> Self {
        self.config.keyword_count = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, InsightError> {
        let c = &self.config;
        if c.timeout.is_zero() {
            return Err(InsightError::InvalidConfig(
                "Timeout must be greater than zero".into(),
            ));
        }
        if c.summary_max_tokens == 0 || c.metadata_max_tokens == 0 {
            return Err(InsightError::InvalidConfig(
                "Token budgets must be ≥ 1".into(),
            ));
        }
        if c.max_prompt_chars == Some(0) {
            return Err(InsightError::InvalidConfig(
                "max_prompt_chars must be ≥ 1 when set".into(),
            ));
        }
        if !(c.scholar_base_url.starts_with("http://") || c.scholar_base_url.starts_with("https://"))
        {
            return Err(InsightError::InvalidConfig(format!(
                "Scholar base URL must be HTTP/HTTPS, got '{}'",
                c.scholar_base_url
            )));
        }
        Ok(self.config)
    }
}

// ── Tasks ────────────────────────────────────────────────────────────────

/// One of the four analysis results a caller can ask for.
///
/// The declaration order is the display order: projected results always list
/// Summary, Metadata, Sentiment, Entities in that order regardless of how the
/// selection was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Task {
    Summary,
    MetadataExtraction,
    SentimentAnalysis,
    EntityRecognition,
}

impl Task {
    /// Every task, in display order.
    pub const ALL: [Task; 4] = [
        Task::Summary,
        Task::MetadataExtraction,
        Task::SentimentAnalysis,
        Task::EntityRecognition,
    ];

    /// Human-readable task name, as offered to users.
    pub fn label(&self) -> &'static str {
        match self {
            Task::Summary => "Summary",
            Task::MetadataExtraction => "Metadata Extraction",
            Task::SentimentAnalysis => "Sentiment Analysis",
            Task::EntityRecognition => "Entity Recognition",
        }
    }

    /// Key under which this task's result appears in the results mapping.
    pub fn result_key(&self) -> &'static str {
        match self {
            Task::Summary => "Summary",
            Task::MetadataExtraction => "Metadata",
            Task::SentimentAnalysis => "Sentiment",
            Task::EntityRecognition => "Entities",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Task {
    type Err = InsightError;

    /// Accepts the label ("Metadata Extraction"), the result key ("Metadata")
    /// or a short lowercase alias ("metadata"), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_lowercase().replace(['-', '_'], " ");
        match norm.as_str() {
            "summary" | "summarize" | "summarization" => Ok(Task::Summary),
            "metadata" | "metadata extraction" => Ok(Task::MetadataExtraction),
            "sentiment" | "sentiment analysis" => Ok(Task::SentimentAnalysis),
            "entities" | "entity" | "entity recognition" => Ok(Task::EntityRecognition),
            _ => Err(InsightError::InvalidConfig(format!(
                "Unknown task '{}'. Expected one of: summary, metadata, sentiment, entities",
                s.trim()
            ))),
        }
    }
}

/// The set of tasks whose results should be surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSelection(BTreeSet<Task>);

impl Default for TaskSelection {
    /// Summary only.
    fn default() -> Self {
        Self::from_tasks([Task::Summary])
    }
}

impl TaskSelection {
    pub fn all() -> Self {
        Self::from_tasks(Task::ALL)
    }

    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self(tasks.into_iter().collect())
    }

    pub fn contains(&self, task: Task) -> bool {
        self.0.contains(&task)
    }

    pub fn insert(&mut self, task: Task) {
        self.0.insert(task);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Selected tasks in display order.
    pub fn iter(&self) -> impl Iterator<Item = Task> + '_ {
        self.0.iter().copied()
    }

    /// Parse a comma-separated list such as `"summary,entities"` or `"all"`.
    pub fn parse_list(s: &str) -> Result<Self, InsightError> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Task::from_str)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }
}

impl FromIterator<Task> for TaskSelection {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self::from_tasks(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_budgets() {
        let config = AnalysisConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.summary_max_tokens, 300);
        assert_eq!(config.metadata_max_tokens, 500);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.candidate_count, 1);
        assert_eq!(config.max_pages, 10);
        assert_eq!(config.model_or_default(), "gpt-4o");
        assert_eq!(config.tasks, TaskSelection::from_tasks([Task::Summary]));
    }

    #[test]
    fn builder_clamps_and_validates() {
        let config = AnalysisConfig::builder()
            .temperature(5.0)
            .candidate_count(0)
            .scholar_base_url("http://localhost:8080/")
            .build()
            .unwrap();
        assert!((config.temperature - 2.0).abs() < f32::EPSILON);
        assert_eq!(config.candidate_count, 1);
        assert_eq!(config.scholar_base_url, "http://localhost:8080");

        let err = AnalysisConfig::builder().timeout_secs(0).build();
        assert!(matches!(err, Err(InsightError::InvalidConfig(_))));

        let err = AnalysisConfig::builder().summary_max_tokens(0).build();
        assert!(matches!(err, Err(InsightError::InvalidConfig(_))));
    }

    #[test]
    fn task_parsing_accepts_labels_keys_and_aliases() {
        assert_eq!("Summary".parse::<Task>().unwrap(), Task::Summary);
        assert_eq!(
            "Metadata Extraction".parse::<Task>().unwrap(),
            Task::MetadataExtraction
        );
        assert_eq!("metadata".parse::<Task>().unwrap(), Task::MetadataExtraction);
        assert_eq!(
            "sentiment_analysis".parse::<Task>().unwrap(),
            Task::SentimentAnalysis
        );
        assert_eq!("ENTITIES".parse::<Task>().unwrap(), Task::EntityRecognition);
        assert!("keywords".parse::<Task>().is_err());
    }

    #[test]
    fn selection_iterates_in_display_order() {
        let sel = TaskSelection::from_tasks([
            Task::EntityRecognition,
            Task::Summary,
            Task::SentimentAnalysis,
        ]);
        let order: Vec<Task> = sel.iter().collect();
        assert_eq!(
            order,
            vec![Task::Summary, Task::SentimentAnalysis, Task::EntityRecognition]
        );
    }

    #[test]
    fn selection_parse_list() {
        assert_eq!(TaskSelection::parse_list("all").unwrap(), TaskSelection::all());
        let sel = TaskSelection::parse_list("entities, summary").unwrap();
        assert_eq!(sel.len(), 2);
        assert!(sel.contains(Task::Summary));
        assert!(sel.contains(Task::EntityRecognition));
        assert!(TaskSelection::parse_list("summary,bogus").is_err());
        assert!(TaskSelection::parse_list("").unwrap().is_empty());
    }
}
