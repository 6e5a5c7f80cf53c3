//! Result projector: final state + task selection → results mapping.

use crate::config::{Task, TaskSelection};
use crate::output::{AnalysisResults, MetadataView};
use crate::state::DocumentState;

/// Copy the selected tasks' fields out of `state`.
///
/// Unselected tasks are absent from the output even though their stages ran.
/// A missing summary or sentiment projects as an empty string; after a
/// completed run both are always present.
pub fn project(state: &DocumentState, tasks: &TaskSelection) -> AnalysisResults {
    let mut results = AnalysisResults::default();
    for task in tasks.iter() {
        match task {
            Task::Summary => {
                results.summary = Some(state.summary().unwrap_or_default().to_string());
            }
            Task::MetadataExtraction => {
                results.metadata = Some(MetadataView::from(state.metadata()));
            }
            Task::SentimentAnalysis => {
                results.sentiment = Some(
                    state
                        .sentiment()
                        .map(|s| s.as_str().to_string())
                        .unwrap_or_default(),
                );
            }
            Task::EntityRecognition => {
                results.entities = Some(state.entities().clone());
            }
        }
    }
    results
}
