//! Executor agent
//!
//! Second stage of the pipeline: answers the question following a [`Plan`]
//! and fills in chart data from the dataset when the model left it out.

use std::sync::Arc;

use dataroom_core::{ConversationEntry, DataError, Dataset};
use tracing::{debug, warn};

use crate::extract::extract_json;
use crate::llm::LlmClient;
use crate::prompts::{executor_prompt, format_context, simple_prompt};
use crate::types::{ChartData, ChartSeries, ExecutionResult, Plan};

/// Reasons chart data could not be derived from a dataset
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Plan does not request a chart")]
    NoVisualization,

    #[error("Visualization config is missing '{0}'")]
    MissingAxis(&'static str),

    #[error(transparent)]
    Data(#[from] DataError),
}

#[derive(Clone)]
pub struct Executor {
    client: Arc<dyn LlmClient>,
}

impl Executor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub async fn execute(
        &self,
        dataset: &Dataset,
        plan: &Plan,
        question: &str,
        context: &[ConversationEntry],
    ) -> ExecutionResult {
        let plan_json = serde_json::to_string_pretty(plan).unwrap_or_default();
        let prompt = executor_prompt(&plan_json, dataset.height(), &format_context(context), question);

        debug!(
            model = self.client.model_name(),
            visualization = %plan.visualization,
            "execute: requesting answer"
        );

        let text = match self.client.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "execute: LLM call failed");
                return ExecutionResult::from_error(e);
            }
        };

        let mut result = match extract_json(&text) {
            Some(raw) => ExecutionResult::from_json(&raw),
            None => ExecutionResult::from_text(text),
        };

        if !plan.visualization.is_none() && result.data.is_none() {
            match generate_chart_data(dataset, plan) {
                Ok(data) => {
                    result.data = Some(data);
                    if result.chart_type.is_none() {
                        result.chart_type = plan.visualization;
                    }
                }
                Err(e) => warn!(error = %e, "execute: could not derive chart data"),
            }
        }

        result
    }

    /// Single plan-free call returning the model's raw text
    pub async fn answer_simple_question(
        &self,
        dataset: &Dataset,
        question: &str,
        context: &[ConversationEntry],
    ) -> String {
        let prompt = simple_prompt(dataset, &format_context(context), question);

        match self.client.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "answer_simple_question: LLM call failed");
                format!("Error: {}", e)
            }
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("model", &self.client.model_name())
            .finish()
    }
}

/// Group the dataset by the plan's x-axis and sum its y-axis column(s).
///
/// One y column gives `{labels, values}`; several give `values` from the
/// first column plus every column in `additional_series`.
pub fn generate_chart_data(dataset: &Dataset, plan: &Plan) -> Result<ChartData, ChartError> {
    if plan.visualization.is_none() {
        return Err(ChartError::NoVisualization);
    }

    let config = &plan.visualization_config;
    let x_axis = config.x_axis.as_deref().ok_or(ChartError::MissingAxis("x_axis"))?;
    let y_columns = config
        .y_axis
        .as_ref()
        .map(|y| y.columns())
        .filter(|columns| !columns.is_empty())
        .ok_or(ChartError::MissingAxis("y_axis"))?;

    let grouped = dataset.grouped_sum(x_axis, &y_columns)?;
    let values = grouped
        .series
        .first()
        .map(|(_, values)| values.clone())
        .unwrap_or_default();

    let additional_series = (grouped.series.len() > 1).then(|| {
        grouped
            .series
            .into_iter()
            .map(|(name, data)| ChartSeries { name, data })
            .collect()
    });

    Ok(ChartData {
        labels: grouped.labels,
        values,
        additional_series,
    })
}
