//! Data Room Agents
//!
//! The two-stage question answering pipeline. The [`Planner`] asks the model
//! for a structured plan; the [`Executor`] asks for the final answer and
//! derives chart data from the dataset when the model omits it.

pub mod executor;
pub mod extract;
pub mod llm;
pub mod planner;
pub mod prompts;
pub mod types;

pub use executor::{generate_chart_data, ChartError, Executor};
pub use extract::extract_json;
pub use llm::{GeminiClient, LlmClient, LlmError, ScriptedClient};
pub use planner::Planner;
pub use types::{AxisColumns, ChartData, ChartSeries, ChartType, ExecutionResult, Plan, VisualizationConfig};
