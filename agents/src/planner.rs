//! Planner agent
//!
//! Turns a question plus dataset schema and recent history into a structured
//! [`Plan`]. Never fails: unparsable replies and LLM errors degrade to
//! fallback plans.

use std::sync::Arc;

use dataroom_core::{ConversationEntry, Dataset};
use tracing::{debug, warn};

use crate::extract::extract_json;
use crate::llm::LlmClient;
use crate::prompts::{describe_schema, format_context, planner_prompt};
use crate::types::Plan;

/// First stage of the pipeline
#[derive(Clone)]
pub struct Planner {
    client: Arc<dyn LlmClient>,
}

impl Planner {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub async fn create_plan(
        &self,
        dataset: &Dataset,
        question: &str,
        context: &[ConversationEntry],
    ) -> Plan {
        let schema = describe_schema(dataset);
        let prompt = planner_prompt(&schema, &format_context(context), question);

        debug!(
            model = self.client.model_name(),
            context_turns = context.len(),
            "create_plan: requesting plan"
        );

        match self.client.generate(&prompt).await {
            Ok(text) => parse_plan(&text),
            Err(e) => {
                warn!(error = %e, "create_plan: LLM call failed");
                Plan::from_error(e)
            }
        }
    }
}

impl std::fmt::Debug for Planner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planner")
            .field("model", &self.client.model_name())
            .finish()
    }
}

/// Parse a model reply into a plan, falling back when no JSON is found
pub fn parse_plan(text: &str) -> Plan {
    match extract_json(text) {
        Some(raw) => Plan::from_json(&raw),
        None => {
            debug!(response_len = text.len(), "parse_plan: no JSON object found");
            Plan::unparsable()
        }
    }
}
