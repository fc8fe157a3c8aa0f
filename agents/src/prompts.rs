//! Prompt templates and the helpers that fill them

use dataroom_core::{ConversationEntry, Dataset};
use serde_json::Value;

/// Turns of history included in a prompt
pub const CONTEXT_TURNS: usize = 5;

/// Characters of each previous answer included in a prompt
pub const ANSWER_PREVIEW_CHARS: usize = 200;

/// Example values shown per column
pub const SCHEMA_EXAMPLES: usize = 3;

pub const PLANNER_TEMPLATE: &str = r#"You are the Planner Agent, a strategic thinker in a multi-agent data analysis system.

Your role is to:
1. Analyze the user's natural language question about their data
2. Examine the available data schema (columns, types, and sample values)
3. Create a step-by-step execution plan that the Executor agent will follow

Data Schema:
{schema}

Recent Context (previous Q&A for follow-up questions):
{context}

User Question: {question}

Output a JSON object with this exact structure:
{
  "analysis": "Brief understanding of what the user is asking for",
  "steps": [
    "Step 1: Filter data to...",
    "Step 2: Group by...",
    "Step 3: Calculate..."
  ],
  "visualization": "bar|line|pie|scatter|none",
  "visualization_config": {
    "x_axis": "column name for x-axis",
    "y_axis": "column name(s) for y-axis",
    "color": "column for color grouping (optional)",
    "title": "Suggested chart title"
  },
  "expected_output": "Description of what the result should look like"
}

Important guidelines:
- If the user asks for trends over time, use "line" visualization
- If comparing categories, use "bar" visualization
- If showing parts of a whole, use "pie" visualization
- If looking for relationships between two numeric values, use "scatter" visualization
- Consider context for follow-up questions (e.g., "show their locations" refers to previous results)
- Be specific about which columns to use in visualization_config
"#;

pub const EXECUTOR_TEMPLATE: &str = r#"You are the Executor Agent, a technical specialist in a multi-agent data analysis system.

Your role is to:
1. Receive the execution plan from the Planner agent
2. Work out the answer from the data described below
3. Return clear, actionable answers with visualizations when requested

Execution Plan:
{plan}

Data Context:
- Total rows: {n_rows}
- Memory context (previous Q&A): {context}

Instructions:
- When a chart is requested, prepare the data in a format suitable for visualization
- Return your answer in a clear, concise manner
- Include relevant statistics and insights
- If the plan references previous context, use that information

Output format:
Return a JSON object with:
{
  "answer": "Your detailed answer to the user's question",
  "data": {
    "labels": ["Category 1", "Category 2", ...],
    "values": [100, 200, ...],
    "additional_series": [
      {"name": "Series 1", "data": [10, 20, ...]}
    ]
  },
  "chart_type": "bar|line|pie|scatter|none",
  "insights": ["Additional insight 1", "Additional insight 2"]
}
"#;

pub const SIMPLE_TEMPLATE: &str = r#"You are a data analyst. Answer the user's question about their data.

Data Info:
- Rows: {n_rows}
- Columns: {columns}

{context}

Question: {question}

Provide a clear, concise answer. If calculations are needed, explain your reasoning.
"#;

/// Column-by-column description with example values and the row count
pub fn describe_schema(dataset: &Dataset) -> String {
    let mut lines = vec!["Available Columns:".to_string()];

    for (column, dtype) in dataset.dtypes() {
        let examples = dataset
            .column_examples(&column, SCHEMA_EXAMPLES)
            .unwrap_or_default()
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("  - {} ({}): examples [{}]", column, dtype, examples));
    }

    lines.push(format!("\nTotal Rows: {}", dataset.height()));
    lines.join("\n")
}

/// Recent turns, answers truncated
pub fn format_context(context: &[ConversationEntry]) -> String {
    if context.is_empty() {
        return "No previous conversation.".to_string();
    }

    let recent = &context[context.len().saturating_sub(CONTEXT_TURNS)..];
    let mut lines = vec!["Previous Conversation:".to_string()];
    for (idx, entry) in recent.iter().enumerate() {
        let preview: String = entry.answer.chars().take(ANSWER_PREVIEW_CHARS).collect();
        lines.push(format!("  Q{}: {}", idx + 1, entry.question));
        lines.push(format!("  A{}: {}...", idx + 1, preview));
    }
    lines.join("\n")
}

pub fn planner_prompt(schema: &str, context: &str, question: &str) -> String {
    PLANNER_TEMPLATE
        .replace("{schema}", schema)
        .replace("{context}", context)
        .replace("{question}", question)
}

pub fn executor_prompt(plan: &str, n_rows: usize, context: &str, question: &str) -> String {
    let body = EXECUTOR_TEMPLATE
        .replace("{plan}", plan)
        .replace("{n_rows}", &n_rows.to_string())
        .replace("{context}", context);
    format!("{}\n\nUser Question: {}", body, question)
}

pub fn simple_prompt(dataset: &Dataset, context: &str, question: &str) -> String {
    SIMPLE_TEMPLATE
        .replace("{n_rows}", &dataset.height().to_string())
        .replace("{columns}", &dataset.column_names().join(", "))
        .replace("{context}", context)
        .replace("{question}", question)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
