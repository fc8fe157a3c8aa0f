//! Planner → Executor pipeline against a scripted model

use std::sync::Arc;

use dataroom_agents::{ChartType, Executor, Planner, ScriptedClient};
use dataroom_core::{ContextLog, Dataset};
use serde_json::json;

fn sales() -> Dataset {
    Dataset::from_csv_bytes(b"region,sales\nA,10\nB,20\nA,5\n".to_vec()).unwrap()
}

#[tokio::test]
async fn test_plan_then_execute() {
    let client = Arc::new(ScriptedClient::with_responses([
        r#"Here is my plan:
```json
{"analysis": "Compare total sales per region", "steps": ["Group by region", "Sum sales"], "visualization": "bar", "visualization_config": {"x_axis": "region", "y_axis": "sales", "title": "Sales by Region"}, "expected_output": "Bar chart of totals"}
```"#,
        r#"{"answer": "Region B has the most sales (20).", "data": null, "chart_type": "bar", "insights": ["A sold 15 in total"]}"#,
    ]));
    let planner = Planner::new(client.clone());
    let executor = Executor::new(client.clone());
    let dataset = sales();

    let plan = planner.create_plan(&dataset, "Sales by region?", &[]).await;
    assert_eq!(plan.visualization, ChartType::Bar);

    let result = executor.execute(&dataset, &plan, "Sales by region?", &[]).await;
    assert_eq!(result.answer, "Region B has the most sales (20).");
    let data = result.data.expect("derived chart data");
    assert_eq!(data.labels, vec!["A", "B"]);
    assert_eq!(data.values, vec![15.0, 20.0]);

    assert_eq!(client.prompts().len(), 2);
}

#[tokio::test]
async fn test_follow_up_sees_history() {
    let client = Arc::new(ScriptedClient::with_responses([
        r#"{"analysis": "Locations of top regions", "steps": [], "visualization": "none", "visualization_config": {}, "expected_output": "List"}"#,
    ]));
    let planner = Planner::new(client.clone());
    let log = ContextLog::default();
    log.add_message(
        "s1",
        "Which region sells most?",
        "Region B has the highest sales.",
        json!({"chart_type": "bar"}),
    );

    let history = log.get_context("s1");
    planner.create_plan(&sales(), "Show their locations", &history).await;

    let prompt = &client.prompts()[0];
    assert!(prompt.contains("Q1: Which region sells most?"));
    assert!(prompt.contains("A1: Region B has the highest sales...."));
}

#[tokio::test]
async fn test_pipeline_degrades_on_unparsable_replies() {
    let client = Arc::new(ScriptedClient::with_responses([
        "Sorry, I cannot help with that.",
        "The dataset has three rows.",
    ]));
    let planner = Planner::new(client.clone());
    let executor = Executor::new(client);
    let dataset = sales();

    let plan = planner.create_plan(&dataset, "???", &[]).await;
    assert_eq!(
        plan.analysis,
        "Could not parse plan. Please try rephrasing your question."
    );
    assert!(plan.visualization.is_none());

    let result = executor.execute(&dataset, &plan, "???", &[]).await;
    assert_eq!(result.answer, "The dataset has three rows.");
    assert!(result.data.is_none());
}
