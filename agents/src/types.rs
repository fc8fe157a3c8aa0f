//! Plan and execution result types
//!
//! Both are parsed leniently from model JSON: missing or mistyped fields fall
//! back to empty values instead of rejecting the whole response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Chart kind requested by a plan or reported by a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Scatter,
    #[default]
    None,
}

impl ChartType {
    /// Parse a chart type name; anything unrecognised is `None`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" => ChartType::Bar,
            "line" => ChartType::Line,
            "pie" => ChartType::Pie,
            "scatter" => ChartType::Scatter,
            _ => ChartType::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
            ChartType::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ChartType::None)
    }

    fn from_value(value: &Value) -> Self {
        value.as_str().map(Self::parse).unwrap_or_default()
    }
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One or several y-axis columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisColumns {
    One(String),
    Many(Vec<String>),
}

impl AxisColumns {
    pub fn columns(&self) -> Vec<String> {
        match self {
            AxisColumns::One(column) => vec![column.clone()],
            AxisColumns::Many(columns) => columns.clone(),
        }
    }
}

/// Chart axis mapping chosen by the Planner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<AxisColumns>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Keys the model added beyond the known ones
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VisualizationConfig {
    fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };

        let y_axis = match obj.get("y_axis") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(AxisColumns::One(s.clone())),
            Some(Value::Array(items)) => {
                let columns: Vec<String> = items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
                (!columns.is_empty()).then_some(AxisColumns::Many(columns))
            }
            _ => None,
        };

        let extra = obj
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), "x_axis" | "y_axis" | "color" | "title"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            x_axis: text("x_axis"),
            y_axis,
            color: text("color"),
            title: text("title"),
            extra,
        }
    }

    /// Nothing configured at all
    pub fn is_empty(&self) -> bool {
        self.x_axis.is_none()
            && self.y_axis.is_none()
            && self.color.is_none()
            && self.title.is_none()
            && self.extra.is_empty()
    }
}

/// Structured analysis plan produced by the Planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub analysis: String,
    pub steps: Vec<String>,
    pub visualization: ChartType,
    pub visualization_config: VisualizationConfig,
    pub expected_output: String,
}

impl Plan {
    /// Build a plan from extracted model JSON
    pub fn from_json(raw: &Value) -> Self {
        let steps = raw["steps"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Null => None,
                        other => Some(other.to_string()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            analysis: raw["analysis"].as_str().unwrap_or_default().to_string(),
            steps,
            visualization: ChartType::from_value(&raw["visualization"]),
            visualization_config: VisualizationConfig::from_value(&raw["visualization_config"]),
            expected_output: raw["expected_output"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Plan returned when the model reply holds no usable JSON
    pub fn unparsable() -> Self {
        Self {
            analysis: "Could not parse plan. Please try rephrasing your question.".to_string(),
            steps: vec!["Analyze the data manually".to_string()],
            visualization: ChartType::None,
            visualization_config: VisualizationConfig::default(),
            expected_output: "Please try again with a clearer question.".to_string(),
        }
    }

    /// Plan returned when the model call itself failed
    pub fn from_error(error: impl std::fmt::Display) -> Self {
        Self {
            analysis: format!("Error creating plan: {}", error),
            steps: Vec::new(),
            visualization: ChartType::None,
            visualization_config: VisualizationConfig::default(),
            expected_output: "Please try again.".to_string(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A named extra data series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub data: Vec<f64>,
}

/// Chart-ready data: labels with one or more value series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_series: Option<Vec<ChartSeries>>,
}

impl ChartData {
    /// Read chart data from model JSON; `None` when absent or empty
    pub fn from_json(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        if obj.is_empty() {
            return None;
        }

        let labels: Vec<String> = obj
            .get("labels")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(label_text).collect())
            .unwrap_or_default();

        let values = obj.get("values").map(numbers).unwrap_or_default();

        let additional_series = obj
            .get("additional_series")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|series| {
                        Some(ChartSeries {
                            name: series["name"].as_str()?.to_string(),
                            data: numbers(&series["data"]),
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|series| !series.is_empty());

        if labels.is_empty() && values.is_empty() && additional_series.is_none() {
            return None;
        }

        Some(Self {
            labels,
            values,
            additional_series,
        })
    }
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn numbers(value: &Value) -> Vec<f64> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.trim().parse().unwrap_or(0.0),
                    other => other.as_f64().unwrap_or(0.0),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Final answer produced by the Executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub answer: String,
    pub data: Option<ChartData>,
    pub chart_type: ChartType,
    pub insights: Vec<String>,
}

impl ExecutionResult {
    pub fn from_json(raw: &Value) -> Self {
        let answer = match &raw["answer"] {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };

        let insights = raw["insights"]
            .as_array()
            .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();

        Self {
            answer,
            data: ChartData::from_json(&raw["data"]),
            chart_type: ChartType::from_value(&raw["chart_type"]),
            insights,
        }
    }

    /// Result for a reply with no usable JSON: the raw text is the answer
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            answer: text.into(),
            data: None,
            chart_type: ChartType::None,
            insights: Vec::new(),
        }
    }

    /// Result for a failed model call
    pub fn from_error(error: impl std::fmt::Display) -> Self {
        Self::from_text(format!("Error executing analysis: {}", error))
    }
}
