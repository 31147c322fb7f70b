//! 行动智能体的输入输出类型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::analysis::AnalysisReport;
use super::llm_json::LlmJson;
use super::research::{ResearchReport, StepStatus};

/// 行动优先级及其固定分值映射
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl ActionPriority {
    pub fn score(&self) -> u32 {
        match self {
            ActionPriority::Critical => 4,
            ActionPriority::High => 3,
            ActionPriority::Medium => 2,
            ActionPriority::Low => 1,
        }
    }

    /// 从模型输出的自由文本解析，无法识别时按medium处理
    pub fn parse_lenient(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "critical" => ActionPriority::Critical,
            "high" => ActionPriority::High,
            "low" => ActionPriority::Low,
            _ => ActionPriority::Medium,
        }
    }
}

/// 行动请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub analysis_data: Option<AnalysisReport>,
    pub research_data: Option<ResearchReport>,
    pub original_query: String,
    pub constraints: Value,
    pub objectives: Vec<String>,
}

/// 计划中的单个行动
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedAction {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_effort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_outcomes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_criteria: Option<Value>,
}

impl PlannedAction {
    /// 原文降级包装 - 行动计划解析失败时的兜底结构
    pub fn from_raw(text: &str) -> Self {
        Self {
            title: "Primary Action".to_string(),
            description: Some(text.to_string()),
            action_type: Some("implementation".to_string()),
            priority: Some("high".to_string()),
            estimated_effort: None,
            dependencies: None,
            expected_outcomes: None,
            success_criteria: None,
        }
    }

    /// 首个预期产出，用于下一步安排
    pub fn first_outcome(&self) -> Option<String> {
        match &self.expected_outcomes {
            Some(Value::Array(items)) => items.first().and_then(|v| v.as_str()).map(String::from),
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }
}

/// 单个行动的紧迫性评估
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrgencyAssessment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency_score: Option<f64>,
    #[serde(default)]
    pub factors: Vec<String>,
}

/// 附加了优先级分值与紧迫性评估的行动
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrioritizedAction {
    #[serde(flatten)]
    pub action: PlannedAction,
    pub priority_score: u32,
    pub urgency_assessment: LlmJson<UrgencyAssessment>,
}

impl PrioritizedAction {
    /// 排序用的紧迫性分值；评估缺失或未解析时取中间值5
    pub fn urgency_score(&self) -> f64 {
        match &self.urgency_assessment {
            LlmJson::Parsed(assessment) => assessment.urgency_score.unwrap_or(5.0),
            LlmJson::Raw(_) => 5.0,
        }
    }
}

/// 成功指标
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessMetric {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<String>,
}

/// 即刻执行的下一步
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextStep {
    pub step: usize,
    pub action: String,
    pub description: String,
    pub timeline: String,
    pub responsible: String,
    pub deliverable: String,
}

/// 行动输入概览
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionInputSummary {
    pub has_analysis: bool,
    pub has_research: bool,
    pub key_insights_count: usize,
    pub recommendations_count: usize,
    pub sources_researched: usize,
    pub analysis_confidence: String,
}

/// 行动报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionReport {
    pub original_query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_summary: Option<ActionInputSummary>,
    pub strategic_assessment: LlmJson<Value>,
    pub action_plan: LlmJson<Vec<PlannedAction>>,
    pub priority_actions: Vec<PrioritizedAction>,
    pub implementation_roadmap: LlmJson<Value>,
    pub success_metrics: LlmJson<Vec<SuccessMetric>>,
    pub risk_assessment: LlmJson<Value>,
    pub resource_requirements: LlmJson<Value>,
    pub final_recommendations: Vec<String>,
    pub next_steps: Vec<NextStep>,
    pub execution_score: u32,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ActionReport {
    pub fn new(original_query: &str) -> Self {
        Self {
            original_query: original_query.to_string(),
            input_summary: None,
            strategic_assessment: LlmJson::Parsed(Value::Null),
            action_plan: LlmJson::Parsed(Vec::new()),
            priority_actions: Vec::new(),
            implementation_roadmap: LlmJson::Parsed(Value::Null),
            success_metrics: LlmJson::Parsed(Vec::new()),
            risk_assessment: LlmJson::Parsed(Value::Null),
            resource_requirements: LlmJson::Parsed(Value::Null),
            final_recommendations: Vec::new(),
            next_steps: Vec::new(),
            execution_score: 0,
            status: StepStatus::Completed,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(original_query: &str, error: impl Into<String>) -> Self {
        let mut report = Self::new(original_query);
        report.status = StepStatus::Failed;
        report.error = Some(error.into());
        report
    }

    /// 计划中的行动列表，原文变体降级为单元素包装
    pub fn planned_actions(&self) -> Vec<PlannedAction> {
        match &self.action_plan {
            LlmJson::Parsed(items) => items.clone(),
            LlmJson::Raw(text) => vec![PlannedAction::from_raw(text)],
        }
    }

    pub fn action_count(&self) -> usize {
        match &self.action_plan {
            LlmJson::Parsed(items) => items.len(),
            LlmJson::Raw(_) => 1,
        }
    }

    pub fn metric_count(&self) -> usize {
        match &self.success_metrics {
            LlmJson::Parsed(items) => items.len(),
            LlmJson::Raw(_) => 1,
        }
    }
}
