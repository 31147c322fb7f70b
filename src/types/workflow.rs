//! 工作流的输入选项与最终输出类型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::action::{NextStep, PrioritizedAction};
use super::analysis::{AnalysisType, ConfidenceScores, Insight};

/// 用户随查询一同提交的选项，执行开始后不再变更
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInput {
    pub urls: Vec<String>,
    pub search_terms: Vec<String>,
    pub max_sources: usize,
    pub analysis_type: AnalysisType,
    pub focus_areas: Vec<String>,
    pub objectives: Vec<String>,
    pub constraints: Value,
}

impl Default for UserInput {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            search_terms: Vec::new(),
            max_sources: 5,
            analysis_type: AnalysisType::default(),
            focus_areas: Vec::new(),
            objectives: Vec::new(),
            constraints: Value::Null,
        }
    }
}

/// 工作流元数据，随最终输出一同返回
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    pub workflow_id: Uuid,
    pub steps_executed: Vec<String>,
    pub duration_seconds: f64,
    pub agents_used: Vec<String>,
    pub retry_count: u32,
}

/// 对外可见的最终结果，由Finalizer统一装配
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalOutput {
    pub query: String,
    pub research_summary: String,
    pub key_insights: Vec<Insight>,
    pub strategic_recommendations: Vec<String>,
    pub action_plan: Vec<PrioritizedAction>,
    pub next_steps: Vec<NextStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_assessment: Option<ConfidenceScores>,
    pub workflow_metadata: WorkflowMetadata,
}

/// 各阶段耗时与产出规模
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_duration: f64,
    pub average_step_duration: f64,
    pub research_sources: usize,
    pub insights_generated: usize,
    pub actions_planned: usize,
}

/// 执行摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total_steps: usize,
    pub successful_steps: usize,
    pub failed_steps: u32,
    pub execution_path: String,
    pub performance_metrics: PerformanceMetrics,
}

/// 编排器保留的单次执行记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionHistoryEntry {
    pub workflow_id: Uuid,
    pub query: String,
    pub duration: f64,
    pub steps_executed: Vec<String>,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}
