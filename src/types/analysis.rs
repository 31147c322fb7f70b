//! 分析智能体的输入输出类型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::llm_json::LlmJson;
use super::research::{ResearchReport, StepStatus};

/// 分析风格 - 决定综合叙述采用的提示词指令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    #[default]
    Comprehensive,
    Executive,
    Technical,
    Comparative,
    Critical,
}

impl AnalysisType {
    /// 各风格对应的综合指令，注入综合叙述的提示词
    pub fn instruction(&self) -> &'static str {
        match self {
            AnalysisType::Comprehensive => "提供覆盖所有方面的全面、详尽的综合分析",
            AnalysisType::Executive => "聚焦高层结论与战略影响，面向决策者精炼呈现",
            AnalysisType::Technical => "强调技术细节、方法论与数据分析过程",
            AnalysisType::Comparative => "对比不同来源与观点的异同，突出分歧与共识",
            AnalysisType::Critical => "批判性评估各项主张，指出论证的强弱与漏洞",
        }
    }
}

impl std::fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AnalysisType::Comprehensive => "comprehensive",
            AnalysisType::Executive => "executive",
            AnalysisType::Technical => "technical",
            AnalysisType::Comparative => "comparative",
            AnalysisType::Critical => "critical",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "comprehensive" => Ok(AnalysisType::Comprehensive),
            "executive" => Ok(AnalysisType::Executive),
            "technical" => Ok(AnalysisType::Technical),
            "comparative" => Ok(AnalysisType::Comparative),
            "critical" => Ok(AnalysisType::Critical),
            _ => Err(format!("Unknown analysis type: {}", s)),
        }
    }
}

/// 分析请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub research_data: Option<ResearchReport>,
    pub analysis_type: AnalysisType,
    pub focus_areas: Vec<String>,
}

/// 关键洞察
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    #[serde(alias = "statement")]
    pub insight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f64>,
}

impl Insight {
    /// 原文降级包装 - JSON解析失败时的单元素兜底结构
    pub fn from_raw(text: &str) -> Self {
        Self {
            insight: text.to_string(),
            evidence: None,
            confidence: Some("medium".to_string()),
            relevance: Some(7.0),
        }
    }
}

/// 识别出的模式或趋势
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternFinding {
    #[serde(alias = "description")]
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implications: Option<String>,
}

/// 行动建议
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(alias = "statement")]
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
}

/// 置信度评估 - 部分由本地启发式计算
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceScores {
    pub overall_confidence: String,
    pub source_reliability: String,
    pub data_completeness: String,
    pub analysis_depth: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// 输入数据概览，用于追踪
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisInputSummary {
    pub query: String,
    pub sources_count: usize,
    pub content_items: usize,
    pub search_results_count: usize,
    pub has_recommendations: bool,
}

/// 分析报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis_type: AnalysisType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_summary: Option<AnalysisInputSummary>,
    pub key_insights: LlmJson<Vec<Insight>>,
    pub patterns_identified: LlmJson<Vec<PatternFinding>>,
    pub source_evaluation: LlmJson<Value>,
    pub synthesis: String,
    pub recommendations: LlmJson<Vec<Recommendation>>,
    pub confidence_scores: ConfidenceScores,
    pub limitations: Vec<String>,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn new(analysis_type: AnalysisType) -> Self {
        Self {
            analysis_type,
            input_summary: None,
            key_insights: LlmJson::Parsed(Vec::new()),
            patterns_identified: LlmJson::Parsed(Vec::new()),
            source_evaluation: LlmJson::Parsed(Value::Null),
            synthesis: String::new(),
            recommendations: LlmJson::Parsed(Vec::new()),
            confidence_scores: ConfidenceScores {
                overall_confidence: "low".to_string(),
                source_reliability: "low".to_string(),
                data_completeness: "low".to_string(),
                analysis_depth: "medium".to_string(),
                note: None,
            },
            limitations: Vec::new(),
            status: StepStatus::Completed,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(analysis_type: AnalysisType, error: impl Into<String>) -> Self {
        let mut report = Self::new(analysis_type);
        report.status = StepStatus::Failed;
        report.error = Some(error.into());
        report
    }

    /// 洞察列表，原文变体降级为单元素包装
    pub fn insights(&self) -> Vec<Insight> {
        match &self.key_insights {
            LlmJson::Parsed(items) => items.clone(),
            LlmJson::Raw(text) => vec![Insight::from_raw(text)],
        }
    }

    pub fn insight_count(&self) -> usize {
        match &self.key_insights {
            LlmJson::Parsed(items) => items.len(),
            LlmJson::Raw(_) => 1,
        }
    }
}
