//! 研究智能体的输入输出类型

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 单步执行的终态 - 报告中status字段只有这两种取值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Failed,
}

/// 研究请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub query: String,
    pub urls: Vec<String>,
    pub search_terms: Vec<String>,
    pub max_sources: usize,
}

/// 单条采集内容 - 抓取、原始获取或单URL失败记录
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GatheredContent {
    Scraped {
        url: String,
        title: String,
        content: String,
        extracted_data: Value,
    },
    Fetched {
        url: String,
        content: String,
    },
    Error {
        url: String,
        error: String,
    },
}

impl GatheredContent {
    pub fn url(&self) -> &str {
        match self {
            GatheredContent::Scraped { url, .. }
            | GatheredContent::Fetched { url, .. }
            | GatheredContent::Error { url, .. } => url,
        }
    }

    /// 正文内容；失败记录没有正文
    pub fn content_text(&self) -> Option<&str> {
        match self {
            GatheredContent::Scraped { content, .. } | GatheredContent::Fetched { content, .. } => {
                Some(content)
            }
            GatheredContent::Error { .. } => None,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            GatheredContent::Scraped { title, .. } => Some(title),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, GatheredContent::Error { .. })
    }
}

/// 单个检索词在已存数据上的命中结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermSearchResult {
    pub term: String,
    pub fetched: Vec<Value>,
    pub scraped: Vec<Value>,
}

impl TermSearchResult {
    pub fn hit_count(&self) -> usize {
        self.fetched.len() + self.scraped.len()
    }
}

/// 研究报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchReport {
    pub query: String,
    pub sources_researched: Vec<String>,
    pub content_gathered: Vec<GatheredContent>,
    pub search_results: Vec<TermSearchResult>,
    pub summary: String,
    pub recommendations: Vec<String>,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResearchReport {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            sources_researched: Vec::new(),
            content_gathered: Vec::new(),
            search_results: Vec::new(),
            summary: String::new(),
            recommendations: Vec::new(),
            status: StepStatus::Completed,
            error: None,
        }
    }

    pub fn failed(query: &str, error: impl Into<String>) -> Self {
        let mut report = Self::new(query);
        report.status = StepStatus::Failed;
        report.error = Some(error.into());
        report
    }

    /// 是否存在非空正文的采集内容
    pub fn has_content(&self) -> bool {
        self.content_gathered
            .iter()
            .any(|item| item.content_text().is_some_and(|c| !c.trim().is_empty()))
    }

    /// 失败记录条数
    pub fn error_count(&self) -> usize {
        self.content_gathered.iter().filter(|i| i.is_error()).count()
    }
}
