//! 智能体系统
//!
//! 三个智能体构成一条流水线，由编排器按工作流图依次调度：
//!
//! - **研究智能体**：通过MCP服务采集网页内容与历史数据
//! - **分析智能体**：从研究材料中提炼洞察、模式与综合叙述
//! - **行动智能体**：基于分析产出优先级排序的行动计划
//!
//! 所有智能体共享[`AgentCore`]提供的基础能力：身份信息、LLM调用转发、
//! 有界的对话历史记录与状态快照。

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::llm::LlmCollaborator;

pub mod action;
pub mod analysis;
pub mod research;

pub use action::ActionAgent;
pub use analysis::AnalysisAgent;
pub use research::ResearchAgent;

/// 对话历史条数上限，超出后丢弃最旧记录
const CONVERSATION_CAPACITY: usize = 256;

/// 对话历史条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub agent: String,
}

/// 智能体状态快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatus {
    pub name: String,
    pub model: String,
    pub temperature: f64,
    pub conversation_length: usize,
    pub capabilities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}

/// 智能体共享的基础能力
pub struct AgentCore {
    name: String,
    model: String,
    temperature: f64,
    capabilities: Vec<&'static str>,
    llm: Arc<dyn LlmCollaborator>,
    conversation_history: Mutex<VecDeque<ConversationEntry>>,
}

impl AgentCore {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        temperature: f64,
        capabilities: Vec<&'static str>,
        llm: Arc<dyn LlmCollaborator>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            temperature,
            capabilities,
            llm,
            conversation_history: Mutex::new(VecDeque::new()),
        }
    }

    /// 调用LLM协作方并记录本次交互
    pub async fn invoke_llm(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let response = self.llm.complete(system_prompt, user_prompt).await?;

        self.record("user", user_prompt).await;
        self.record("assistant", &response).await;

        Ok(response)
    }

    /// 追加一条对话记录，容量满时丢弃最旧条目
    async fn record(&self, role: &str, content: &str) {
        let mut history = self.conversation_history.lock().await;
        history.push_back(ConversationEntry {
            role: role.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
            agent: self.name.clone(),
        });
        while history.len() > CONVERSATION_CAPACITY {
            history.pop_front();
        }
    }

    /// 状态快照
    pub async fn status(&self) -> AgentStatus {
        let history = self.conversation_history.lock().await;
        AgentStatus {
            name: self.name.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            conversation_length: history.len(),
            capabilities: self.capabilities.iter().map(|c| c.to_string()).collect(),
            last_activity: history.back().map(|entry| entry.timestamp),
        }
    }

    /// 清空对话历史
    pub async fn clear_history(&self) {
        self.conversation_history.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// 固定回复的LLM替身
    struct EchoLlm;

    #[async_trait]
    impl LlmCollaborator for EchoLlm {
        async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
            Ok(format!("echo: {}", user_prompt))
        }
    }

    fn test_core() -> AgentCore {
        AgentCore::new(
            "Test Agent",
            "test-model",
            0.5,
            vec!["llm_interaction"],
            Arc::new(EchoLlm),
        )
    }

    #[tokio::test]
    async fn test_invoke_llm_records_both_sides() {
        let core = test_core();
        let response = core.invoke_llm("system", "question").await.unwrap();

        assert_eq!(response, "echo: question");
        let status = core.status().await;
        assert_eq!(status.conversation_length, 2);
        assert!(status.last_activity.is_some());
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let core = test_core();
        for i in 0..200 {
            core.invoke_llm("system", &format!("q{}", i)).await.unwrap();
        }

        let status = core.status().await;
        assert_eq!(status.conversation_length, CONVERSATION_CAPACITY);
    }

    #[tokio::test]
    async fn test_clear_history() {
        let core = test_core();
        core.invoke_llm("system", "question").await.unwrap();
        core.clear_history().await;

        let status = core.status().await;
        assert_eq!(status.conversation_length, 0);
        assert!(status.last_activity.is_none());
    }

    #[tokio::test]
    async fn test_status_snapshot_identity() {
        let core = test_core();
        let status = core.status().await;

        assert_eq!(status.name, "Test Agent");
        assert_eq!(status.model, "test-model");
        assert_eq!(status.temperature, 0.5);
        assert_eq!(status.capabilities, vec!["llm_interaction"]);
    }
}
