use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use triad_rs::agents::{ActionAgent, AnalysisAgent, ResearchAgent};
use triad_rs::config::Config;
use triad_rs::llm::LlmCollaborator;
use triad_rs::mcp::{FetchResponse, McpCollaborator, McpError, ScrapeResponse, SearchResponse};
use triad_rs::orchestrator::Orchestrator;
use triad_rs::types::workflow::UserInput;

/// 端到端测试用的LLM替身，按提示词关键字返回结构化回复
struct ScriptedLlm;

#[async_trait]
impl LlmCollaborator for ScriptedLlm {
    async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        let response = if user_prompt.contains("评估该行动的紧迫性") {
            r#"{"urgency_level": "immediate", "urgency_score": 9, "factors": ["窗口期短"]}"#
                .to_string()
        } else if user_prompt.contains("提炼关键洞察") {
            r#"[{"insight": "端到端洞察", "confidence": "High", "relevance": 8}]"#.to_string()
        } else if user_prompt.contains("识别其中的模式") {
            r#"[{"pattern": "端到端模式", "strength": "Moderate"}]"#.to_string()
        } else if user_prompt.contains("生成完整的行动计划") {
            r#"[{"title": "端到端行动", "type": "implementation", "priority": "high", "expected_outcomes": ["交付物"]}]"#
                .to_string()
        } else if user_prompt.contains("定义成功指标") {
            r#"[{"name": "端到端指标", "importance": "critical"}]"#.to_string()
        } else if user_prompt.contains("生成最终战略建议") {
            "- 端到端建议一\n- 端到端建议二".to_string()
        } else if user_prompt.contains("可执行的建议") {
            r#"[{"recommendation": "推进试点"}]"#.to_string()
        } else if user_prompt.contains("进行战略评估") {
            r#"{"situation": "稳定"}"#.to_string()
        } else if user_prompt.contains("评估该行动计划的风险") {
            r#"{"risks": "可控"}"#.to_string()
        } else if user_prompt.contains("所需的资源") {
            r#"{"team": "small"}"#.to_string()
        } else if user_prompt.contains("制定实施路线图") {
            r#"{"phases": ["launch"]}"#.to_string()
        } else if user_prompt.contains("评估以下来源的可信度") {
            r#"{"evaluation": "medium"}"#.to_string()
        } else if user_prompt.contains("可能存在的局限") {
            "- 覆盖面有限".to_string()
        } else if user_prompt.contains("完整的研究摘要") {
            "端到端研究摘要。".to_string()
        } else {
            "通用回复。".to_string()
        };

        Ok(response)
    }
}

/// 健康的MCP替身
struct HealthyMcp;

#[async_trait]
impl McpCollaborator for HealthyMcp {
    async fn fetch_url(
        &self,
        url: &str,
        _headers: Option<HashMap<String, String>>,
        _timeout_secs: u64,
    ) -> Result<FetchResponse, McpError> {
        Ok(FetchResponse {
            id: Some(1),
            url: url.to_string(),
            content: "raw content".to_string(),
            metadata: json!({}),
            stored: true,
        })
    }

    async fn scrape_url(
        &self,
        url: &str,
        _selectors: Option<HashMap<String, String>>,
        _extract_links: bool,
        _extract_images: bool,
    ) -> Result<ScrapeResponse, McpError> {
        Ok(ScrapeResponse {
            id: Some(2),
            url: url.to_string(),
            title: "Scraped Page".to_string(),
            content: "scraped content about the topic".to_string(),
            extracted_data: json!({}),
            stored: true,
        })
    }

    async fn search_data(
        &self,
        _table: &str,
        _search_term: &str,
        _limit: usize,
    ) -> Result<SearchResponse, McpError> {
        Ok(SearchResponse {
            results: vec![json!({"id": 1})],
            count: 1,
        })
    }

    async fn health_check(&self) -> Result<Value, McpError> {
        Ok(json!({"status": "healthy"}))
    }
}

fn build_orchestrator() -> Orchestrator {
    let config = Config::default();
    let llm: Arc<dyn LlmCollaborator> = Arc::new(ScriptedLlm);
    let mcp: Arc<dyn McpCollaborator> = Arc::new(HealthyMcp);

    Orchestrator::with_agents(
        Arc::new(ResearchAgent::new(&config, llm.clone(), mcp.clone())),
        Arc::new(AnalysisAgent::new(&config, llm.clone())),
        Arc::new(ActionAgent::new(&config, llm)),
        mcp,
        config.orchestrator.max_retries,
        config.orchestrator.history_capacity,
    )
}

#[tokio::test]
async fn test_full_workflow_end_to_end() {
    let orchestrator = build_orchestrator();

    let user_input = UserInput {
        urls: vec![
            "https://www.example.com/report".to_string(),
            "https://cdn.example.com/data.json".to_string(),
        ],
        search_terms: vec!["topic".to_string()],
        ..Default::default()
    };

    let output = orchestrator
        .execute("How should we adopt the technology?", user_input)
        .await
        .unwrap();

    assert_eq!(output.query, "How should we adopt the technology?");
    assert!(!output.research_summary.is_empty());
    assert!(!output.key_insights.is_empty());
    assert!(!output.action_plan.is_empty());
    assert!(!output.next_steps.is_empty());
    assert!(output.confidence_assessment.is_some());
    assert_eq!(
        output.workflow_metadata.steps_executed,
        vec!["research", "analysis", "action"]
    );

    // 最终输出可序列化为JSON（CLI输出路径依赖这一点）
    let rendered = serde_json::to_string_pretty(&output).unwrap();
    assert!(rendered.contains("workflow_metadata"));
}

#[tokio::test]
async fn test_execution_history_accumulates_across_calls() {
    let orchestrator = build_orchestrator();

    for i in 0..3 {
        let output = orchestrator
            .execute(
                &format!("query {}", i),
                UserInput {
                    urls: vec!["https://www.example.com/page".to_string()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(output.workflow_metadata.duration_seconds >= 0.0);
    }

    let history = orchestrator.get_execution_history().await;
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|entry| entry.success));
    assert_eq!(history[0].query, "query 0");
    assert_eq!(history[2].query, "query 2");
}

#[tokio::test]
async fn test_agent_status_shape() {
    let orchestrator = build_orchestrator();

    let status = orchestrator.get_agent_status().await;
    for agent in ["research_agent", "analysis_agent", "action_agent"] {
        assert!(status[agent]["name"].is_string());
        assert!(status[agent]["model"].is_string());
        assert!(status[agent]["conversation_length"].is_number());
    }
}

#[tokio::test]
async fn test_health_check_never_fails() {
    let orchestrator = build_orchestrator();

    let health = orchestrator.health_check().await;
    assert_eq!(health["orchestrator"], "healthy");
    assert_eq!(health["mcp_server"]["status"], "healthy");
    assert_eq!(health["execution_history_count"], 0);
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();
    config.llm.api_key = "sk-test".to_string();

    let issues = config.validate();
    assert!(issues.is_ok());

    config.mcp.base_url = "not-a-url".to_string();
    let issues = config.validate();
    assert!(!issues.is_ok());
}
