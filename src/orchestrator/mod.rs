//! 多智能体编排器
//!
//! 以协调器为中心的工作流图：`start → coordinated → {research|analysis|action}
//! → coordinated → … → end`。协调器是唯一做路由决策的节点；智能体成功后
//! 直接进入下一个智能体，失败则回到协调器走重试逻辑（这一不对称是有意
//! 保留的既有行为）。重试预算由三个智能体共享，耗尽后工作流带着已有的
//! 部分结果正常收束，而不是报错。

use anyhow::Result;
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::agents::{ActionAgent, AnalysisAgent, ResearchAgent};
use crate::config::Config;
use crate::llm::{LLMClient, LlmCollaborator};
use crate::mcp::{McpClient, McpCollaborator};
use crate::types::workflow::{ExecutionHistoryEntry, FinalOutput, UserInput};
use crate::types::{StepStatus, action::ActionRequest, analysis::AnalysisRequest,
    research::ResearchRequest};

pub mod finalize;
pub mod history;
pub mod state;

use history::ExecutionHistory;
use state::{CurrentStep, NextAgent, WorkflowState, decide_next_agent};

/// 工作流图中的节点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraphNode {
    Coordinator,
    Research,
    Analysis,
    Action,
    Finalizer,
}

/// 多智能体编排器
pub struct Orchestrator {
    research_agent: Arc<ResearchAgent>,
    analysis_agent: Arc<AnalysisAgent>,
    action_agent: Arc<ActionAgent>,
    mcp: Arc<dyn McpCollaborator>,
    max_retries: u32,
    execution_history: Mutex<ExecutionHistory>,
}

impl Orchestrator {
    /// 根据配置创建编排器，为每个智能体构建独立的LLM客户端
    pub fn new(config: &Config) -> Result<Self> {
        let mcp: Arc<dyn McpCollaborator> = Arc::new(McpClient::new(&config.mcp)?);

        let research_llm: Arc<dyn LlmCollaborator> =
            Arc::new(LLMClient::for_agent(&config.llm, &config.research_agent)?);
        let analysis_llm: Arc<dyn LlmCollaborator> =
            Arc::new(LLMClient::for_agent(&config.llm, &config.analysis_agent)?);
        let action_llm: Arc<dyn LlmCollaborator> =
            Arc::new(LLMClient::for_agent(&config.llm, &config.action_agent)?);

        Ok(Self::with_agents(
            Arc::new(ResearchAgent::new(config, research_llm, mcp.clone())),
            Arc::new(AnalysisAgent::new(config, analysis_llm)),
            Arc::new(ActionAgent::new(config, action_llm)),
            mcp,
            config.orchestrator.max_retries,
            config.orchestrator.history_capacity,
        ))
    }

    /// 以既有智能体组装编排器，供测试注入替身协作方
    pub fn with_agents(
        research_agent: Arc<ResearchAgent>,
        analysis_agent: Arc<AnalysisAgent>,
        action_agent: Arc<ActionAgent>,
        mcp: Arc<dyn McpCollaborator>,
        max_retries: u32,
        history_capacity: usize,
    ) -> Self {
        Self {
            research_agent,
            analysis_agent,
            action_agent,
            mcp,
            max_retries,
            execution_history: Mutex::new(ExecutionHistory::new(history_capacity)),
        }
    }

    /// 执行多智能体工作流
    ///
    /// 所有预期内的失败都体现在结果数据的status字段上；此方法返回Err
    /// 仅代表编程错误级别的意外情况。
    pub async fn execute(&self, query: &str, user_input: UserInput) -> Result<FinalOutput> {
        println!("🚀 启动多智能体编排: {}", query);

        let mut state = WorkflowState::new(query, user_input, self.max_retries);
        let mut node = GraphNode::Coordinator;

        loop {
            match node {
                GraphNode::Coordinator => {
                    self.coordinator_node(&mut state);
                    node = match state.next_agent.unwrap_or(NextAgent::End) {
                        NextAgent::Research => GraphNode::Research,
                        NextAgent::Analysis => GraphNode::Analysis,
                        NextAgent::Action => GraphNode::Action,
                        NextAgent::End => GraphNode::Finalizer,
                    };
                }
                GraphNode::Research => {
                    self.research_node(&mut state).await;
                    // 成功直接进入分析，失败交回协调器处理重试
                    node = if state.current_step == CurrentStep::ResearchFailed {
                        GraphNode::Coordinator
                    } else {
                        GraphNode::Analysis
                    };
                }
                GraphNode::Analysis => {
                    self.analysis_node(&mut state).await;
                    node = if state.current_step == CurrentStep::AnalysisFailed {
                        GraphNode::Coordinator
                    } else {
                        GraphNode::Action
                    };
                }
                GraphNode::Action => {
                    self.action_node(&mut state).await;
                    // 行动是末端步骤，不触发结果驱动的回环
                    node = GraphNode::Finalizer;
                }
                GraphNode::Finalizer => {
                    self.finalizer_node(&mut state).await;
                    break;
                }
            }
        }

        state
            .final_output
            .take()
            .ok_or_else(|| anyhow::anyhow!("工作流结束但缺少最终输出"))
    }

    /// 协调器节点 - 唯一的路由决策点
    fn coordinator_node(&self, state: &mut WorkflowState) {
        println!("🎭 协调器决策中...");

        let next = decide_next_agent(state);
        if state.current_step.is_failed() && next != NextAgent::End {
            state.retry_count += 1;
        }

        state.next_agent = Some(next);
        state.current_step = CurrentStep::Coordinated;
        println!("🎯 下一个智能体: {}", next);
    }

    async fn research_node(&self, state: &mut WorkflowState) {
        println!("🔍 执行研究智能体...");

        let request = Self::prepare_research_input(state);
        let report = self.research_agent.process(&request).await;

        match report.status {
            StepStatus::Completed => {
                println!("✅ 研究完成: 处理了 {} 个来源", report.content_gathered.len());
            }
            StepStatus::Failed => {
                eprintln!(
                    "❌ 研究失败: {}",
                    report.error.as_deref().unwrap_or("未知错误")
                );
            }
        }

        state.record_research(report);
    }

    async fn analysis_node(&self, state: &mut WorkflowState) {
        println!("📊 执行分析智能体...");

        let request = Self::prepare_analysis_input(state);
        let report = self.analysis_agent.process(&request).await;

        match report.status {
            StepStatus::Completed => {
                println!("✅ 分析完成: 识别了 {} 条洞察", report.insight_count());
            }
            StepStatus::Failed => {
                eprintln!(
                    "❌ 分析失败: {}",
                    report.error.as_deref().unwrap_or("未知错误")
                );
            }
        }

        state.record_analysis(report);
    }

    async fn action_node(&self, state: &mut WorkflowState) {
        println!("🎯 执行行动智能体...");

        let request = Self::prepare_action_input(state);
        let report = self.action_agent.process(&request).await;

        match report.status {
            StepStatus::Completed => {
                println!("✅ 行动规划完成: 规划了 {} 个行动", report.action_count());
            }
            StepStatus::Failed => {
                eprintln!(
                    "❌ 行动规划失败: {}",
                    report.error.as_deref().unwrap_or("未知错误")
                );
            }
        }

        state.record_action(report);
    }

    async fn finalizer_node(&self, state: &mut WorkflowState) {
        println!("🏁 收尾工作流...");

        finalize::finalize(state);

        let entry = finalize::history_entry(state);
        self.execution_history.lock().await.push(entry);

        println!(
            "✅ 工作流完成，耗时 {:.2} 秒",
            state.total_duration.unwrap_or(0.0)
        );
    }

    fn prepare_research_input(state: &WorkflowState) -> ResearchRequest {
        ResearchRequest {
            query: state.original_query.clone(),
            urls: state.user_input.urls.clone(),
            search_terms: state.user_input.search_terms.clone(),
            max_sources: state.user_input.max_sources,
        }
    }

    fn prepare_analysis_input(state: &WorkflowState) -> AnalysisRequest {
        AnalysisRequest {
            research_data: state.research_results.clone(),
            analysis_type: state.user_input.analysis_type,
            focus_areas: state.user_input.focus_areas.clone(),
        }
    }

    fn prepare_action_input(state: &WorkflowState) -> ActionRequest {
        ActionRequest {
            analysis_data: state.analysis_results.clone(),
            research_data: state.research_results.clone(),
            original_query: state.original_query.clone(),
            constraints: state.user_input.constraints.clone(),
            objectives: state.user_input.objectives.clone(),
        }
    }

    /// 过往完成的工作流记录
    pub async fn get_execution_history(&self) -> Vec<ExecutionHistoryEntry> {
        self.execution_history.lock().await.snapshot()
    }

    /// 全部智能体的状态快照
    pub async fn get_agent_status(&self) -> Value {
        json!({
            "research_agent": self.research_agent.core().status().await,
            "analysis_agent": self.analysis_agent.core().status().await,
            "action_agent": self.action_agent.core().status().await,
        })
    }

    /// 编排器与各协作方的健康检查；连接异常以字符串形式报告，从不抛出
    pub async fn health_check(&self) -> Value {
        let mcp_health = match self.mcp.health_check().await {
            Ok(health) => health,
            Err(e) => json!(format!("error: {}", e)),
        };

        json!({
            "orchestrator": "healthy",
            "agents": self.get_agent_status().await,
            "mcp_server": mcp_health,
            "execution_history_count": self.execution_history.lock().await.len(),
            "timestamp": Utc::now(),
        })
    }
}
