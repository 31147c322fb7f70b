//! 工作流状态 - 单次execute调用独占的可变记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::StepStatus;
use crate::types::action::ActionReport;
use crate::types::analysis::AnalysisReport;
use crate::types::research::ResearchReport;
use crate::types::workflow::{ExecutionSummary, FinalOutput, UserInput};

/// 智能体类别，也是step_history中的条目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Research,
    Analysis,
    Action,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Research => "research",
            AgentKind::Analysis => "analysis",
            AgentKind::Action => "action",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 当前步骤，只由节点处理器写入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentStep {
    Start,
    Coordinated,
    ResearchCompleted,
    ResearchFailed,
    AnalysisCompleted,
    AnalysisFailed,
    ActionCompleted,
    ActionFailed,
}

impl CurrentStep {
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            CurrentStep::ResearchFailed | CurrentStep::AnalysisFailed | CurrentStep::ActionFailed
        )
    }

    /// 失败步骤对应的智能体
    pub fn failed_agent(&self) -> Option<AgentKind> {
        match self {
            CurrentStep::ResearchFailed => Some(AgentKind::Research),
            CurrentStep::AnalysisFailed => Some(AgentKind::Analysis),
            CurrentStep::ActionFailed => Some(AgentKind::Action),
            _ => None,
        }
    }
}

/// 协调器的路由信号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NextAgent {
    Research,
    Analysis,
    Action,
    End,
}

impl std::fmt::Display for NextAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NextAgent::Research => "research",
            NextAgent::Analysis => "analysis",
            NextAgent::Action => "action",
            NextAgent::End => "end",
        };
        write!(f, "{}", name)
    }
}

impl From<AgentKind> for NextAgent {
    fn from(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Research => NextAgent::Research,
            AgentKind::Analysis => NextAgent::Analysis,
            AgentKind::Action => NextAgent::Action,
        }
    }
}

/// 工作流状态
///
/// 在一次execute调用的所有节点间按引用传递，调用结束即废弃；
/// 不会跨执行共享。
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub workflow_id: Uuid,
    pub original_query: String,
    pub user_input: UserInput,
    pub current_step: CurrentStep,
    pub step_history: Vec<AgentKind>,
    pub research_results: Option<ResearchReport>,
    pub analysis_results: Option<AnalysisReport>,
    pub action_results: Option<ActionReport>,
    pub next_agent: Option<NextAgent>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub final_output: Option<FinalOutput>,
    pub execution_summary: Option<ExecutionSummary>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_duration: Option<f64>,
}

impl WorkflowState {
    pub fn new(query: &str, user_input: UserInput, max_retries: u32) -> Self {
        Self {
            workflow_id: Uuid::new_v4(),
            original_query: query.to_string(),
            user_input,
            current_step: CurrentStep::Start,
            step_history: Vec::new(),
            research_results: None,
            analysis_results: None,
            action_results: None,
            next_agent: None,
            retry_count: 0,
            max_retries,
            final_output: None,
            execution_summary: None,
            start_time: Utc::now(),
            end_time: None,
            total_duration: None,
        }
    }

    /// 记录某个智能体的报告，更新当前步骤并追加执行历史
    ///
    /// 失败的报告不会覆盖同一槽位中先前成功的报告。
    pub fn record_research(&mut self, report: ResearchReport) {
        let failed = report.status == StepStatus::Failed;
        let keep_prior = failed
            && matches!(&self.research_results, Some(prior) if prior.status == StepStatus::Completed);
        if !keep_prior {
            self.research_results = Some(report);
        }
        self.current_step = if failed {
            CurrentStep::ResearchFailed
        } else {
            CurrentStep::ResearchCompleted
        };
        self.step_history.push(AgentKind::Research);
    }

    pub fn record_analysis(&mut self, report: AnalysisReport) {
        let failed = report.status == StepStatus::Failed;
        let keep_prior = failed
            && matches!(&self.analysis_results, Some(prior) if prior.status == StepStatus::Completed);
        if !keep_prior {
            self.analysis_results = Some(report);
        }
        self.current_step = if failed {
            CurrentStep::AnalysisFailed
        } else {
            CurrentStep::AnalysisCompleted
        };
        self.step_history.push(AgentKind::Analysis);
    }

    pub fn record_action(&mut self, report: ActionReport) {
        let failed = report.status == StepStatus::Failed;
        let keep_prior = failed
            && matches!(&self.action_results, Some(prior) if prior.status == StepStatus::Completed);
        if !keep_prior {
            self.action_results = Some(report);
        }
        self.current_step = if failed {
            CurrentStep::ActionFailed
        } else {
            CurrentStep::ActionCompleted
        };
        self.step_history.push(AgentKind::Action);
    }
}

/// 协调器路由决策 - 状态的纯函数
///
/// 不修改状态；对同一状态重复调用得到相同结果。重试计数的递增由
/// 协调器节点在采纳决策时执行。
pub fn decide_next_agent(state: &WorkflowState) -> NextAgent {
    match state.current_step {
        CurrentStep::Start => NextAgent::Research,
        CurrentStep::ResearchCompleted
            if !state.step_history.contains(&AgentKind::Analysis) =>
        {
            NextAgent::Analysis
        }
        CurrentStep::AnalysisCompleted if !state.step_history.contains(&AgentKind::Action) => {
            NextAgent::Action
        }
        step if step.is_failed() => {
            if state.retry_count < state.max_retries {
                step.failed_agent()
                    .map(NextAgent::from)
                    .unwrap_or(NextAgent::End)
            } else {
                NextAgent::End
            }
        }
        _ => NextAgent::End,
    }
}
