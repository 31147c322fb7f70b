//! Finalizer - 装配对外输出、执行摘要与历史记录

use chrono::Utc;

use crate::orchestrator::state::{AgentKind, WorkflowState};
use crate::types::StepStatus;
use crate::types::workflow::{
    ExecutionHistoryEntry, ExecutionSummary, FinalOutput, PerformanceMetrics, WorkflowMetadata,
};

/// 结束计时并装配最终输出与执行摘要
pub fn finalize(state: &mut WorkflowState) {
    let end_time = Utc::now();
    let duration = (end_time - state.start_time).as_seconds_f64();

    state.end_time = Some(end_time);
    state.total_duration = Some(duration);

    state.final_output = Some(prepare_final_output(state, duration));
    state.execution_summary = Some(create_execution_summary(state, duration));
}

/// 由最终状态生成执行历史条目
pub fn history_entry(state: &WorkflowState) -> ExecutionHistoryEntry {
    ExecutionHistoryEntry {
        workflow_id: state.workflow_id,
        query: state.original_query.clone(),
        duration: state.total_duration.unwrap_or(0.0),
        steps_executed: steps_as_strings(state),
        success: determine_success(state),
        timestamp: state.end_time.unwrap_or_else(Utc::now),
    }
}

fn steps_as_strings(state: &WorkflowState) -> Vec<String> {
    state
        .step_history
        .iter()
        .map(|step| step.as_str().to_string())
        .collect()
}

/// 去重但保持首次出现顺序的智能体列表
fn agents_used(state: &WorkflowState) -> Vec<String> {
    let mut used: Vec<String> = Vec::new();
    for step in &state.step_history {
        let name = step.as_str().to_string();
        if !used.contains(&name) {
            used.push(name);
        }
    }
    used
}

/// 成功判定：三类智能体都执行过，且三个结果槽位均未以失败收场
fn determine_success(state: &WorkflowState) -> bool {
    let steps_completed = [AgentKind::Research, AgentKind::Analysis, AgentKind::Action]
        .iter()
        .all(|required| state.step_history.contains(required));

    let no_final_failures = !state
        .research_results
        .as_ref()
        .is_some_and(|r| r.status == StepStatus::Failed)
        && !state
            .analysis_results
            .as_ref()
            .is_some_and(|r| r.status == StepStatus::Failed)
        && !state
            .action_results
            .as_ref()
            .is_some_and(|r| r.status == StepStatus::Failed);

    steps_completed && no_final_failures
}

/// 装配扁平化的最终输出
fn prepare_final_output(state: &WorkflowState, duration: f64) -> FinalOutput {
    let research_summary = state
        .research_results
        .as_ref()
        .map(|r| r.summary.clone())
        .filter(|summary| !summary.is_empty())
        .unwrap_or_else(|| "No research summary available".to_string());

    let key_insights = state
        .analysis_results
        .as_ref()
        .map(|a| a.insights())
        .unwrap_or_default();

    let strategic_recommendations = state
        .action_results
        .as_ref()
        .map(|a| a.final_recommendations.clone())
        .unwrap_or_default();

    let action_plan = state
        .action_results
        .as_ref()
        .map(|a| a.priority_actions.clone())
        .unwrap_or_default();

    let next_steps = state
        .action_results
        .as_ref()
        .map(|a| a.next_steps.clone())
        .unwrap_or_default();

    let confidence_assessment = state
        .analysis_results
        .as_ref()
        .map(|a| a.confidence_scores.clone());

    FinalOutput {
        query: state.original_query.clone(),
        research_summary,
        key_insights,
        strategic_recommendations,
        action_plan,
        next_steps,
        confidence_assessment,
        workflow_metadata: WorkflowMetadata {
            workflow_id: state.workflow_id,
            steps_executed: steps_as_strings(state),
            duration_seconds: duration,
            agents_used: agents_used(state),
            retry_count: state.retry_count,
        },
    }
}

fn create_execution_summary(state: &WorkflowState, duration: f64) -> ExecutionSummary {
    let total_steps = state.step_history.len();

    ExecutionSummary {
        total_steps,
        successful_steps: total_steps,
        failed_steps: state.retry_count,
        execution_path: steps_as_strings(state).join(" → "),
        performance_metrics: PerformanceMetrics {
            total_duration: duration,
            average_step_duration: duration / total_steps.max(1) as f64,
            research_sources: state
                .research_results
                .as_ref()
                .map(|r| r.sources_researched.len())
                .unwrap_or(0),
            insights_generated: state
                .analysis_results
                .as_ref()
                .map(|a| a.insight_count())
                .unwrap_or(0),
            actions_planned: state
                .action_results
                .as_ref()
                .map(|a| a.action_count())
                .unwrap_or(0),
        },
    }
}
