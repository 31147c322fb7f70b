//! 行动智能体 - 基于分析与研究产出优先级排序的行动计划

use anyhow::Result;
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::agents::AgentCore;
use crate::config::Config;
use crate::llm::LlmCollaborator;
use crate::types::LlmJson;
use crate::types::StepStatus;
use crate::types::action::{
    ActionInputSummary, ActionPriority, ActionReport, ActionRequest, NextStep, PlannedAction,
    PrioritizedAction, SuccessMetric, UrgencyAssessment,
};
use crate::utils::text::{parse_bullet_lines, truncate_chars};

/// 排序后保留的优先行动数
const TOP_PRIORITY_ACTIONS: usize = 5;

/// 进入下一步安排的行动数
const NEXT_STEP_COUNT: usize = 3;

const CAPABILITIES: [&str; 7] = [
    "strategic_planning",
    "action_prioritization",
    "risk_assessment",
    "resource_planning",
    "implementation_roadmapping",
    "success_metrics_definition",
    "decision_making",
];

/// 行动智能体
pub struct ActionAgent {
    core: AgentCore,
}

impl ActionAgent {
    pub fn new(config: &Config, llm: Arc<dyn LlmCollaborator>) -> Self {
        let agent_config = &config.action_agent;
        let model = agent_config
            .model
            .clone()
            .unwrap_or_else(|| config.llm.model.clone());

        Self {
            core: AgentCore::new(
                agent_config.name.clone(),
                model,
                agent_config.temperature,
                CAPABILITIES.to_vec(),
                llm,
            ),
        }
    }

    pub fn core(&self) -> &AgentCore {
        &self.core
    }

    fn system_prompt() -> &'static str {
        "你是一名行动智能体，专长是战略决策与行动规划。\n\
         你的能力包括：战略分析与决策、行动计划制定与排序、\n\
         风险评估与缓解规划、资源配置与时间规划、成功指标定义、\n\
         实施路线图制定。\n\
         要求：保持战略性、务实、结果导向；行动须直接服务于最初目标；\n\
         考虑实施可行性与资源约束。"
    }

    /// 处理行动规划请求
    ///
    /// 任何内部错误都收敛为报告中的failed状态，不向外抛出。
    pub async fn process(&self, request: &ActionRequest) -> ActionReport {
        if request.analysis_data.is_none() && request.research_data.is_none() {
            return ActionReport::failed(&request.original_query, "没有可用的分析或研究数据");
        }

        let mut report = ActionReport::new(&request.original_query);
        report.input_summary = Some(Self::summarize_inputs(request));

        if let Err(e) = self.run_pipeline(request, &mut report).await {
            report.status = StepStatus::Failed;
            report.error = Some(e.to_string());
        }
        report.timestamp = Utc::now();

        report
    }

    /// 规划流水线，按固定顺序执行各子步骤
    async fn run_pipeline(&self, request: &ActionRequest, report: &mut ActionReport) -> Result<()> {
        // 1. 战略评估
        report.strategic_assessment = self.conduct_strategic_assessment(request).await?;

        // 2. 生成行动计划
        report.action_plan = self.generate_action_plan(request).await?;

        // 3. 行动优先级排序
        report.priority_actions = self.prioritize_actions(&report.planned_actions()).await?;

        // 4. 实施路线图
        report.implementation_roadmap = self
            .create_implementation_roadmap(&report.priority_actions)
            .await?;

        // 5. 成功指标
        let planned = report.planned_actions();
        report.success_metrics = self.define_success_metrics(request, &planned).await?;

        // 6. 风险评估
        report.risk_assessment = self.assess_risks(&planned, &request.constraints).await?;

        // 7. 资源需求
        report.resource_requirements = self.determine_resource_requirements(&planned).await?;

        // 8. 最终建议
        report.final_recommendations = self.generate_final_recommendations(report).await?;

        // 9. 下一步安排
        report.next_steps = Self::define_next_steps(&report.priority_actions);

        // 10. 执行就绪评分
        report.execution_score = Self::calculate_execution_score(report);

        Ok(())
    }

    fn summarize_inputs(request: &ActionRequest) -> ActionInputSummary {
        let analysis = request.analysis_data.as_ref();
        ActionInputSummary {
            has_analysis: analysis.is_some(),
            has_research: request.research_data.is_some(),
            key_insights_count: analysis.map(|a| a.insight_count()).unwrap_or(0),
            recommendations_count: analysis
                .map(|a| match &a.recommendations {
                    LlmJson::Parsed(items) => items.len(),
                    LlmJson::Raw(_) => 1,
                })
                .unwrap_or(0),
            sources_researched: request
                .research_data
                .as_ref()
                .map(|r| r.sources_researched.len())
                .unwrap_or(0),
            analysis_confidence: analysis
                .map(|a| a.confidence_scores.overall_confidence.clone())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }

    /// 战略态势评估
    async fn conduct_strategic_assessment(
        &self,
        request: &ActionRequest,
    ) -> Result<LlmJson<Value>> {
        let analysis = request.analysis_data.as_ref();
        let synthesis = analysis.map(|a| a.synthesis.as_str()).unwrap_or("");
        let insights = analysis
            .map(|a| serde_json::to_string_pretty(&a.key_insights))
            .transpose()?
            .unwrap_or_default();
        let recommendations = analysis
            .map(|a| serde_json::to_string_pretty(&a.recommendations))
            .transpose()?
            .unwrap_or_default();

        let user_prompt = format!(
            "基于以下信息进行战略评估：\n\n\
             原始问题: {}\n\n分析综述: {}\n\n关键洞察: {}\n\n已有建议: {}\n\n\
             评估需覆盖：当前态势分析、关键机会、主要挑战或障碍、\
             战略优先事项、关键成功因素、竞争或环境因素。\n\
             以分节清晰的结构化JSON返回。",
            request.original_query, synthesis, insights, recommendations
        );

        let response = self.core.invoke_llm(Self::system_prompt(), &user_prompt).await?;
        Ok(LlmJson::from_response(&response))
    }

    /// 生成完整行动计划
    async fn generate_action_plan(
        &self,
        request: &ActionRequest,
    ) -> Result<LlmJson<Vec<PlannedAction>>> {
        let analysis = request.analysis_data.as_ref();
        let insights = analysis
            .map(|a| serde_json::to_string_pretty(&a.key_insights))
            .transpose()?
            .unwrap_or_default();
        let recommendations = analysis
            .map(|a| serde_json::to_string_pretty(&a.recommendations))
            .transpose()?
            .unwrap_or_default();

        let objectives_text = if request.objectives.is_empty() {
            "未指定".to_string()
        } else {
            request
                .objectives
                .iter()
                .map(|o| format!("- {}", o))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let constraints_text = if request.constraints.is_null() {
            "无".to_string()
        } else {
            serde_json::to_string_pretty(&request.constraints)?
        };

        let user_prompt = format!(
            "基于以下信息生成完整的行动计划：\n\n\
             关键洞察: {}\n\n建议: {}\n\n目标:\n{}\n\n约束: {}\n\n\
             生成5-8个具体行动，要求：回应关键洞察与建议、与目标一致、\
             考虑给定约束、具体可度量、有明确交付物。\n\
             每个行动包含字段: title(标题)、description(描述)、\
             type(research/analysis/implementation/communication/monitoring)、\
             priority(critical/high/medium/low)、estimated_effort(工作量)、\
             dependencies(依赖)、expected_outcomes(预期产出)、\
             success_criteria(成功标准)。\n\
             以JSON对象数组返回。",
            insights, recommendations, objectives_text, constraints_text
        );

        let response = self.core.invoke_llm(Self::system_prompt(), &user_prompt).await?;
        Ok(LlmJson::<PlannedAction>::from_list_response(&response))
    }

    /// 按优先级与紧迫性排序，保留前五项
    async fn prioritize_actions(
        &self,
        action_plan: &[PlannedAction],
    ) -> Result<Vec<PrioritizedAction>> {
        if action_plan.is_empty() {
            return Ok(Vec::new());
        }

        let mut prioritized = Vec::new();
        for action in action_plan {
            let priority = ActionPriority::parse_lenient(action.priority.as_deref().unwrap_or(""));
            let urgency_assessment = self.assess_action_urgency(action).await?;

            prioritized.push(PrioritizedAction {
                action: action.clone(),
                priority_score: priority.score(),
                urgency_assessment,
            });
        }

        prioritized.sort_by(|a, b| {
            (b.priority_score, b.urgency_score())
                .partial_cmp(&(a.priority_score, a.urgency_score()))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        prioritized.truncate(TOP_PRIORITY_ACTIONS);

        Ok(prioritized)
    }

    /// 评估单个行动的紧迫性
    async fn assess_action_urgency(
        &self,
        action: &PlannedAction,
    ) -> Result<LlmJson<UrgencyAssessment>> {
        let user_prompt = format!(
            "评估该行动的紧迫性：\n\n{}\n\n\
             考虑：时间敏感性、对其它行动的依赖、外部截止时间、\
             延误风险、对整体成功的影响。\n\
             返回JSON，包含字段: urgency_level(immediate/soon/moderate/flexible)、\
             urgency_score(1-10的数字)、factors(关键因素数组)。",
            serde_json::to_string_pretty(action)?
        );

        let response = self.core.invoke_llm(Self::system_prompt(), &user_prompt).await?;
        Ok(LlmJson::from_response(&response))
    }

    /// 制定分阶段实施路线图
    async fn create_implementation_roadmap(
        &self,
        priority_actions: &[PrioritizedAction],
    ) -> Result<LlmJson<Value>> {
        if priority_actions.is_empty() {
            return Ok(LlmJson::Parsed(
                json!({"phases": [], "timeline": "Not determined"}),
            ));
        }

        let user_prompt = format!(
            "为以下优先行动制定实施路线图：\n\n{}\n\n\
             组织原则：考虑行动间依赖、资源需求、合理顺序、风险管理、\
             速赢与长期举措的平衡。\n\
             给出：实施阶段（最多3-4个）、各阶段时间估计、并行与串行安排、\
             关键里程碑、关键路径。\n\
             以结构化JSON返回。",
            serde_json::to_string_pretty(priority_actions)?
        );

        let response = self.core.invoke_llm(Self::system_prompt(), &user_prompt).await?;
        Ok(LlmJson::from_response(&response))
    }

    /// 定义成功指标
    async fn define_success_metrics(
        &self,
        request: &ActionRequest,
        action_plan: &[PlannedAction],
    ) -> Result<LlmJson<Vec<SuccessMetric>>> {
        let objectives_text = if request.objectives.is_empty() {
            "总体成功".to_string()
        } else {
            request
                .objectives
                .iter()
                .map(|o| format!("- {}", o))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let actions_summary = action_plan
            .iter()
            .map(|a| format!("- {}", a.title))
            .collect::<Vec<_>>()
            .join("\n");

        let user_prompt = format!(
            "为该项工作定义成功指标：\n\n\
             原始问题: {}\n\n目标:\n{}\n\n计划行动:\n{}\n\n\
             定义3-5个指标，要求：具体可度量、与目标一致、现实可达、\
             有时间约束、与结果相关。\n\
             每个指标包含字段: name(名称)、description(描述)、\
             measurement(度量方法)、target(目标值)、timeline(达成时间)、\
             importance(critical/important/nice-to-have)。\n\
             以JSON数组返回。",
            request.original_query, objectives_text, actions_summary
        );

        let response = self.core.invoke_llm(Self::system_prompt(), &user_prompt).await?;
        Ok(LlmJson::<SuccessMetric>::from_list_response(&response))
    }

    /// 风险评估
    async fn assess_risks(
        &self,
        action_plan: &[PlannedAction],
        constraints: &Value,
    ) -> Result<LlmJson<Value>> {
        let user_prompt = format!(
            "评估该行动计划的风险：\n\n行动: {}\n\n约束: {}\n\n\
             识别并分析：实施风险、资源风险、时间风险、质量风险、外部风险。\n\
             每类风险给出：风险描述、概率(High/Medium/Low)、影响(High/Medium/Low)、\
             缓解策略、应急预案。\n\
             以结构化JSON返回。",
            serde_json::to_string_pretty(action_plan)?,
            serde_json::to_string_pretty(constraints)?
        );

        let response = self.core.invoke_llm(Self::system_prompt(), &user_prompt).await?;
        Ok(LlmJson::from_response(&response))
    }

    /// 资源需求分析
    async fn determine_resource_requirements(
        &self,
        action_plan: &[PlannedAction],
    ) -> Result<LlmJson<Value>> {
        let user_prompt = format!(
            "分析实施这些行动所需的资源：\n\n{}\n\n\
             覆盖：人力资源（角色、技能、时间）、技术资源（工具、系统、基础设施）、\
             资金资源（预算估计）、信息资源（数据、研究、专业知识）、\
             外部资源（供应商、顾问、合作方）。\n\
             给出带估算的结构化拆解，以JSON返回。",
            serde_json::to_string_pretty(action_plan)?
        );

        let response = self.core.invoke_llm(Self::system_prompt(), &user_prompt).await?;
        Ok(LlmJson::from_response(&response))
    }

    /// 生成最终战略建议
    async fn generate_final_recommendations(&self, report: &ActionReport) -> Result<Vec<String>> {
        let context = json!({
            "strategic_assessment": report.strategic_assessment,
            "top_actions": report.priority_actions.iter().take(3).collect::<Vec<_>>(),
            "key_risks": report.risk_assessment,
        });

        let user_prompt = format!(
            "基于这份分析生成最终战略建议：\n\n{}\n\n\
             给出3-5条最终建议，要求：综合所有分析与规划、聚焦最高影响的行动、\
             应对关键风险与约束、可执行且具体、与战略目标一致。\n\
             每条建议简明而完整，以列表项形式逐条给出。",
            serde_json::to_string_pretty(&context)?
        );

        let response = self.core.invoke_llm(Self::system_prompt(), &user_prompt).await?;
        Ok(parse_bullet_lines(&response, 20, 5))
    }

    /// 从排序后的优先行动生成即刻执行的下一步
    fn define_next_steps(priority_actions: &[PrioritizedAction]) -> Vec<NextStep> {
        priority_actions
            .iter()
            .take(NEXT_STEP_COUNT)
            .enumerate()
            .map(|(i, prioritized)| {
                let action = &prioritized.action;
                NextStep {
                    step: i + 1,
                    action: action.title.clone(),
                    description: truncate_chars(action.description.as_deref().unwrap_or(""), 200),
                    timeline: if i == 0 {
                        "Immediate".to_string()
                    } else {
                        format!("{} days", (i + 1) * 7)
                    },
                    responsible: "Implementation team".to_string(),
                    deliverable: action
                        .first_outcome()
                        .unwrap_or_else(|| "Completed action".to_string()),
                }
            })
            .collect()
    }

    /// 执行就绪评分（0-100）
    ///
    /// 加权构成：行动计划完整度最高30分（每个行动5分）、战略评估20分、
    /// 风险评估20分、成功指标最高15分（每个指标3分）、资源需求15分。
    fn calculate_execution_score(report: &ActionReport) -> u32 {
        let mut score = 0u32;

        let action_count = report.action_count() as u32;
        score += (action_count * 5).min(30);

        if Self::section_present(&report.strategic_assessment) {
            score += 20;
        }
        if Self::section_present(&report.risk_assessment) {
            score += 20;
        }

        let metric_count = report.metric_count() as u32;
        score += (metric_count * 3).min(15);

        if Self::section_present(&report.resource_requirements) {
            score += 15;
        }

        score.min(100)
    }

    /// 某个子结果是否有实际内容
    fn section_present(section: &LlmJson<Value>) -> bool {
        match section {
            LlmJson::Parsed(value) => !value.is_null(),
            LlmJson::Raw(text) => !text.trim().is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct UnreachableLlm;

    #[async_trait]
    impl LlmCollaborator for UnreachableLlm {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            panic!("边界路径不应调用LLM");
        }
    }

    #[tokio::test]
    async fn test_empty_inputs_fail_fast() {
        let agent = ActionAgent::new(&Config::default(), Arc::new(UnreachableLlm));
        let report = agent
            .process(&ActionRequest {
                analysis_data: None,
                research_data: None,
                original_query: "q".to_string(),
                constraints: Value::Null,
                objectives: vec![],
            })
            .await;

        assert_eq!(report.status, StepStatus::Failed);
        assert!(report.error.is_some());
    }

    #[test]
    fn test_priority_score_mapping() {
        assert_eq!(ActionPriority::parse_lenient("critical").score(), 4);
        assert_eq!(ActionPriority::parse_lenient("High").score(), 3);
        assert_eq!(ActionPriority::parse_lenient("medium").score(), 2);
        assert_eq!(ActionPriority::parse_lenient("low").score(), 1);
        // 无法识别的取medium
        assert_eq!(ActionPriority::parse_lenient("whatever").score(), 2);
    }

    fn empty_report() -> ActionReport {
        ActionReport::new("q")
    }

    #[test]
    fn test_execution_score_zero_when_nothing_present() {
        let report = empty_report();
        assert_eq!(ActionAgent::calculate_execution_score(&report), 0);
    }

    #[test]
    fn test_execution_score_full_weights() {
        let mut report = empty_report();
        report.action_plan = LlmJson::Parsed(
            (0..8)
                .map(|i| PlannedAction {
                    title: format!("action {}", i),
                    description: None,
                    action_type: None,
                    priority: None,
                    estimated_effort: None,
                    dependencies: None,
                    expected_outcomes: None,
                    success_criteria: None,
                })
                .collect(),
        );
        report.strategic_assessment = LlmJson::Parsed(json!({"ok": true}));
        report.risk_assessment = LlmJson::Parsed(json!({"risks": []}));
        report.success_metrics = LlmJson::Parsed(
            (0..6)
                .map(|i| SuccessMetric {
                    name: format!("metric {}", i),
                    description: None,
                    measurement: None,
                    target: None,
                    timeline: None,
                    importance: None,
                })
                .collect(),
        );
        report.resource_requirements = LlmJson::Parsed(json!({"people": 2}));

        // 30 + 20 + 20 + 15 + 15
        assert_eq!(ActionAgent::calculate_execution_score(&report), 100);
    }

    #[test]
    fn test_execution_score_partial_and_bounded() {
        let mut report = empty_report();
        report.action_plan = LlmJson::Parsed(vec![PlannedAction {
            title: "only".to_string(),
            description: None,
            action_type: None,
            priority: None,
            estimated_effort: None,
            dependencies: None,
            expected_outcomes: None,
            success_criteria: None,
        }]);
        report.risk_assessment = LlmJson::Raw("risk narrative".to_string());

        let score = ActionAgent::calculate_execution_score(&report);
        assert_eq!(score, 5 + 20);
        assert!(score <= 100);
    }

    #[test]
    fn test_execution_score_raw_plan_counts_as_one() {
        let mut report = empty_report();
        report.action_plan = LlmJson::Raw("unparsed plan text".to_string());
        assert_eq!(ActionAgent::calculate_execution_score(&report), 5);
    }

    #[test]
    fn test_next_steps_top_three_only() {
        let actions: Vec<PrioritizedAction> = (0..5)
            .map(|i| PrioritizedAction {
                action: PlannedAction {
                    title: format!("action {}", i),
                    description: Some("描述".repeat(200)),
                    action_type: None,
                    priority: Some("high".to_string()),
                    estimated_effort: None,
                    dependencies: None,
                    expected_outcomes: Some(json!(["deliverable"])),
                    success_criteria: None,
                },
                priority_score: 3,
                urgency_assessment: LlmJson::Raw(String::new()),
            })
            .collect();

        let steps = ActionAgent::define_next_steps(&actions);
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].timeline, "Immediate");
        assert_eq!(steps[1].timeline, "14 days");
        assert_eq!(steps[2].timeline, "21 days");
        assert_eq!(steps[0].deliverable, "deliverable");
        // 描述截断到200字符
        assert!(steps[0].description.chars().count() <= 200);
    }

    #[tokio::test]
    async fn test_prioritize_sorts_and_truncates() {
        struct UrgencyLlm;

        #[async_trait]
        impl LlmCollaborator for UrgencyLlm {
            async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
                Ok(r#"{"urgency_level": "soon", "urgency_score": 6, "factors": []}"#.to_string())
            }
        }

        let agent = ActionAgent::new(&Config::default(), Arc::new(UrgencyLlm));
        let plan: Vec<PlannedAction> = ["low", "critical", "medium", "high", "low", "critical",
            "medium"]
            .iter()
            .enumerate()
            .map(|(i, priority)| PlannedAction {
                title: format!("action {}", i),
                description: None,
                action_type: None,
                priority: Some(priority.to_string()),
                estimated_effort: None,
                dependencies: None,
                expected_outcomes: None,
                success_criteria: None,
            })
            .collect();

        let prioritized = agent.prioritize_actions(&plan).await.unwrap();

        assert_eq!(prioritized.len(), TOP_PRIORITY_ACTIONS);
        // 按priority_score降序排列
        let scores: Vec<u32> = prioritized.iter().map(|p| p.priority_score).collect();
        assert_eq!(scores, vec![4, 4, 3, 2, 2]);
    }
}
