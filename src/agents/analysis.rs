//! 分析智能体 - 从研究材料中提炼洞察、模式与综合叙述
//!
//! 当研究数据没有任何可用正文但带有查询时，走仅凭模型知识的兜底分析
//! 路径，并在置信度中显式标注数据来源，这是文档化的一等行为而非静默
//! 降级。

use anyhow::Result;
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::agents::AgentCore;
use crate::config::Config;
use crate::llm::LlmCollaborator;
use crate::types::LlmJson;
use crate::types::StepStatus;
use crate::types::analysis::{
    AnalysisInputSummary, AnalysisReport, AnalysisRequest, AnalysisType, ConfidenceScores, Insight,
    PatternFinding, Recommendation,
};
use crate::types::research::ResearchReport;
use crate::utils::text::{parse_bullet_lines, truncate_chars};

const CAPABILITIES: [&str; 7] = [
    "data_analysis",
    "pattern_recognition",
    "information_synthesis",
    "source_evaluation",
    "insight_extraction",
    "recommendation_generation",
    "confidence_assessment",
];

/// 分析智能体
pub struct AnalysisAgent {
    core: AgentCore,
}

impl AnalysisAgent {
    pub fn new(config: &Config, llm: Arc<dyn LlmCollaborator>) -> Self {
        let agent_config = &config.analysis_agent;
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
        "你是一名分析智能体，专长是处理、分析与综合信息。\n\
         你的能力包括：数据分析与模式识别、多来源信息综合、来源可信度评估、\n\
         趋势识别与洞察提炼、风险与机会评估。\n\
         要求：保持客观、全面、以证据为依据；明确区分事实、解读与假设；\n\
         指出不确定性与数据局限。"
    }

    /// 处理分析请求
    ///
    /// 任何内部错误都收敛为报告中的failed状态，不向外抛出。
    pub async fn process(&self, request: &AnalysisRequest) -> AnalysisReport {
        let analysis_type = request.analysis_type;

        let Some(research) = &request.research_data else {
            return AnalysisReport::failed(analysis_type, "没有可供分析的研究数据");
        };

        let query = research.query.trim();
        if !research.has_content() {
            if !query.is_empty() {
                println!("   🔄 无抓取内容，改用基于模型知识的分析路径");
                return self.analyze_from_query(query, analysis_type).await;
            }
            return AnalysisReport::failed(analysis_type, "研究数据中既无内容也无查询，无法分析");
        }

        let mut report = AnalysisReport::new(analysis_type);
        report.input_summary = Some(Self::summarize_input(research));

        if let Err(e) = self.run_pipeline(research, request, &mut report).await {
            report.status = StepStatus::Failed;
            report.error = Some(e.to_string());
        }
        report.timestamp = Utc::now();

        report
    }

    /// 完整分析流水线，按固定顺序执行各子步骤
    async fn run_pipeline(
        &self,
        research: &ResearchReport,
        request: &AnalysisRequest,
        report: &mut AnalysisReport,
    ) -> Result<()> {
        report.source_evaluation = self.evaluate_sources(research).await?;
        report.key_insights = self
            .extract_key_insights(research, &request.focus_areas)
            .await?;
        report.patterns_identified = self.identify_patterns(research).await?;
        report.synthesis = self
            .synthesize_information(research, request.analysis_type)
            .await?;
        let key_insights = report.key_insights.clone();
        report.recommendations = self.generate_recommendations(research, &key_insights).await?;
        report.confidence_scores = Self::assess_confidence(research);
        report.limitations = self.identify_limitations(research).await?;
        Ok(())
    }

    fn summarize_input(research: &ResearchReport) -> AnalysisInputSummary {
        AnalysisInputSummary {
            query: research.query.clone(),
            sources_count: research.sources_researched.len(),
            content_items: research.content_gathered.len(),
            search_results_count: research.search_results.len(),
            has_recommendations: !research.recommendations.is_empty(),
        }
    }

    /// 评估来源可信度与可靠性
    async fn evaluate_sources(&self, research: &ResearchReport) -> Result<LlmJson<Value>> {
        if research.sources_researched.is_empty() && research.content_gathered.is_empty() {
            return Ok(LlmJson::Parsed(json!({"evaluation": "没有可评估的来源"})));
        }

        let overview: Vec<Value> = research
            .content_gathered
            .iter()
            .map(|item| {
                json!({
                    "url": item.url(),
                    "type": match item {
                        crate::types::research::GatheredContent::Scraped { .. } => "scraped",
                        crate::types::research::GatheredContent::Fetched { .. } => "fetched",
                        crate::types::research::GatheredContent::Error { .. } => "error",
                    },
                    "title": item.title().map(|t| truncate_chars(t, 100)).unwrap_or_default(),
                })
            })
            .collect();

        let user_prompt = format!(
            "评估以下来源的可信度、可靠性与潜在偏见：\n\n\
             来源列表: {}\n\n\
             采集概览: {}\n\n\
             对每个来源给出：可信度等级(High/Medium/Low)、偏见迹象、\
             来源类型(academic/news/blog/official等)、可靠性因素、风险提示。\n\
             以结构化JSON返回。",
            serde_json::to_string_pretty(&research.sources_researched)?,
            serde_json::to_string_pretty(&overview)?
        );

        let response = self.core.invoke_llm(Self::system_prompt(), &user_prompt).await?;
        Ok(LlmJson::from_response(&response))
    }

    /// 提炼关键洞察
    async fn extract_key_insights(
        &self,
        research: &ResearchReport,
        focus_areas: &[String],
    ) -> Result<LlmJson<Vec<Insight>>> {
        let content_text = Self::extract_content_text(research);
        let focus_instruction = if focus_areas.is_empty() {
            String::new()
        } else {
            format!("\n请特别关注以下领域: {}", focus_areas.join(", "))
        };

        let user_prompt = format!(
            "分析以下研究内容并提炼关键洞察：\n\n\
             研究问题: {}\n\n内容:\n{}\n{}\n\n\
             提炼5-7条关键洞察，要求：与研究问题直接相关、代表重要发现、\
             有内容证据支撑、可转化为行动、能反映显著趋势。\n\
             每条洞察包含字段: insight(洞察陈述)、evidence(支撑证据)、\
             confidence(High/Medium/Low)、relevance(1-10的数字)。\n\
             以JSON对象数组返回。",
            research.query, content_text, focus_instruction
        );

        let response = self.core.invoke_llm(Self::system_prompt(), &user_prompt).await?;
        Ok(LlmJson::<Insight>::from_list_response(&response))
    }

    /// 识别模式与趋势
    async fn identify_patterns(
        &self,
        research: &ResearchReport,
    ) -> Result<LlmJson<Vec<PatternFinding>>> {
        let content_text = Self::extract_content_text(research);

        let user_prompt = format!(
            "分析以下内容，识别其中的模式、趋势与关联：\n\n{}\n\n\
             关注：反复出现的主题、随时间的变化趋势、数据间的相关性、\
             相互矛盾的信息、数据缺口、因果关系。\n\
             每个模式包含字段: pattern(模式描述)、evidence(证据或示例)、\
             strength(Strong/Moderate/Weak)、implications(影响或意义)。\n\
             以JSON数组返回。",
            content_text
        );

        let response = self.core.invoke_llm(Self::system_prompt(), &user_prompt).await?;
        Ok(LlmJson::<PatternFinding>::from_list_response(&response))
    }

    /// 按指定风格综合所有信息
    async fn synthesize_information(
        &self,
        research: &ResearchReport,
        analysis_type: AnalysisType,
    ) -> Result<String> {
        let content_text = Self::extract_content_text(research);

        let user_prompt = format!(
            "将以下研究信息综合为一份连贯的分析：\n\n\
             研究问题: {}\n\n研究摘要: {}\n\n内容: {}\n\n\
             分析风格: {}\n风格要求: {}\n\n\
             综合分析需要：整合所有来源的信息、回应原始研究问题、\
             按逻辑顺序呈现发现、区分确认的事实与推断、\
             承认不确定性与局限、得出有意义的结论。\n\
             使用清晰的标题分节。",
            research.query,
            research.summary,
            content_text,
            analysis_type,
            analysis_type.instruction()
        );

        self.core.invoke_llm(Self::system_prompt(), &user_prompt).await
    }

    /// 基于洞察生成行动建议
    async fn generate_recommendations(
        &self,
        research: &ResearchReport,
        key_insights: &LlmJson<Vec<Insight>>,
    ) -> Result<LlmJson<Vec<Recommendation>>> {
        let user_prompt = format!(
            "基于研究分析与关键洞察，生成可执行的建议：\n\n\
             研究问题: {}\n\n关键洞察: {}\n\n\
             生成3-5条具体可执行的建议，要求：回应研究问题、\
             有分析证据支撑、切实可行、有明确的预期效果、考虑潜在风险。\n\
             每条建议包含字段: recommendation(建议陈述)、rationale(理由)、\
             impact(High/Medium/Low)、difficulty(Easy/Medium/Hard)、\
             risk(Low/Medium/High)、timeline(实施时间)。\n\
             以JSON数组返回。",
            research.query,
            serde_json::to_string_pretty(key_insights)?
        );

        let response = self.core.invoke_llm(Self::system_prompt(), &user_prompt).await?;
        Ok(LlmJson::<Recommendation>::from_list_response(&response))
    }

    /// 本地启发式置信度评估
    fn assess_confidence(research: &ResearchReport) -> ConfidenceScores {
        let source_count = research.sources_researched.len();
        let content_count = research.content_gathered.len();

        let overall_confidence = if source_count >= 3 && content_count >= 3 {
            "high"
        } else if source_count >= 2 || content_count >= 2 {
            "medium"
        } else {
            "low"
        };

        let error_count = research.error_count();
        let source_reliability = if error_count == 0 && content_count > 0 {
            "high"
        } else if error_count < content_count.div_ceil(2) {
            "medium"
        } else {
            "low"
        };

        let completeness_score = [
            !research.content_gathered.is_empty(),
            !research.summary.is_empty(),
            !research.search_results.is_empty(),
        ]
        .iter()
        .filter(|present| **present)
        .count();
        let data_completeness = match completeness_score {
            3 => "high",
            2 => "medium",
            _ => "low",
        };

        ConfidenceScores {
            overall_confidence: overall_confidence.to_string(),
            source_reliability: source_reliability.to_string(),
            data_completeness: data_completeness.to_string(),
            analysis_depth: "medium".to_string(),
            note: None,
        }
    }

    /// 识别研究与分析的局限性，本地规则与模型判断各出一部分
    async fn identify_limitations(&self, research: &ResearchReport) -> Result<Vec<String>> {
        let mut limitations = Vec::new();

        let source_count = research.sources_researched.len();
        if source_count < 3 {
            limitations.push(format!("Limited number of sources ({})", source_count));
        }
        let error_count = research.error_count();
        if error_count > 0 {
            limitations.push(format!("Failed to access {} sources", error_count));
        }
        if research.search_results.is_empty() {
            limitations.push("No historical data search performed".to_string());
        }

        let content_sample = truncate_chars(&Self::extract_content_text(research), 1000);
        let user_prompt = format!(
            "指出这项研究分析可能存在的局限：\n\n\
             研究问题: {}\n内容样本: {}\n来源数量: {}\n\n\
             从数据质量、范围、偏见、时效、方法论等角度，\
             简明列出2-3条关键局限。",
            research.query, content_sample, source_count
        );

        let response = self.core.invoke_llm(Self::system_prompt(), &user_prompt).await?;
        limitations.extend(parse_bullet_lines(&response, 10, 5));
        limitations.truncate(5);

        Ok(limitations)
    }

    /// 无抓取内容时的兜底路径：仅凭模型知识完成分析
    async fn analyze_from_query(&self, query: &str, analysis_type: AnalysisType) -> AnalysisReport {
        let user_prompt = format!(
            "基于你的知识分析以下问题并给出洞察: \"{}\"\n\n\
             请提供：\n\
             1. 关键洞察（3-5条）\n\
             2. 当前趋势与模式\n\
             3. 重要注意事项\n\
             4. 行动建议\n\
             5. 每条洞察的置信度(high/medium/low)\n\n\
             聚焦事实性信息，同时说明知识截止时间带来的局限。\n\
             洞察部分以“关键洞察:”开头，建议部分以“行动建议:”开头，\
             每条内容单独成行并使用列表项。",
            query
        );

        let response = match self.core.invoke_llm(Self::system_prompt(), &user_prompt).await {
            Ok(response) => response,
            Err(e) => {
                return AnalysisReport::failed(analysis_type, format!("兜底分析失败: {}", e));
            }
        };

        let insights = Self::parse_section_items(&response, &["洞察", "insight"], &["建议", "recommendation"]);
        let recommendations =
            Self::parse_section_items(&response, &["建议", "recommendation"], &[]);

        let mut report = AnalysisReport::new(analysis_type);
        report.input_summary = Some(AnalysisInputSummary {
            query: query.to_string(),
            sources_count: 0,
            content_items: 0,
            search_results_count: 0,
            has_recommendations: false,
        });
        report.key_insights = LlmJson::Parsed(
            insights
                .into_iter()
                .map(|insight| Insight {
                    insight,
                    evidence: None,
                    confidence: None,
                    relevance: None,
                })
                .collect(),
        );
        report.patterns_identified = LlmJson::Parsed(vec![PatternFinding {
            pattern: "Knowledge-based analysis due to limited scraped data".to_string(),
            evidence: None,
            strength: None,
            implications: None,
        }]);
        report.source_evaluation =
            LlmJson::Parsed(json!({"method": "LLM knowledge", "reliability": "medium"}));
        report.synthesis = response;
        report.recommendations = LlmJson::Parsed(
            recommendations
                .into_iter()
                .map(|recommendation| Recommendation {
                    recommendation,
                    rationale: None,
                    impact: None,
                    difficulty: None,
                    risk: None,
                    timeline: None,
                })
                .collect(),
        );
        report.confidence_scores = ConfidenceScores {
            overall_confidence: "medium".to_string(),
            source_reliability: "medium".to_string(),
            data_completeness: "low".to_string(),
            analysis_depth: "medium".to_string(),
            note: Some("Based on training data knowledge".to_string()),
        };
        report.limitations = vec![
            "Limited to training data".to_string(),
            "No real-time web data".to_string(),
            "Cannot verify current status".to_string(),
        ];
        report.timestamp = Utc::now();

        report
    }

    /// 从分节文本中提取某一节的列表项
    ///
    /// 找到包含任一起始关键词且带冒号的标题行后开始收集列表项，
    /// 遇到包含终止关键词的标题行停止。
    fn parse_section_items(text: &str, start_keys: &[&str], stop_keys: &[&str]) -> Vec<String> {
        let mut in_section = false;
        let mut collected = String::new();

        for line in text.lines() {
            let line = line.trim();
            let lower = line.to_lowercase();
            let is_header = line.contains(':') || line.contains('：');

            if is_header && start_keys.iter().any(|key| lower.contains(key)) {
                in_section = true;
                continue;
            }
            if in_section && is_header && stop_keys.iter().any(|key| lower.contains(key)) {
                break;
            }
            if in_section && !line.is_empty() {
                collected.push_str(line);
                collected.push('\n');
            }
        }

        parse_bullet_lines(&collected, usize::MAX, 5)
    }

    /// 把研究数据拼接为分析用的正文文本
    fn extract_content_text(research: &ResearchReport) -> String {
        let mut parts = Vec::new();

        if !research.summary.is_empty() {
            parts.push(format!("SUMMARY:\n{}", research.summary));
        }

        for item in &research.content_gathered {
            if let Some(content) = item.content_text() {
                if content.is_empty() {
                    continue;
                }
                let mut block = format!("SOURCE ({}):\n", item.url());
                if let Some(title) = item.title() {
                    block.push_str(&format!("Title: {}\n", title));
                }
                block.push_str(content);
                parts.push(block);
            }
        }

        parts.join("\n\n---\n\n")
    }
}
