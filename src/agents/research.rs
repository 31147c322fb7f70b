//! 研究智能体 - 通过MCP协作方采集信息并生成研究摘要

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::agents::AgentCore;
use crate::cache::ResultCache;
use crate::config::Config;
use crate::llm::LlmCollaborator;
use crate::mcp::{McpCollaborator, McpError, search_stored_data};
use crate::types::StepStatus;
use crate::types::research::{GatheredContent, ResearchReport, ResearchRequest, TermSearchResult};
use crate::utils::text::{parse_bullet_lines, truncate_chars};

/// 每个来源进入提示词的字符预算，约束提示词规模
const CONTENT_CHAR_BUDGET: usize = 2000;

/// 摘要提示词中单个来源的正文截断长度
const SUMMARY_SNIPPET_CHARS: usize = 500;

/// 每个检索词在单张表上的命中上限
const SEARCH_LIMIT: usize = 3;

const CAPABILITIES: [&str; 6] = [
    "web_content_fetching",
    "web_scraping",
    "data_search",
    "source_validation",
    "research_synthesis",
    "mcp_integration",
];

/// 判断URL应当抓取解析（网页）还是原样获取（数据文件）
///
/// 内容型站点前缀、网页扩展名，以及末段不含点号的HTTP(S)路径走抓取；
/// 其余一律原样获取。
pub fn should_scrape(url: &str) -> bool {
    let rest = if let Some(rest) = url.strip_prefix("https://") {
        rest
    } else if let Some(rest) = url.strip_prefix("http://") {
        rest
    } else {
        return false;
    };

    let (host, path) = match rest.find('/') {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, ""),
    };

    const WEB_HOST_PREFIXES: [&str; 4] = ["www.", "blog.", "news.", "article."];
    const WEB_EXTENSIONS: [&str; 5] = [".html", ".htm", ".php", ".asp", ".aspx"];

    if WEB_HOST_PREFIXES
        .iter()
        .any(|prefix| host.starts_with(prefix))
    {
        return true;
    }

    let path = path.split(['?', '#']).next().unwrap_or("");
    if WEB_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return true;
    }

    let last_segment = path.rsplit('/').next().unwrap_or("");
    !last_segment.contains('.')
}

/// 研究智能体
pub struct ResearchAgent {
    core: AgentCore,
    mcp: Arc<dyn McpCollaborator>,
    research_cache: Mutex<ResultCache>,
}

impl ResearchAgent {
    pub fn new(
        config: &Config,
        llm: Arc<dyn LlmCollaborator>,
        mcp: Arc<dyn McpCollaborator>,
    ) -> Self {
        let agent_config = &config.research_agent;
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
            mcp,
            research_cache: Mutex::new(ResultCache::new(config.cache.clone())),
        }
    }

    pub fn core(&self) -> &AgentCore {
        &self.core
    }

    fn system_prompt() -> &'static str {
        "你是一名研究智能体，专长是从多种来源采集并组织信息。\n\
         你的能力包括：获取URL内容、抓取并解析网页、检索已收集的数据、\n\
         评估来源可靠性、整理研究发现。\n\
         要求：全面而高效，优先选择高质量的相关来源，所有信息注明出处。"
    }

    /// 处理研究请求
    ///
    /// 任何内部错误都收敛为报告中的failed状态，不向外抛出。
    pub async fn process(&self, request: &ResearchRequest) -> ResearchReport {
        let query = request.query.trim();

        if query.is_empty() && request.urls.is_empty() && request.search_terms.is_empty() {
            return ResearchReport::failed(&request.query, "未提供研究问题、URL或检索词");
        }

        // 相同请求命中缓存直接复用；失败结果从不入缓存，重试语义不受影响
        let cache_key = Self::cache_key(query, &request.urls);
        if let Some(cached) = self
            .research_cache
            .lock()
            .await
            .get::<ResearchReport>(&cache_key)
        {
            println!("   📦 命中研究缓存，复用已有结果");
            return cached;
        }

        let mut report = ResearchReport::new(&request.query);
        if let Err(e) = self.gather(request, &mut report).await {
            report.status = StepStatus::Failed;
            report.error = Some(e.to_string());
        }

        // URL全部失败且检索无命中时视为协作方故障
        if report.status == StepStatus::Completed
            && !request.urls.is_empty()
            && report.sources_researched.is_empty()
            && report.search_results.iter().all(|r| r.hit_count() == 0)
        {
            report.error = Some(format!("全部 {} 个URL均抓取失败", report.error_count()));
            report.status = StepStatus::Failed;
        }

        if report.status == StepStatus::Completed
            && let Err(e) = self.research_cache.lock().await.set(&cache_key, &report)
        {
            eprintln!("⚠️ 写入研究缓存失败: {}", e);
        }

        report
    }

    fn cache_key(query: &str, urls: &[String]) -> String {
        format!("{}::{}", query, urls.join(","))
    }

    /// 执行采集流程：健康检查、历史检索、URL抓取、建议与摘要
    async fn gather(&self, request: &ResearchRequest, report: &mut ResearchReport) -> Result<()> {
        let query = request.query.trim();

        self.mcp.health_check().await?;

        // 1. 先在已存数据中检索（检索词不去重）
        for term in &request.search_terms {
            let (fetched, scraped) =
                search_stored_data(self.mcp.as_ref(), term, SEARCH_LIMIT).await?;
            report.search_results.push(TermSearchResult {
                term: term.clone(),
                fetched,
                scraped,
            });
        }

        // 2. 逐个抓取URL，单个失败不影响其余来源
        for url in request.urls.iter().take(request.max_sources) {
            match self.gather_url(url).await {
                Ok(content) => {
                    report.content_gathered.push(content);
                    report.sources_researched.push(url.clone());
                }
                Err(e) => {
                    report.content_gathered.push(GatheredContent::Error {
                        url: url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        // 3. 只有查询没有URL时，给出研究方向建议
        if !query.is_empty() && request.urls.is_empty() {
            report.recommendations = self.generate_research_suggestions(query).await?;
        }

        // 4. 无论采集结果如何都生成研究摘要
        report.summary = self.generate_research_summary(query, report).await?;

        Ok(())
    }

    async fn gather_url(&self, url: &str) -> Result<GatheredContent, McpError> {
        if should_scrape(url) {
            let scraped = self.mcp.scrape_url(url, None, true, true).await?;
            Ok(GatheredContent::Scraped {
                url: url.to_string(),
                title: scraped.title,
                content: truncate_chars(&scraped.content, CONTENT_CHAR_BUDGET),
                extracted_data: scraped.extracted_data,
            })
        } else {
            let fetched = self.mcp.fetch_url(url, None, 30).await?;
            Ok(GatheredContent::Fetched {
                url: url.to_string(),
                content: truncate_chars(&fetched.content, CONTENT_CHAR_BUDGET),
            })
        }
    }

    /// 为查询生成研究方向建议
    async fn generate_research_suggestions(&self, query: &str) -> Result<Vec<String>> {
        let user_prompt = format!(
            "针对研究问题：\"{}\"\n\n\
             请给出5条具体且可执行的研究方向或信息来源建议，重点考虑：\n\
             1. 可靠的一手来源\n\
             2. 学术或权威出版物\n\
             3. 近期数据或研究\n\
             4. 该主题的不同视角\n\
             5. 实际案例\n\n\
             每条建议单独一行，以列表项形式给出。",
            query
        );

        let response = self.core.invoke_llm(Self::system_prompt(), &user_prompt).await?;
        Ok(parse_bullet_lines(&response, 20, 5))
    }

    /// 综合所有采集内容生成研究摘要
    async fn generate_research_summary(
        &self,
        query: &str,
        report: &ResearchReport,
    ) -> Result<String> {
        let mut content_summary = Vec::new();
        for item in &report.content_gathered {
            match item {
                GatheredContent::Scraped {
                    url,
                    title,
                    content,
                    ..
                } => {
                    content_summary.push(format!(
                        "来源 {}:\n标题: {}\n内容: {}...",
                        url,
                        title,
                        truncate_chars(content, SUMMARY_SNIPPET_CHARS)
                    ));
                }
                GatheredContent::Fetched { url, content } => {
                    content_summary.push(format!(
                        "来源 {}:\n内容: {}...",
                        url,
                        truncate_chars(content, SUMMARY_SNIPPET_CHARS)
                    ));
                }
                GatheredContent::Error { .. } => {}
            }
        }

        let search_summary: Vec<String> = report
            .search_results
            .iter()
            .map(|result| format!("检索 '{}' 命中 {} 条结果", result.term, result.hit_count()))
            .collect();

        let user_prompt = format!(
            "研究问题: {}\n\n采集内容:\n{}\n\n检索结果:\n{}\n\n\
             请给出一份完整的研究摘要，要求：\n\
             1. 直接回应研究问题\n\
             2. 综合所有来源的信息\n\
             3. 突出关键发现与洞察\n\
             4. 指出研究中的空白或局限\n\
             5. 注明信息出处\n\n\
             以清晰分节的结构呈现。",
            query,
            content_summary.join("\n\n"),
            search_summary.join("\n")
        );

        self.core.invoke_llm(Self::system_prompt(), &user_prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_host_is_scraped() {
        assert!(should_scrape("https://blog.example.com/post"));
    }

    #[test]
    fn test_data_file_is_fetched() {
        assert!(!should_scrape("https://cdn.example.com/data.json"));
    }

    #[test]
    fn test_www_host_is_scraped() {
        assert!(should_scrape("https://www.example.com/about/team"));
    }

    #[test]
    fn test_html_extension_is_scraped() {
        assert!(should_scrape("https://cdn.example.com/page.html"));
        assert!(should_scrape("http://site.example.org/index.php"));
    }

    #[test]
    fn test_extensionless_path_is_scraped() {
        assert!(should_scrape("https://api-docs.example.com/guides/intro"));
        assert!(should_scrape("http://example.com"));
    }

    #[test]
    fn test_non_http_scheme_is_fetched() {
        assert!(!should_scrape("ftp://example.com/file"));
    }

    #[test]
    fn test_query_string_ignored_for_extension() {
        assert!(should_scrape("https://cdn.example.com/page.html?ref=1"));
        assert!(!should_scrape("https://cdn.example.com/archive.zip?token=x"));
    }

    #[test]
    fn test_cache_key_depends_on_query_and_urls() {
        let key_a = ResearchAgent::cache_key("q", &["http://a".to_string()]);
        let key_b = ResearchAgent::cache_key("q", &["http://b".to_string()]);
        let key_c = ResearchAgent::cache_key("q2", &["http://a".to_string()]);
        assert_ne!(key_a, key_b);
        assert_ne!(key_a, key_c);
    }
}
