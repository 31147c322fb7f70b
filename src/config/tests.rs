#[cfg(test)]
mod tests {
    use crate::config::{Config, LLMProvider};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, LLMProvider::OpenAI);
        assert_eq!(config.mcp.base_url, "http://localhost:8000");
        assert_eq!(config.mcp.timeout_seconds, 30);
        assert_eq!(config.orchestrator.max_retries, 2);
        assert!(config.cache.enabled);
        assert!(!config.verbose);
    }

    #[test]
    fn test_per_agent_temperature_defaults() {
        let config = Config::default();

        // 研究/分析/行动各自的默认温度
        assert_eq!(config.research_agent.temperature, 0.3);
        assert_eq!(config.analysis_agent.temperature, 0.5);
        assert_eq!(config.action_agent.temperature, 0.4);
    }

    #[test]
    fn test_agent_config_lookup() {
        let config = Config::default();

        assert_eq!(
            config.agent_config("research").map(|a| a.name.as_str()),
            Some("Research Agent")
        );
        assert_eq!(
            config.agent_config("ACTION").map(|a| a.name.as_str()),
            Some("Action Agent")
        );
        assert!(config.agent_config("unknown").is_none());
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("openai".parse::<LLMProvider>(), Ok(LLMProvider::OpenAI));
        assert_eq!("DeepSeek".parse::<LLMProvider>(), Ok(LLMProvider::DeepSeek));
        assert!("nonexistent".parse::<LLMProvider>().is_err());
    }

    #[test]
    fn test_provider_display_roundtrip() {
        for provider in [
            LLMProvider::OpenAI,
            LLMProvider::Anthropic,
            LLMProvider::Ollama,
        ] {
            let parsed: LLMProvider = provider.to_string().parse().unwrap();
            assert_eq!(parsed, provider);
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
verbose = true

[llm]
provider = "deepseek"
api_key = "test-key"
model = "deepseek-chat"

[mcp]
base_url = "http://mcp.internal:9000"

[orchestrator]
max_retries = 4

[research_agent]
name = "Research Agent"
temperature = 0.2
"#
        )
        .unwrap();

        let config = Config::from_file(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.llm.provider, LLMProvider::DeepSeek);
        assert_eq!(config.llm.api_key, "test-key");
        assert_eq!(config.llm.model, "deepseek-chat");
        assert_eq!(config.mcp.base_url, "http://mcp.internal:9000");
        assert_eq!(config.orchestrator.max_retries, 4);
        assert_eq!(config.research_agent.temperature, 0.2);
        assert!(config.verbose);
        // 文件未提供的段落保持默认值
        assert_eq!(config.analysis_agent.temperature, 0.5);
        assert_eq!(config.cache.capacity, 128);
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file(&std::path::PathBuf::from("/nonexistent/triad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_reports_missing_key() {
        let mut config = Config::default();
        config.llm.api_key = String::new();

        let issues = config.validate();
        assert!(!issues.is_ok());
        assert!(issues.errors.iter().any(|e| e.contains("API key")));
    }

    #[test]
    fn test_validate_bad_mcp_url() {
        let mut config = Config::default();
        config.llm.api_key = "sk-test".to_string();
        config.mcp.base_url = "localhost:8000".to_string();

        let issues = config.validate();
        assert!(issues.errors.iter().any(|e| e.contains("MCP server URL")));
    }

    #[test]
    fn test_validate_temperature_warning() {
        let mut config = Config::default();
        config.llm.api_key = "sk-test".to_string();
        config.action_agent.temperature = 3.5;

        let issues = config.validate();
        assert!(issues.is_ok());
        assert!(issues.warnings.iter().any(|w| w.contains("temperature")));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let text = config.to_toml_string().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.mcp.base_url, config.mcp.base_url);
        assert_eq!(parsed.orchestrator.max_retries, config.orchestrator.max_retries);
    }
}
