use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::orchestrator::Orchestrator;
use crate::types::workflow::UserInput;

/// Triad-RS - 由Rust与AI驱动的多智能体编排引擎
#[derive(Parser, Debug)]
#[command(name = "triad-rs")]
#[command(
    about = "Multi-agent orchestration engine. It coordinates Research, Analysis and Action agents through a deterministic workflow graph to turn a single query into insights, recommendations and a prioritized action plan."
)]
#[command(author = "Sopaco")]
#[command(version)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 执行一次多智能体工作流
    Execute {
        /// 研究问题
        query: String,

        /// 要采集的URL，可多次指定
        #[arg(long = "url")]
        urls: Vec<String>,

        /// 在已存数据中检索的关键词，可多次指定
        #[arg(long = "search")]
        search_terms: Vec<String>,

        /// URL采集数量上限
        #[arg(long, default_value_t = 5)]
        max_sources: usize,

        /// 分析风格 (comprehensive, executive, technical, comparative, critical)
        #[arg(long = "analysis", default_value = "comprehensive")]
        analysis_type: String,

        /// 分析重点领域，可多次指定
        #[arg(long = "focus")]
        focus_areas: Vec<String>,

        /// 行动目标，可多次指定
        #[arg(long = "objective")]
        objectives: Vec<String>,

        /// 结果输出文件，缺省打印到标准输出
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 检查编排器与各协作方的健康状况
    Health,

    /// 管理配置文件
    Config {
        /// 在当前目录生成默认配置文件
        #[arg(long)]
        create: bool,

        /// 校验当前配置并输出问题列表
        #[arg(long)]
        validate: bool,

        /// 显示当前生效的配置
        #[arg(long)]
        show: bool,
    },
}

/// 默认配置文件名
const DEFAULT_CONFIG_FILE: &str = "triad.toml";

impl Args {
    /// 加载配置：显式指定的路径优先，其次是当前目录的triad.toml，
    /// 最后退回默认值；CLI开关覆盖文件中的设置
    pub fn load_config(&self) -> Result<Config> {
        let mut config = if let Some(config_path) = &self.config {
            Config::from_file(config_path)?
        } else {
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_CONFIG_FILE);

            if default_config_path.exists() {
                Config::from_file(&default_config_path)?
            } else {
                Config::default()
            }
        };

        if self.verbose {
            config.verbose = true;
        }

        Ok(config)
    }
}

/// CLI入口：装配配置并分发子命令
pub async fn run(args: Args) -> Result<()> {
    let config = args.load_config()?;

    match &args.command {
        Commands::Execute {
            query,
            urls,
            search_terms,
            max_sources,
            analysis_type,
            focus_areas,
            objectives,
            output,
        } => {
            let analysis_type = match analysis_type.parse() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!(
                        "⚠️ 警告: 未知的分析风格: {}，使用默认风格 (comprehensive)",
                        analysis_type
                    );
                    Default::default()
                }
            };

            let user_input = UserInput {
                urls: urls.clone(),
                search_terms: search_terms.clone(),
                max_sources: *max_sources,
                analysis_type,
                focus_areas: focus_areas.clone(),
                objectives: objectives.clone(),
                ..Default::default()
            };

            let orchestrator = Orchestrator::new(&config)?;
            let result = orchestrator.execute(query, user_input).await?;
            let rendered = serde_json::to_string_pretty(&result)?;

            match output {
                Some(path) => {
                    std::fs::write(path, &rendered)
                        .context(format!("Failed to write output file: {:?}", path))?;
                    println!("📄 结果已写入 {:?}", path);
                }
                None => println!("{}", rendered),
            }
        }

        Commands::Health => {
            // 模型连通性单独探测，失败只影响输出内容，不中断健康检查
            let llm_ok = match crate::llm::LLMClient::new(&config.llm) {
                Ok(client) => client.check_connection().await.is_ok(),
                Err(_) => false,
            };

            let orchestrator = Orchestrator::new(&config)?;
            let mut health = orchestrator.health_check().await;
            health["llm"] = serde_json::json!(if llm_ok { "healthy" } else { "unreachable" });
            println!("{}", serde_json::to_string_pretty(&health)?);
        }

        Commands::Config {
            create,
            validate,
            show,
        } => {
            handle_config_command(&config, *create, *validate, *show)?;
        }
    }

    Ok(())
}

fn handle_config_command(config: &Config, create: bool, validate: bool, show: bool) -> Result<()> {
    if create {
        let path = PathBuf::from(DEFAULT_CONFIG_FILE);
        let mut template = Config::default();
        // 不把环境变量里的密钥写进文件
        template.llm.api_key = String::new();
        std::fs::write(&path, template.to_toml_string()?)
            .context(format!("Failed to write config file: {:?}", path))?;
        println!("✅ 已生成默认配置文件 {:?}", path);
    }

    if validate {
        let issues = config.validate();
        if issues.is_ok() && issues.warnings.is_empty() {
            println!("✅ 配置校验通过");
        } else {
            for error in &issues.errors {
                eprintln!("❌ 错误: {}", error);
            }
            for warning in &issues.warnings {
                eprintln!("⚠️ 警告: {}", warning);
            }
        }
    }

    if show {
        let mut masked = config.clone();
        if !masked.llm.api_key.is_empty() {
            masked.llm.api_key = "***HIDDEN***".to_string();
        }
        println!("{}", masked.to_toml_string()?);
    }

    if !create && !validate && !show {
        println!("ℹ️ 请指定 --create、--validate 或 --show");
    }

    Ok(())
}

// Include tests
#[cfg(test)]
mod tests;
