#[cfg(test)]
mod tests {
    use crate::cli::{Args, Commands};
    use clap::Parser;

    #[test]
    fn test_execute_command_parsing() {
        let args = Args::try_parse_from([
            "triad-rs",
            "execute",
            "What are AI trends in 2024?",
            "--url",
            "https://www.example.com/a",
            "--url",
            "https://www.example.com/b",
            "--search",
            "ai trends",
            "--max-sources",
            "3",
            "--analysis",
            "executive",
        ])
        .unwrap();

        match &args.command {
            Commands::Execute {
                query,
                urls,
                search_terms,
                max_sources,
                analysis_type,
                ..
            } => {
                assert_eq!(query, "What are AI trends in 2024?");
                assert_eq!(urls.len(), 2);
                assert_eq!(search_terms, &vec!["ai trends".to_string()]);
                assert_eq!(*max_sources, 3);
                assert_eq!(analysis_type, "executive");
            }
            other => panic!("期望Execute子命令，实际为 {:?}", other),
        }
    }

    #[test]
    fn test_execute_defaults() {
        let args = Args::try_parse_from(["triad-rs", "execute", "q"]).unwrap();

        match &args.command {
            Commands::Execute {
                urls,
                search_terms,
                max_sources,
                analysis_type,
                output,
                ..
            } => {
                assert!(urls.is_empty());
                assert!(search_terms.is_empty());
                assert_eq!(*max_sources, 5);
                assert_eq!(analysis_type, "comprehensive");
                assert!(output.is_none());
            }
            other => panic!("期望Execute子命令，实际为 {:?}", other),
        }
    }

    #[test]
    fn test_query_is_required_for_execute() {
        assert!(Args::try_parse_from(["triad-rs", "execute"]).is_err());
    }

    #[test]
    fn test_health_command_parsing() {
        let args = Args::try_parse_from(["triad-rs", "health"]).unwrap();
        assert!(matches!(args.command, Commands::Health));
    }

    #[test]
    fn test_config_command_flags() {
        let args = Args::try_parse_from(["triad-rs", "config", "--validate", "--show"]).unwrap();

        match args.command {
            Commands::Config {
                create,
                validate,
                show,
            } => {
                assert!(!create);
                assert!(validate);
                assert!(show);
            }
            other => panic!("期望Config子命令，实际为 {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args =
            Args::try_parse_from(["triad-rs", "execute", "q", "--verbose"]).unwrap();
        assert!(args.verbose);
    }

    #[test]
    fn test_load_config_defaults_when_no_file() {
        let args = Args::try_parse_from(["triad-rs", "health"]).unwrap();
        // 当前目录没有triad.toml时退回默认配置
        let config = args.load_config().unwrap();
        assert_eq!(config.orchestrator.max_retries, 2);
    }

    #[test]
    fn test_load_config_missing_explicit_path_errors() {
        let args = Args::try_parse_from([
            "triad-rs",
            "--config",
            "/nonexistent/triad.toml",
            "health",
        ])
        .unwrap();
        assert!(args.load_config().is_err());
    }

    #[test]
    fn test_verbose_flag_overrides_config() {
        let args = Args::try_parse_from(["triad-rs", "--verbose", "health"]).unwrap();
        let config = args.load_config().unwrap();
        assert!(config.verbose);
    }
}
