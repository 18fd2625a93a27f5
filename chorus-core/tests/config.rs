use chorus_core::{AppConfig, ConfigError, CoreError, DEFAULT_LOG_FILE, DEFAULT_MODEL};
use std::collections::HashMap;
use std::time::Duration;

fn complete_config() -> AppConfig {
    AppConfig::from_toml_str(
        r#"
        [reddit]
        client_id = "id"
        client_secret = "secret"
        username = "chorus_bot"
        password = "hunter2"

        [llm]
        api_key = "sk-test"
        "#,
    )
    .unwrap()
}

#[test]
fn test_defaults_fill_missing_sections() {
    let config = complete_config();
    assert_eq!(config.reddit.subreddit, "all");
    assert_eq!(config.reddit.hot_limit, 500);
    assert_eq!(config.reddit.user_agent, None);
    assert_eq!(config.llm.model, DEFAULT_MODEL);
    assert_eq!(config.bot.log_file, DEFAULT_LOG_FILE);
    assert_eq!(config.bot.rate_limit_delay(), Duration::from_secs(420));
    assert_eq!((config.bot.min_pause_secs, config.bot.max_pause_secs), (1, 5));
    assert!(config.validate().is_ok());
}

#[test]
fn test_env_overrides_file_values() {
    let mut config = complete_config();
    let env: HashMap<&str, &str> = [
        ("REDDIT_PASSWORD", "from-env"),
        ("OPENAI_API_KEY", "sk-env"),
        ("REDDIT_USER_AGENT", "chorus/0.1"),
        ("REDDIT_USERNAME", ""),
    ]
    .into_iter()
    .collect();

    config.apply_env(|key| env.get(key).map(|v| v.to_string()));

    assert_eq!(config.reddit.password, "from-env");
    assert_eq!(config.llm.api_key, "sk-env");
    assert_eq!(config.reddit.user_agent.as_deref(), Some("chorus/0.1"));
    // Empty values do not clobber the file
    assert_eq!(config.reddit.username, "chorus_bot");
}

#[test]
fn test_validate_reports_missing_credentials() {
    let config = AppConfig::default();
    match config.validate() {
        Err(CoreError::Config(ConfigError::MissingField { field })) => {
            assert_eq!(field, "reddit.client_id");
        }
        other => panic!("Expected MissingField, got {:?}", other),
    }
}

#[test]
fn test_validate_rejects_inverted_pause_range() {
    let mut config = complete_config();
    config.bot.min_pause_secs = 10;
    config.bot.max_pause_secs = 2;
    assert!(matches!(
        config.validate(),
        Err(CoreError::Config(ConfigError::InvalidValue { .. }))
    ));
}

#[test]
fn test_validate_rejects_bad_base_url() {
    let mut config = complete_config();
    config.llm.base_url = Some("not a url".to_string());
    assert!(matches!(
        config.validate(),
        Err(CoreError::Config(ConfigError::InvalidValue { field, .. })) if field == "llm.base_url"
    ));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let path = std::env::temp_dir().join(format!("chorus_missing_{}.toml", uuid::Uuid::new_v4()));
    match AppConfig::from_file(&path) {
        Err(CoreError::Config(ConfigError::FileNotFound { path: reported })) => {
            assert!(reported.contains("chorus_missing_"));
        }
        other => panic!("Expected FileNotFound, got {:?}", other),
    }
}

#[test]
fn test_from_file_reads_toml() {
    let path = std::env::temp_dir().join(format!("chorus_config_{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
        &path,
        "[reddit]\nsubreddit = \"rust\"\nhot_limit = 25\n\n[bot]\nlog_file = \"replied.txt\"\n",
    )
    .unwrap();

    let config = AppConfig::from_file(&path).unwrap();
    assert_eq!(config.reddit.subreddit, "rust");
    assert_eq!(config.reddit.hot_limit, 25);
    assert_eq!(config.bot.log_file, "replied.txt");

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_malformed_toml_is_parse_error() {
    assert!(matches!(
        AppConfig::from_toml_str("[reddit\nclient_id ="),
        Err(CoreError::Config(ConfigError::Parse(_)))
    ));
}
