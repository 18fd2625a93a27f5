use crate::error::{ConfigError, CoreError};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "chorus.toml";
pub const DEFAULT_LOG_FILE: &str = "commented_posts.txt";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    /// Picked at random from a list of browser user agents when unset.
    pub user_agent: Option<String>,
    pub subreddit: String,
    pub hot_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub log_file: String,
    pub min_pause_secs: u64,
    pub max_pause_secs: u64,
    pub rate_limit_delay_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_file: DEFAULT_LOG_FILE.to_string(),
            min_pause_secs: 1,
            max_pause_secs: 5,
            rate_limit_delay_secs: 7 * 60,
        }
    }
}

impl BotConfig {
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_secs(self.rate_limit_delay_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub reddit: RedditConfig,
    pub llm: LlmConfig,
    pub bot: BotConfig,
    pub logging: LoggingConfig,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            username: String::new(),
            password: String::new(),
            user_agent: None,
            subreddit: "all".to_string(),
            hot_limit: 500,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, CoreError> {
        let config: AppConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CoreError::from(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }),
            ErrorKind::PermissionDenied => CoreError::from(ConfigError::PermissionDenied {
                path: path.display().to_string(),
            }),
            _ => CoreError::Io(e),
        })?;
        Self::from_toml_str(&content)
    }

    /// An explicit path must exist. Without one, `chorus.toml` is read when
    /// present and defaults are used otherwise. Environment variables are
    /// applied on top in both cases.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            None => {
                tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *target = value;
            }
        };

        set(&mut self.reddit.client_id, "REDDIT_CLIENT_ID");
        set(&mut self.reddit.client_secret, "REDDIT_CLIENT_SECRET");
        set(&mut self.reddit.username, "REDDIT_USERNAME");
        set(&mut self.reddit.password, "REDDIT_PASSWORD");
        set(&mut self.llm.api_key, "OPENAI_API_KEY");

        if let Some(user_agent) = lookup("REDDIT_USER_AGENT").filter(|v| !v.is_empty()) {
            self.reddit.user_agent = Some(user_agent);
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let required = [
            ("reddit.client_id", &self.reddit.client_id),
            ("reddit.client_secret", &self.reddit.client_secret),
            ("reddit.username", &self.reddit.username),
            ("reddit.password", &self.reddit.password),
            ("llm.api_key", &self.llm.api_key),
            ("llm.model", &self.llm.model),
            ("reddit.subreddit", &self.reddit.subreddit),
            ("bot.log_file", &self.bot.log_file),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                }
                .into());
            }
        }

        if self.reddit.hot_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reddit.hot_limit".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        if self.bot.min_pause_secs > self.bot.max_pause_secs {
            return Err(ConfigError::InvalidValue {
                field: "bot.min_pause_secs".to_string(),
                value: format!(
                    "{} (greater than max_pause_secs {})",
                    self.bot.min_pause_secs, self.bot.max_pause_secs
                ),
            }
            .into());
        }

        if let Some(base_url) = &self.llm.base_url {
            url::Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
                field: "llm.base_url".to_string(),
                value: format!("{base_url} ({e})"),
            })?;
        }

        Ok(())
    }
}
