use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use teloxide::types::ChatId;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    telegram_bot_token: String,
    /// Genius API token for lyrics search
    #[serde(default)]
    genius_token: String,
    /// Anthropic API key for the guess command
    #[serde(default)]
    anthropic_api_key: String,
    #[serde(default = "default_http_timeout_secs")]
    http_timeout_secs: u64,
    #[serde(default = "default_memo_max_entries")]
    memo_max_entries: usize,
    /// Seconds a catalog lookup stays memoized (0 = never expires).
    #[serde(default = "default_memo_ttl_secs")]
    memo_ttl_secs: u64,
    #[serde(default = "default_session_max_users")]
    session_max_users: usize,
    log_chat_id: Option<i64>,
    /// Directory for state files (logs). Defaults to current directory.
    data_dir: Option<String>,
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_memo_max_entries() -> usize {
    1000
}

fn default_memo_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_session_max_users() -> usize {
    10_000
}

/// Environment variables that override the config file.
const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
const ENV_GENIUS_TOKEN: &str = "GENIUS_TOKEN";
const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

pub struct Config {
    pub telegram_bot_token: String,
    /// Lyrics are disabled when unset.
    pub genius_token: Option<String>,
    /// Guessing is disabled when unset.
    pub anthropic_api_key: Option<String>,
    /// Applied to every outbound call.
    pub http_timeout: Duration,
    pub memo_max_entries: usize,
    pub memo_ttl: Option<Duration>,
    pub session_max_users: usize,
    pub log_chat_id: Option<ChatId>,
    /// Directory for state files (logs).
    pub data_dir: PathBuf,
}

impl Config {
    /// Load from a JSON file, then apply environment overrides.
    ///
    /// A missing file is fine as long as the bot token comes from the
    /// environment.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    fn load_with_env<P, F>(path: P, env: F) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let config_path = path.as_ref().to_path_buf();
        let mut file = match std::fs::read_to_string(&config_path) {
            Ok(content) => serde_json::from_str::<ConfigFile>(&content)
                .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && env(ENV_TELEGRAM_BOT_TOKEN).is_some() => {
                serde_json::from_str::<ConfigFile>("{}")
                    .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?
            }
            Err(e) => return Err(ConfigError::ReadFile { path: config_path, source: e }),
        };

        if let Some(token) = env(ENV_TELEGRAM_BOT_TOKEN) {
            file.telegram_bot_token = token;
        }
        if let Some(token) = env(ENV_GENIUS_TOKEN) {
            file.genius_token = token;
        }
        if let Some(key) = env(ENV_ANTHROPIC_API_KEY) {
            file.anthropic_api_key = key;
        }

        Self::from_file(file)
    }

    fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        if file.telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }
        if file.http_timeout_secs == 0 {
            return Err(ConfigError::Validation("http_timeout_secs must be greater than 0".into()));
        }
        if file.memo_max_entries == 0 {
            return Err(ConfigError::Validation("memo_max_entries must be greater than 0".into()));
        }
        if file.session_max_users == 0 {
            return Err(ConfigError::Validation("session_max_users must be greater than 0".into()));
        }

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            telegram_bot_token: file.telegram_bot_token,
            genius_token: non_empty(file.genius_token),
            anthropic_api_key: non_empty(file.anthropic_api_key),
            http_timeout: Duration::from_secs(file.http_timeout_secs),
            memo_max_entries: file.memo_max_entries,
            memo_ttl: (file.memo_ttl_secs > 0).then(|| Duration::from_secs(file.memo_ttl_secs)),
            session_max_users: file.session_max_users,
            log_chat_id: file.log_chat_id.map(ChatId),
            data_dir,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}
