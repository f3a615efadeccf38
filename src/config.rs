use std::env;

/// Startup configuration problems
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {name} is not a valid chat id: {value}")]
    InvalidChatId { name: &'static str, value: String },
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,

    // Telegram
    pub bot_token: String,
    pub bot_username: Option<String>,
    pub db_channel_id: i64,
    pub update_channel_id: i64,
    pub telegram_api_url: String,
    pub poll_timeout_secs: u64,

    // Redis (None = in-memory store)
    pub redis_url: Option<String>,

    // TMDB (None = posters disabled)
    pub tmdb_api_key: Option<String>,
    pub tmdb_api_url: String,
    pub tmdb_image_url: String,

    // Pipeline
    pub debounce_secs: u64,
    pub retention_hours: i64,
    pub sweep_interval_secs: u64,

    // Misc
    pub http_timeout_secs: u64,
}

/// Unset or blank variables count as absent
fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn chat_id(name: &'static str) -> Result<i64, ConfigError> {
    let value = non_empty(name).ok_or(ConfigError::Missing(name))?;
    value
        .parse()
        .map_err(|_| ConfigError::InvalidChatId { name, value })
}

impl Config {
    /// Load configuration from environment variables with defaults.
    ///
    /// Fails only when a required variable is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),

            // Telegram
            bot_token: non_empty("BOT_TOKEN").unwrap_or_default(),
            bot_username: non_empty("BOT_USERNAME")
                .map(|name| name.trim_start_matches('@').to_string()),
            db_channel_id: chat_id("DB_CHANNEL_ID")?,
            update_channel_id: chat_id("UPDATE_CHANNEL_ID")?,
            telegram_api_url: env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
            poll_timeout_secs: env::var("POLL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),

            // Redis
            redis_url: non_empty("REDIS_URL"),

            // TMDB
            tmdb_api_key: non_empty("TMDB_API_KEY"),
            tmdb_api_url: env::var("TMDB_API_URL")
                .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string()),
            tmdb_image_url: env::var("TMDB_IMAGE_URL")
                .unwrap_or_else(|_| "https://image.tmdb.org/t/p/w500".to_string()),

            // Pipeline
            debounce_secs: env::var("DEBOUNCE_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            retention_hours: env::var("RETENTION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .unwrap_or(24),
            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .unwrap_or(3600), // 1 hour

            // Misc
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the settings the bot cannot run without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.is_empty() {
            return Err(ConfigError::Missing("BOT_TOKEN"));
        }
        if self.db_channel_id == 0 {
            return Err(ConfigError::Missing("DB_CHANNEL_ID"));
        }
        if self.update_channel_id == 0 {
            return Err(ConfigError::Missing("UPDATE_CHANNEL_ID"));
        }
        Ok(())
    }
}
