use anyhow::{Context, Result};
use std::str::FromStr;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// Hosted records table. `None` runs the service on seed data only.
    pub database_url: Option<String>,
    pub transcripts_table: String,
    pub youtube_extract_url: Option<String>,
    pub seed_mock_data: bool,
    pub episode_gap_minutes: i64,
    /// Chat sessions held in memory before the least recently used is dropped.
    pub max_chat_sessions: usize,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            database_url: optional_env("DATABASE_URL"),
            transcripts_table: optional_env("TRANSCRIPTS_TABLE")
                .unwrap_or_else(|| "transcriptions".to_string()),
            youtube_extract_url: optional_env("YOUTUBE_EXTRACT_URL"),
            seed_mock_data: parse_env("SEED_MOCK_DATA", true)?,
            episode_gap_minutes: parse_env("EPISODE_GAP_MINUTES", 120)?,
            max_chat_sessions: parse_env("MAX_CHAT_SESSIONS", 256)?,
            canvas_width: parse_env("CANVAS_WIDTH", 1200.0)?,
            canvas_height: parse_env("CANVAS_HEIGHT", 800.0)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anthropic_api_key: String::new(),
            database_url: None,
            transcripts_table: "transcriptions".to_string(),
            youtube_extract_url: None,
            seed_mock_data: true,
            episode_gap_minutes: 120,
            max_chat_sessions: 256,
            canvas_width: 1200.0,
            canvas_height: 800.0,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
