use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";

/// Process configuration, read once from the environment at startup.
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub ai_timeout: Duration,
    pub mentions_on_vote: bool,
    pub seed_demo: bool,
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = var_or("MARINET_PORT", "5000")
            .parse()
            .context("MARINET_PORT must be a port number")?;
        let max_upload_bytes = var_or("MARINET_MAX_UPLOAD_BYTES", "16777216")
            .parse()
            .context("MARINET_MAX_UPLOAD_BYTES must be a byte count")?;
        let ai_timeout_secs: u64 = var_or("MARINET_AI_TIMEOUT_SECS", "20")
            .parse()
            .context("MARINET_AI_TIMEOUT_SECS must be a number of seconds")?;

        Ok(Self {
            host: var_or("MARINET_HOST", "0.0.0.0"),
            port,
            db_path: PathBuf::from(var_or("MARINET_DB_PATH", "marinet.db")),
            jwt_secret: var_or("MARINET_JWT_SECRET", DEFAULT_JWT_SECRET),
            upload_dir: PathBuf::from(var_or("MARINET_UPLOAD_DIR", "./static/uploads")),
            max_upload_bytes,
            gemini_api_key: var_or("GEMINI_API_KEY", ""),
            gemini_model: var_or("GEMINI_MODEL", "gemini-2.0-flash"),
            gemini_base_url: var_or("GEMINI_BASE_URL", "https://generativelanguage.googleapis.com"),
            ai_timeout: Duration::from_secs(ai_timeout_secs),
            mentions_on_vote: parse_flag(&var_or("MARINET_MENTIONS_ON_VOTE", "true")),
            seed_demo: parse_flag(&var_or("MARINET_SEED_DEMO", "false")),
            admin_password: var_or("MARINET_ADMIN_PASSWORD", "admin123"),
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
