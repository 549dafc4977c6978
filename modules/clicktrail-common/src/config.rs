use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOG_PATH: &str = "./logs/events.log";
const DEFAULT_ENDPOINT: &str = "http://localhost:3000";

/// Ingestion server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_path: PathBuf,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
    /// Take the sender address from the first `X-Forwarded-For` entry.
    pub trust_forwarded_for: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_vars(|key| std::env::var(key).ok())?;
        tracing::info!(
            host = %config.host,
            port = config.port,
            log_path = %config.log_path.display(),
            allowed_origins = ?config.allowed_origins,
            trust_forwarded_for = config.trust_forwarded_for,
            "Server config loaded"
        );
        Ok(config)
    }

    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            host: get("CLICKTRAIL_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: match get("PORT") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("PORT must be a number, got {raw:?}"))?,
                None => DEFAULT_PORT,
            },
            log_path: get("CLICKTRAIL_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH)),
            allowed_origins: get("CLICKTRAIL_ALLOWED_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            trust_forwarded_for: match get("CLICKTRAIL_TRUST_FORWARDED_FOR") {
                Some(raw) => raw.trim().parse().with_context(|| {
                    format!("CLICKTRAIL_TRUST_FORWARDED_FOR must be true or false, got {raw:?}")
                })?,
                None => false,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where the browser-side dispatcher sends events.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let endpoint = get("CLICKTRAIL_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}
