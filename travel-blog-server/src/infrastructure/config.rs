//! Server configuration read from the environment (after `.env` is loaded).

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:8000,http://127.0.0.1:8000";
pub const DEFAULT_NOTIFICATION_CHANNEL: &str = "travel-blog.post.created";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` runs the server on the in-process store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub http_host: String,
    pub http_port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// `None` keeps notifications inside the process.
    pub redis_url: Option<String>,
    pub notification_channel: String,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: non_empty_var("DATABASE_URL"),
            database_max_connections: parsed_var("DATABASE_MAX_CONNECTIONS", 5)?,
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: parsed_var("HTTP_PORT", 3000)?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            redis_url: non_empty_var("REDIS_URL"),
            notification_channel: env::var("NOTIFICATION_CHANNEL")
                .unwrap_or_else(|_| DEFAULT_NOTIFICATION_CHANNEL.to_string()),
            max_upload_bytes: parsed_var("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
        })
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
