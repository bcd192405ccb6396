use serde::Deserialize;

use crate::models::Language;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub api_key: String,
    pub api_url_id: String,
    pub api_url_invoices: String,
    pub auth_url: String,
    pub auth_client_id: String,
    pub auth_client_secret: String,
    pub upstream_timeout_secs: u64,
    pub default_language: Language,
}

/// Reads a required variable, rejecting blank values.
fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))
        .and_then(|value| {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            Ok(value)
        })
}

/// Reads a required variable that must hold an absolute http(s) URL.
fn required_url(name: &str) -> anyhow::Result<String> {
    let value = required(name)?;
    let parsed = url::Url::parse(&value)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(value)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8501".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            api_key: required("API_KEY")?,
            api_url_id: required_url("API_URL_ID")?,
            api_url_invoices: required_url("API_URL_INVOICES")?,
            auth_url: required_url("AUTH_URL")?,
            auth_client_id: required("AUTH_CLIENT_ID")?,
            auth_client_secret: required("AUTH_CLIENT_SECRET")?,
            upstream_timeout_secs: std::env::var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("UPSTREAM_TIMEOUT_SECS must be a whole number"))?,
            default_language: std::env::var("DEFAULT_LANGUAGE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.parse::<Language>())
                .transpose()
                .map_err(|e| anyhow::anyhow!("DEFAULT_LANGUAGE: {}", e))?
                .unwrap_or_default(),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Identity API URL: {}", config.api_url_id);
        tracing::debug!("Invoices API URL: {}", config.api_url_invoices);
        tracing::debug!("Auth URL: {}", config.auth_url);
        tracing::debug!("Upstream timeout: {}s", config.upstream_timeout_secs);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
