use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use catalog_client::{
    BaseMode, DEFAULT_PROXIED_URL, DEFAULT_TOKEN_FILE, Dialect, GatewayConfig,
};

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_mode: BaseMode,
    pub proxied_url: String,
    pub direct_url: Option<String>,
    pub timeout_ms: u64,
    pub debug_logging: bool,
    pub dialect: Dialect,
    pub token_file: PathBuf,
    pub log_level: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_mode = lookup("CATALOG_BASE_MODE")
            .unwrap_or_else(|| "proxied".to_string())
            .parse::<BaseMode>()
            .map_err(|e| anyhow!("CATALOG_BASE_MODE: {e}"))?;
        let proxied_url = get_optional(&lookup, "CATALOG_PROXIED_URL")
            .unwrap_or_else(|| DEFAULT_PROXIED_URL.to_string());
        let direct_url = get_optional(&lookup, "CATALOG_DIRECT_URL");
        let timeout_ms = parse_u64_env(&lookup, "CATALOG_TIMEOUT_MS", 10_000)?;
        let debug_logging = parse_bool_env(&lookup, "CATALOG_DEBUG_LOGGING", false)?;
        let dialect = lookup("CATALOG_DIALECT")
            .unwrap_or_else(|| "bff".to_string())
            .parse::<Dialect>()
            .map_err(|e| anyhow!("CATALOG_DIALECT: {e}"))?;
        let token_file = get_optional(&lookup, "CATALOG_TOKEN_FILE")
            .unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string())
            .into();
        let log_level = lookup("LOG_LEVEL")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or_else(|| "warn".to_string());

        Ok(Self {
            base_mode,
            proxied_url,
            direct_url,
            timeout_ms,
            debug_logging,
            dialect,
            token_file,
            log_level,
        })
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        let config = GatewayConfig::new(self.proxied_url.clone())
            .with_base_mode(self.base_mode)
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_dialect(self.dialect)
            .with_debug_logging(self.debug_logging);

        match &self.direct_url {
            Some(url) => config.with_direct_url(url.clone()),
            None => config,
        }
    }
}

fn get_optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_u64_env(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    let value = lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?;

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

fn parse_bool_env(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> Result<bool> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(anyhow!("{key} must be a boolean, got '{other}'")),
    }
}
