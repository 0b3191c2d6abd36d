use std::str::FromStr;
use std::time::Duration;

use crate::dialect::Dialect;

/// Адрес BFF по умолчанию.
pub const DEFAULT_PROXIED_URL: &str = "http://localhost:3002";
/// Общий таймаут запроса по умолчанию.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Через какой адрес идут запросы.
pub enum BaseMode {
    /// Напрямую в сервис каталога, минуя прокси/BFF.
    Direct,
    /// Через прокси/BFF.
    #[default]
    Proxied,
}

impl FromStr for BaseMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(BaseMode::Direct),
            "proxied" | "proxy" => Ok(BaseMode::Proxied),
            other => Err(format!("unknown base mode '{other}', expected direct|proxied")),
        }
    }
}

#[derive(Debug, Clone)]
/// Конфигурация шлюза, передаётся при создании.
pub struct GatewayConfig {
    /// Режим выбора адреса.
    pub base_mode: BaseMode,
    /// Адрес прокси/BFF.
    pub proxied_url: String,
    /// Прямой адрес сервиса каталога.
    pub direct_url: Option<String>,
    /// Общий таймаут одного запроса.
    pub timeout: Duration,
    /// Подробные логи запросов и формы ответов на уровне `info`.
    pub debug_logging: bool,
    /// Соглашение об именах сервера.
    pub dialect: Dialect,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_mode: BaseMode::default(),
            proxied_url: DEFAULT_PROXIED_URL.to_string(),
            direct_url: None,
            timeout: DEFAULT_TIMEOUT,
            debug_logging: false,
            dialect: Dialect::default(),
        }
    }
}

impl GatewayConfig {
    /// Конфигурация с адресом прокси и значениями по умолчанию.
    pub fn new(proxied_url: impl Into<String>) -> Self {
        Self {
            proxied_url: proxied_url.into(),
            ..Self::default()
        }
    }

    /// Задаёт прямой адрес сервиса.
    pub fn with_direct_url(mut self, url: impl Into<String>) -> Self {
        self.direct_url = Some(url.into());
        self
    }

    /// Задаёт режим выбора адреса.
    pub fn with_base_mode(mut self, mode: BaseMode) -> Self {
        self.base_mode = mode;
        self
    }

    /// Задаёт общий таймаут запроса.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Задаёт диалект сервера.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Включает подробные логи.
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    /// Адрес для обычных запросов.
    ///
    /// В режиме `Direct` без прямого адреса используется адрес прокси.
    pub fn base_url(&self) -> &str {
        match (self.base_mode, self.direct_url.as_deref()) {
            (BaseMode::Direct, Some(direct)) => direct,
            _ => &self.proxied_url,
        }
    }

    /// Основной и запасной адреса для входа.
    pub(crate) fn login_targets(&self) -> (&str, Option<&str>) {
        let proxied = self.proxied_url.as_str();
        let Some(direct) = self.direct_url.as_deref() else {
            return (proxied, None);
        };

        let (primary, secondary) = match self.base_mode {
            BaseMode::Direct => (direct, proxied),
            BaseMode::Proxied => (proxied, direct),
        };

        if same_target(primary, secondary) {
            (primary, None)
        } else {
            (primary, Some(secondary))
        }
    }
}

fn same_target(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = GatewayConfig::default();
        assert_eq!(config.base_mode, BaseMode::Proxied);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.dialect, Dialect::Bff);
        assert_eq!(config.base_url(), DEFAULT_PROXIED_URL);
        assert!(!config.debug_logging);
    }

    #[test]
    fn direct_mode_uses_direct_url() {
        let config = GatewayConfig::new("http://bff")
            .with_direct_url("http://api")
            .with_base_mode(BaseMode::Direct);
        assert_eq!(config.base_url(), "http://api");
        assert_eq!(config.login_targets(), ("http://api", Some("http://bff")));
    }

    #[test]
    fn direct_mode_without_direct_url_falls_back_to_proxy() {
        let config = GatewayConfig::new("http://bff").with_base_mode(BaseMode::Direct);
        assert_eq!(config.base_url(), "http://bff");
        assert_eq!(config.login_targets(), ("http://bff", None));
    }

    #[test]
    fn proxied_mode_logs_in_through_proxy_first() {
        let config = GatewayConfig::new("http://bff").with_direct_url("http://api");
        assert_eq!(config.base_url(), "http://bff");
        assert_eq!(config.login_targets(), ("http://bff", Some("http://api")));
    }

    #[test]
    fn identical_targets_do_not_produce_fallback() {
        let config = GatewayConfig::new("http://api/").with_direct_url("http://api");
        assert_eq!(config.login_targets(), ("http://api/", None));
    }

    #[test]
    fn base_mode_parses_from_config_strings() {
        assert_eq!("Direct".parse::<BaseMode>(), Ok(BaseMode::Direct));
        assert_eq!("proxy".parse::<BaseMode>(), Ok(BaseMode::Proxied));
        assert!("tunnel".parse::<BaseMode>().is_err());
    }
}
