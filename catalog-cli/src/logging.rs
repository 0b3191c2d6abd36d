use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Диагностика шлюза (`CATALOG_DEBUG_LOGGING`) пишется на уровне `info`.
const GATEWAY_DIAGNOSTICS: &str = "catalog_client=info";

/// Собирает фильтр: `RUST_LOG`, затем уровень из настроек, затем `warn`.
///
/// С включённой диагностикой к фильтру добавляется `catalog_client=info`,
/// иначе при уровне `warn` запросы и формы ответов не видны.
fn build_filter(env: Option<&str>, level: &str, debug_logging: bool) -> EnvFilter {
    let filter = env
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    if !debug_logging {
        return filter;
    }
    match GATEWAY_DIAGNOSTICS.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Логи пишутся в stderr, чтобы не смешиваться с выводом команд.
pub fn init_logging(level: &str, debug_logging: bool) -> Result<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(env.as_deref(), level, debug_logging);

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug_logging)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_enable_gateway_info() {
        let filter = build_filter(None, "warn", true).to_string();
        assert!(filter.contains("catalog_client=info"));
        assert!(filter.contains("warn"));
    }

    #[test]
    fn plain_level_is_used_without_diagnostics() {
        let filter = build_filter(None, "debug", false).to_string();
        assert_eq!(filter, "debug");
    }

    #[test]
    fn environment_wins_over_settings() {
        let filter = build_filter(Some("trace"), "warn", false).to_string();
        assert_eq!(filter, "trace");
    }

    #[test]
    fn invalid_level_falls_back_to_warn() {
        let filter = build_filter(None, "catalog=loud", false).to_string();
        assert_eq!(filter, "warn");
    }
}
