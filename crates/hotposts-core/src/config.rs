use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;
use url::Url;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("HOTPOSTS_ENV", "development"))?;

    // Outside development the upstream must be named explicitly so a
    // deployed proxy never silently points at localhost.
    let backend_url = match lookup("HOTPOSTS_BACKEND_URL") {
        Ok(url) => url,
        Err(_) if env == Environment::Development => DEFAULT_BACKEND_URL.to_string(),
        Err(_) => return Err(ConfigError::MissingEnvVar("HOTPOSTS_BACKEND_URL".to_string())),
    };
    let backend_url = require_http_url("HOTPOSTS_BACKEND_URL", backend_url)?;

    let bind_addr = parse_addr("HOTPOSTS_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("HOTPOSTS_LOG_LEVEL", "info");
    let upstream_timeout_secs = parse_u64("HOTPOSTS_UPSTREAM_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("HOTPOSTS_USER_AGENT", "hotposts/0.1 (dashboard)");
    let api_url = require_http_url(
        "HOTPOSTS_API_URL",
        or_default("HOTPOSTS_API_URL", "http://localhost:3000"),
    )?;

    let page_size = parse_u32("HOTPOSTS_PAGE_SIZE", "30")?;
    require_positive("HOTPOSTS_PAGE_SIZE", u64::from(page_size))?;
    let keyword_refresh_secs = parse_u64("HOTPOSTS_KEYWORD_REFRESH_SECS", "3600")?;
    require_positive("HOTPOSTS_KEYWORD_REFRESH_SECS", keyword_refresh_secs)?;
    let message_ttl_secs = parse_u64("HOTPOSTS_MESSAGE_TTL_SECS", "5")?;
    let read_state_path = PathBuf::from(or_default(
        "HOTPOSTS_READ_STATE_PATH",
        "./data/read_state.json",
    ));

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        backend_url,
        upstream_timeout_secs,
        user_agent,
        api_url,
        page_size,
        keyword_refresh_secs,
        message_ttl_secs,
        read_state_path,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "HOTPOSTS_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

/// Accepts an absolute `http`/`https` URL with a host. The returned form has
/// no trailing slash so callers can append paths.
fn require_http_url(var: &str, raw: String) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parsed = Url::parse(raw.trim())
        .map_err(|e| invalid(format!("expected an http(s) URL, got \"{raw}\": {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "unsupported scheme \"{}\" in \"{raw}\"",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid(format!("missing host in \"{raw}\"")));
    }

    let mut normalised = String::from(parsed.clone());
    if parsed.query().is_none() && parsed.fragment().is_none() {
        while normalised.ends_with('/') {
            normalised.pop();
        }
    }
    Ok(normalised)
}

fn require_positive(var: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
