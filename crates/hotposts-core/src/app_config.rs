use std::net::SocketAddr;
use std::path::PathBuf;

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Base URL of the Backend Gateway the proxy forwards to.
    pub backend_url: String,
    pub upstream_timeout_secs: u64,
    pub user_agent: String,
    /// Base URL the dashboard fetches from, normally this proxy.
    pub api_url: String,
    pub page_size: u32,
    pub keyword_refresh_secs: u64,
    pub message_ttl_secs: u64,
    pub read_state_path: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Base URLs may embed credentials in their userinfo part.
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("backend_url", &redact_userinfo(&self.backend_url))
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("api_url", &redact_userinfo(&self.api_url))
            .field("page_size", &self.page_size)
            .field("keyword_refresh_secs", &self.keyword_refresh_secs)
            .field("message_ttl_secs", &self.message_ttl_secs)
            .field("read_state_path", &self.read_state_path)
            .finish()
    }
}

/// Replaces any userinfo in `raw` so credentials never reach logs. Strings
/// that do not parse are returned unchanged.
fn redact_userinfo(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };
    if url.username().is_empty() && url.password().is_none() {
        return raw.to_string();
    }
    if url.set_password(None).is_err() || url.set_username("redacted").is_err() {
        return "[redacted]".to_string();
    }
    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_userinfo_hides_credentials() {
        assert_eq!(
            redact_userinfo("http://user:pw@backend:8001/api"),
            "http://redacted@backend:8001/api"
        );
        assert_eq!(
            redact_userinfo("https://token@backend/"),
            "https://redacted@backend/"
        );
    }

    #[test]
    fn redact_userinfo_keeps_host_when_query_contains_at_sign() {
        assert_eq!(
            redact_userinfo("http://backend:8001?token=a@b"),
            "http://backend:8001?token=a@b"
        );
        assert_eq!(
            redact_userinfo("http://u:p@backend:8001/x?token=a@b"),
            "http://redacted@backend:8001/x?token=a@b"
        );
    }

    #[test]
    fn redact_userinfo_leaves_plain_urls_alone() {
        assert_eq!(
            redact_userinfo("http://localhost:8001"),
            "http://localhost:8001"
        );
        assert_eq!(
            redact_userinfo("http://localhost:8001/a@b"),
            "http://localhost:8001/a@b"
        );
    }
}
