use std::time::Duration;

use anyhow::Context;
use reqwest::Url;

pub const BASE_URL_ENV: &str = "STUDENT_API_URL";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub base_url: Url,
    pub timeout: Option<Duration>,
    pub color: bool,
}

impl DashboardConfig {
    /// Resolves the service address from the flag, then the environment, then the default.
    pub fn resolve(
        base_url: Option<&str>,
        timeout_secs: u64,
        color: bool,
    ) -> anyhow::Result<Self> {
        let from_env = std::env::var(BASE_URL_ENV).ok();
        let raw = base_url
            .or(from_env.as_deref())
            .unwrap_or(DEFAULT_BASE_URL);

        Ok(Self {
            base_url: parse_base_url(raw)?,
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            color,
        })
    }
}

/// Parses the service address so relative paths join beneath it.
pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(raw.trim())
        .with_context(|| format!("invalid directory service url {raw:?}"))?;
    if url.cannot_be_a_base() {
        anyhow::bail!("directory service url {raw:?} cannot carry paths");
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = parse_base_url("http://localhost:8080").expect("parse");
        assert_eq!(url.as_str(), "http://localhost:8080/");

        let nested = parse_base_url("https://risk.example.edu/api").expect("parse");
        assert_eq!(nested.as_str(), "https://risk.example.edu/api/");
    }

    #[test]
    fn rejects_unusable_urls() {
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("mailto:ops@example.edu").is_err());
    }

    #[test]
    fn explicit_flag_wins_and_zero_disables_timeout() {
        let config = DashboardConfig::resolve(Some("http://10.0.0.5:9000"), 0, false)
            .expect("resolve");
        assert_eq!(config.base_url.as_str(), "http://10.0.0.5:9000/");
        assert_eq!(config.timeout, None);

        let config = DashboardConfig::resolve(Some("http://10.0.0.5:9000"), 5, true)
            .expect("resolve");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert!(config.color);
    }
}
