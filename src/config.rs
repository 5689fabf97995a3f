use crate::cache::DEFAULT_TTL;
use crate::github::{GitHubConfig, PartialPagePolicy, DEFAULT_API_BASE, DEFAULT_MAX_PAGES, DEFAULT_USER_AGENT};
use crate::storage::resolve_data_path;
use std::{env, path::PathBuf, str::FromStr, time::Duration};

pub const DEFAULT_OWNER: &str = "michael-placeholder";
pub const DEFAULT_REPO: &str = "shadowed-realms";

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub github: GitHubConfig,
    pub cache_ttl: Duration,
    pub mock_fallback: bool,
    pub retry_delay: Duration,
}

impl DashboardConfig {
    pub fn new(github: GitHubConfig, data_path: PathBuf) -> Self {
        Self {
            port: 8080,
            data_path,
            github,
            cache_ttl: DEFAULT_TTL,
            mock_fallback: true,
            retry_delay: Duration::from_millis(1000),
        }
    }

    pub fn from_env() -> Self {
        let owner = env_string("GITHUB_OWNER").unwrap_or_else(|| DEFAULT_OWNER.to_string());
        let repo = env_string("GITHUB_REPO").unwrap_or_else(|| DEFAULT_REPO.to_string());

        let mut github = GitHubConfig::new(owner, repo);
        github.api_base = env_string("GITHUB_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        github.user_agent = env_string("GITHUB_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        github.token = env_string("DASHBOARD_GITHUB_TOKEN").or_else(|| env_string("GITHUB_TOKEN"));
        github.max_pages = env_parse("MAX_PAGES", DEFAULT_MAX_PAGES).max(1);
        github.partial_pages = match env_string("PARTIAL_PAGES").as_deref() {
            Some("keep") => PartialPagePolicy::KeepPartial,
            _ => PartialPagePolicy::Discard,
        };
        github.timeout = Duration::from_secs(env_parse("HTTP_TIMEOUT_SECS", 30));

        let data_path = resolve_data_path();
        let mut config = Self::new(github, data_path);
        config.port = env_parse("PORT", 8080);
        config.cache_ttl = Duration::from_secs(env_parse("CACHE_TTL_SECS", DEFAULT_TTL.as_secs()));
        config.mock_fallback = env_parse("MOCK_FALLBACK", true);
        config
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env_string(key)
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}
