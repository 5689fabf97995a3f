//! Issue acquisition: an ordered list of sources tried until one answers.
//!
//! The standard chain is live GitHub, then the cached copy of the last
//! successful fetch, then synthetic issues. Whatever the outcome, callers get
//! an [`Acquisition`] back; fetch errors never escape this module.

use crate::github::{GitHubClient, GitHubError, IssueFilter};
use crate::mock;
use crate::models::{CachedPayload, DataSource, Issue};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),
    #[error("no fresh cache entry")]
    NoFreshCache,
}

impl SourceError {
    /// Epoch seconds at which GitHub lifts the rate limit, when that is why
    /// the source failed.
    pub fn rate_limit_reset(&self) -> Option<i64> {
        match self {
            Self::GitHub(GitHubError::RateLimited { reset }) => *reset,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    pub issues: Vec<Issue>,
    pub partial: bool,
}

impl Loaded {
    fn complete(issues: Vec<Issue>) -> Self {
        Self {
            issues,
            partial: false,
        }
    }
}

#[async_trait]
pub trait IssueSource: Send + Sync {
    fn kind(&self) -> DataSource;

    async fn load(&self, cache: Option<&CachedPayload>, now_ms: i64) -> Result<Loaded, SourceError>;
}

pub struct LiveSource {
    client: Arc<GitHubClient>,
    filter: IssueFilter,
}

impl LiveSource {
    pub fn new(client: Arc<GitHubClient>) -> Self {
        Self {
            client,
            filter: IssueFilter::All,
        }
    }
}

#[async_trait]
impl IssueSource for LiveSource {
    fn kind(&self) -> DataSource {
        DataSource::Live
    }

    async fn load(&self, _cache: Option<&CachedPayload>, _now_ms: i64) -> Result<Loaded, SourceError> {
        let fetched = self.client.fetch_issues(self.filter).await?;
        Ok(Loaded {
            issues: fetched.issues,
            partial: fetched.partial,
        })
    }
}

pub struct CachedSource {
    ttl: Duration,
}

impl CachedSource {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }
}

#[async_trait]
impl IssueSource for CachedSource {
    fn kind(&self) -> DataSource {
        DataSource::Cached
    }

    async fn load(&self, cache: Option<&CachedPayload>, now_ms: i64) -> Result<Loaded, SourceError> {
        cache
            .and_then(|payload| payload.fresh_issues(now_ms, self.ttl))
            .map(|issues| Loaded::complete(issues.to_vec()))
            .ok_or(SourceError::NoFreshCache)
    }
}

pub struct MockSource {
    owner: String,
    repo: String,
}

impl MockSource {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

#[async_trait]
impl IssueSource for MockSource {
    fn kind(&self) -> DataSource {
        DataSource::Mock
    }

    async fn load(&self, _cache: Option<&CachedPayload>, _now_ms: i64) -> Result<Loaded, SourceError> {
        Ok(Loaded::complete(mock::full_set(&self.owner, &self.repo)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOutcome {
    Live { partial: bool },
    Cached { age_ms: i64 },
    Mock,
    Failed {
        reason: String,
        rate_limit_reset: Option<i64>,
    },
}

impl FeedOutcome {
    pub fn source(&self) -> DataSource {
        match self {
            Self::Live { .. } => DataSource::Live,
            Self::Cached { .. } => DataSource::Cached,
            Self::Mock => DataSource::Mock,
            Self::Failed { .. } => DataSource::Error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Acquisition {
    pub outcome: FeedOutcome,
    pub issues: Vec<Issue>,
}

impl Acquisition {
    pub fn source(&self) -> DataSource {
        self.outcome.source()
    }

    /// Only a complete live result replaces the cached copy.
    pub fn cache_update(&self, now_ms: i64) -> Option<CachedPayload> {
        match self.outcome {
            FeedOutcome::Live { partial: false } if !self.issues.is_empty() => {
                Some(CachedPayload::new(self.issues.clone(), now_ms))
            }
            _ => None,
        }
    }
}

pub struct AcquisitionChain {
    sources: Vec<Box<dyn IssueSource>>,
}

impl AcquisitionChain {
    pub fn new(sources: Vec<Box<dyn IssueSource>>) -> Self {
        Self { sources }
    }

    pub fn standard(client: Arc<GitHubClient>, ttl: Duration, mock_fallback: bool) -> Self {
        let owner = client.config().owner.clone();
        let repo = client.config().repo.clone();
        let mut sources: Vec<Box<dyn IssueSource>> = vec![
            Box::new(LiveSource::new(client)),
            Box::new(CachedSource::new(ttl)),
        ];
        if mock_fallback {
            sources.push(Box::new(MockSource::new(owner, repo)));
        }
        Self::new(sources)
    }

    pub fn kinds(&self) -> Vec<DataSource> {
        self.sources.iter().map(|source| source.kind()).collect()
    }

    pub async fn run(&self, cache: Option<&CachedPayload>, now_ms: i64) -> Acquisition {
        let mut first_failure: Option<(String, Option<i64>)> = None;

        for source in &self.sources {
            let kind = source.kind();
            match source.load(cache, now_ms).await {
                Ok(loaded) => {
                    let outcome = match kind {
                        DataSource::Cached => FeedOutcome::Cached {
                            age_ms: cache.map(|payload| payload.age_ms(now_ms)).unwrap_or_default(),
                        },
                        DataSource::Mock => FeedOutcome::Mock,
                        _ => FeedOutcome::Live {
                            partial: loaded.partial,
                        },
                    };
                    info!("using {kind:?} data ({} issues)", loaded.issues.len());
                    return Acquisition {
                        outcome,
                        issues: loaded.issues,
                    };
                }
                Err(err) => {
                    warn!("{kind:?} source failed: {err}");
                    first_failure.get_or_insert_with(|| (err.to_string(), err.rate_limit_reset()));
                }
            }
        }

        let (reason, rate_limit_reset) =
            first_failure.unwrap_or_else(|| ("no issue sources configured".to_string(), None));
        Acquisition {
            outcome: FeedOutcome::Failed {
                reason,
                rate_limit_reset,
            },
            issues: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IssueState;

    struct Failing;

    #[async_trait]
    impl IssueSource for Failing {
        fn kind(&self) -> DataSource {
            DataSource::Live
        }

        async fn load(&self, _cache: Option<&CachedPayload>, _now_ms: i64) -> Result<Loaded, SourceError> {
            Err(GitHubError::RateLimited {
                reset: Some(1_700_000_000),
            }
            .into())
        }
    }

    struct Fixed(Vec<Issue>);

    #[async_trait]
    impl IssueSource for Fixed {
        fn kind(&self) -> DataSource {
            DataSource::Live
        }

        async fn load(&self, _cache: Option<&CachedPayload>, _now_ms: i64) -> Result<Loaded, SourceError> {
            Ok(Loaded::complete(self.0.clone()))
        }
    }

    const HOUR: Duration = Duration::from_secs(3600);

    fn chain(live: Box<dyn IssueSource>, mock: bool) -> AcquisitionChain {
        let mut sources: Vec<Box<dyn IssueSource>> = vec![live, Box::new(CachedSource::new(HOUR))];
        if mock {
            sources.push(Box::new(MockSource::new("o", "r")));
        }
        AcquisitionChain::new(sources)
    }

    #[tokio::test]
    async fn live_success_refreshes_cache() {
        let issues = mock::generate(1..=5, IssueState::Open, "o", "r");
        let acquisition = chain(Box::new(Fixed(issues.clone())), true).run(None, 10).await;
        assert_eq!(acquisition.outcome, FeedOutcome::Live { partial: false });
        assert_eq!(acquisition.cache_update(10), Some(CachedPayload::new(issues, 10)));
    }

    #[tokio::test]
    async fn failure_uses_fresh_cache() {
        let cached = CachedPayload::new(mock::generate(1..=3, IssueState::Open, "o", "r"), 1_000);
        let acquisition = chain(Box::new(Failing), true).run(Some(&cached), 61_000).await;
        assert_eq!(acquisition.outcome, FeedOutcome::Cached { age_ms: 60_000 });
        assert_eq!(acquisition.issues, cached.issues);
        assert!(acquisition.cache_update(61_000).is_none());
    }

    #[tokio::test]
    async fn expired_cache_falls_through_to_mock() {
        let cached = CachedPayload::new(mock::generate(1..=3, IssueState::Open, "o", "r"), 0);
        let acquisition = chain(Box::new(Failing), true)
            .run(Some(&cached), 2 * 3600 * 1000)
            .await;
        assert_eq!(acquisition.outcome, FeedOutcome::Mock);
        assert_eq!(acquisition.issues.len(), 1019);
    }

    #[tokio::test]
    async fn without_mock_the_chain_reports_the_live_error() {
        let acquisition = chain(Box::new(Failing), false).run(None, 0).await;
        assert_eq!(
            acquisition.outcome,
            FeedOutcome::Failed {
                reason: "rate limited by GitHub".to_string(),
                rate_limit_reset: Some(1_700_000_000),
            }
        );
        assert!(acquisition.issues.is_empty());
        assert_eq!(acquisition.source(), DataSource::Error);
    }

    #[test]
    fn standard_chain_order() {
        let client = Arc::new(GitHubClient::new(crate::github::GitHubConfig::new("o", "r")).unwrap());
        let with_mock = AcquisitionChain::standard(client.clone(), HOUR, true);
        assert_eq!(with_mock.kinds(), vec![DataSource::Live, DataSource::Cached, DataSource::Mock]);
        let without = AcquisitionChain::standard(client, HOUR, false);
        assert_eq!(without.kinds(), vec![DataSource::Live, DataSource::Cached]);
    }
}
