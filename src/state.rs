use crate::acquire::{Acquisition, AcquisitionChain, FeedOutcome};
use crate::cache::now_ms;
use crate::config::DashboardConfig;
use crate::github::{GitHubClient, GitHubError};
use crate::models::{AppData, DataSource, Issue};
use crate::storage::persist_data;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// The issue list currently on display and how it was obtained.
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub outcome: Option<FeedOutcome>,
    pub issues: Vec<Issue>,
}

impl Feed {
    pub fn source(&self) -> DataSource {
        self.outcome
            .as_ref()
            .map(FeedOutcome::source)
            .unwrap_or(DataSource::NotFetched)
    }

    pub fn is_partial(&self) -> bool {
        matches!(self.outcome, Some(FeedOutcome::Live { partial: true }))
    }

    pub fn replace_issue(&mut self, updated: Issue) {
        match self.issues.iter_mut().find(|issue| issue.number == updated.number) {
            Some(slot) => *slot = updated,
            None => self.issues.push(updated),
        }
    }
}

impl From<Acquisition> for Feed {
    fn from(acquisition: Acquisition) -> Self {
        Self {
            outcome: Some(acquisition.outcome),
            issues: acquisition.issues,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub feed: Arc<Mutex<Feed>>,
    pub github: Arc<GitHubClient>,
    pub chain: Arc<AcquisitionChain>,
}

impl AppState {
    pub fn new(config: &DashboardConfig, data: AppData) -> Result<Self, GitHubError> {
        let github = Arc::new(GitHubClient::new(config.github.clone())?);
        github.set_stored_token(data.github_token.clone());
        let chain = AcquisitionChain::standard(github.clone(), config.cache_ttl, config.mock_fallback);

        Ok(Self {
            data_path: config.data_path.clone(),
            data: Arc::new(Mutex::new(data)),
            feed: Arc::new(Mutex::new(Feed::default())),
            github,
            chain: Arc::new(chain),
        })
    }

    /// Runs the fallback chain once and publishes the result. A complete live
    /// fetch also overwrites the cache entry.
    pub async fn refresh(&self) -> DataSource {
        let cache = self.data.lock().await.issue_cache.clone();
        let now = now_ms();
        let acquisition = self.chain.run(cache.as_ref(), now).await;

        if let Some(payload) = acquisition.cache_update(now) {
            let mut data = self.data.lock().await;
            data.issue_cache = Some(payload);
            if let Err(err) = persist_data(&self.data_path, &data).await {
                error!("failed to write issue cache: {}", err.message);
            }
        }

        let source = acquisition.source();
        info!("issue feed is now {source:?} ({} issues)", acquisition.issues.len());
        *self.feed.lock().await = Feed::from(acquisition);
        source
    }

    /// Start-up load: one refresh, and a single delayed re-attempt when it
    /// ends in the error state.
    pub async fn initial_load(&self, retry_delay: Duration) -> DataSource {
        let source = self.refresh().await;
        if source != DataSource::Error {
            return source;
        }
        warn!("initial load failed, retrying in {retry_delay:?}");
        tokio::time::sleep(retry_delay).await;
        self.refresh().await
    }
}
