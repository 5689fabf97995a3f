use crate::models::Issue;
use chrono::{DateTime, Utc};
use reqwest::{
    header::{HeaderMap, ACCEPT},
    Client, Method, RequestBuilder, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "Shadowed-Realms-Dashboard";
pub const PER_PAGE: usize = 100;
pub const DEFAULT_MAX_PAGES: u32 = 11;

const ACCEPT_V3: &str = "application/vnd.github.v3+json";
const API_VERSION: &str = "2022-11-28";

const ADD_PROJECT_ITEM: &str = r#"
mutation($projectId: ID!, $contentId: ID!) {
  addProjectV2ItemById(input: { projectId: $projectId, contentId: $contentId }) {
    item { id }
  }
}"#;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("authentication failed - check token")]
    Authentication,
    #[error("rate limited by GitHub")]
    RateLimited { reset: Option<i64> },
    #[error("forbidden: {}", .message.as_deref().unwrap_or("access denied"))]
    Forbidden { message: Option<String> },
    #[error("not found")]
    NotFound,
    #[error("HTTP error! status: {status}")]
    Http { status: u16 },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("GraphQL error: {0}")]
    GraphQl(String),
    #[error("a GitHub token is required for this operation")]
    MissingToken,
}

impl GitHubError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    pub fn reset_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::RateLimited { reset: Some(secs) } => DateTime::from_timestamp(*secs, 0),
            _ => None,
        }
    }
}

/// What to do when GitHub starts refusing requests after some pages have
/// already arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialPagePolicy {
    #[default]
    Discard,
    KeepPartial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueFilter {
    All,
    Open,
    Closed,
}

impl IssueFilter {
    fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    pub token: Option<String>,
    pub user_agent: String,
    pub max_pages: u32,
    pub partial_pages: PartialPagePolicy,
    pub timeout: Duration,
}

impl GitHubConfig {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
            partial_pages: PartialPagePolicy::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedIssues {
    pub issues: Vec<Issue>,
    pub pages: u32,
    pub partial: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub full_name: String,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub visibility: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub limit: u64,
    pub remaining: u64,
    pub reset: i64,
}

#[derive(Debug, Deserialize)]
struct RateLimitEnvelope {
    rate: RateLimitStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<AddItemData>,
    #[serde(default)]
    errors: Vec<GraphQlMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemData {
    add_project_v2_item_by_id: Option<AddItemPayload>,
}

#[derive(Debug, Deserialize)]
struct AddItemPayload {
    item: ProjectItem,
}

#[derive(Debug, Deserialize)]
struct ProjectItem {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlMessage {
    message: String,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Maps a non-success status to the error the dashboard reacts to. A 403 is
/// only a rate limit when GitHub reports no requests remaining.
pub fn classify(status: StatusCode, headers: &HeaderMap) -> Option<GitHubError> {
    if status.is_success() {
        return None;
    }
    let reset = header_str(headers, "x-ratelimit-reset").and_then(|value| value.parse().ok());
    let exhausted = header_str(headers, "x-ratelimit-remaining") == Some("0");
    let err = match status {
        StatusCode::UNAUTHORIZED => GitHubError::Authentication,
        StatusCode::TOO_MANY_REQUESTS => GitHubError::RateLimited { reset },
        StatusCode::FORBIDDEN if exhausted => GitHubError::RateLimited { reset },
        StatusCode::FORBIDDEN => GitHubError::Forbidden { message: None },
        StatusCode::NOT_FOUND => GitHubError::NotFound,
        other => GitHubError::Http {
            status: other.as_u16(),
        },
    };
    Some(err)
}

pub struct GitHubClient {
    http: Client,
    config: GitHubConfig,
    stored_token: RwLock<Option<String>>,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self, GitHubError> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            config,
            stored_token: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    pub fn set_stored_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.stored_token.write() {
            *slot = token.filter(|value| !value.trim().is_empty());
        }
    }

    /// Configured token first, then whatever was saved through the dashboard.
    pub fn token(&self) -> Option<String> {
        self.config
            .token
            .clone()
            .filter(|value| !value.is_empty())
            .or_else(|| self.stored_token.read().ok().and_then(|slot| slot.clone()))
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    fn require_token(&self) -> Result<(), GitHubError> {
        if self.has_token() {
            Ok(())
        } else {
            Err(GitHubError::MissingToken)
        }
    }

    fn repo_path(&self) -> String {
        format!("/repos/{}/{}", self.config.owner, self.config.repo)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.api_base.trim_end_matches('/'), path);
        let builder = self
            .http
            .request(method, url)
            .header(ACCEPT, ACCEPT_V3)
            .header("X-GitHub-Api-Version", API_VERSION);
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, GitHubError> {
        let response = builder.send().await?;
        let Some(err) = classify(response.status(), response.headers()) else {
            return Ok(response);
        };
        if let Some(reset) = err.reset_time() {
            warn!("rate limited, resets at {reset}");
        }
        match err {
            GitHubError::Forbidden { .. } => {
                let body = response.bytes().await.unwrap_or_default();
                let message = serde_json::from_slice::<ErrorBody>(&body)
                    .ok()
                    .and_then(|body| body.message);
                Err(GitHubError::Forbidden { message })
            }
            other => Err(other),
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GitHubError> {
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn fetch_page(&self, filter: IssueFilter, page: u32) -> Result<Vec<Issue>, GitHubError> {
        let per_page = PER_PAGE.to_string();
        let page_number = page.to_string();
        let builder = self
            .request(Method::GET, &format!("{}/issues", self.repo_path()))
            .query(&[
                ("state", filter.as_str()),
                ("per_page", per_page.as_str()),
                ("page", page_number.as_str()),
            ]);
        let response = self.send(builder).await?;
        let remaining = header_str(response.headers(), "x-ratelimit-remaining")
            .unwrap_or("?")
            .to_string();
        let issues: Vec<Issue> = Self::decode(response).await?;
        info!("fetched page {page}: {} issues, {remaining} requests remaining", issues.len());
        Ok(issues)
    }

    /// Walks the issue pages in order until a short page or the page ceiling.
    pub async fn fetch_issues(&self, filter: IssueFilter) -> Result<FetchedIssues, GitHubError> {
        let mut issues = Vec::new();
        let mut pages = 0;

        for page in 1..=self.config.max_pages {
            let batch = match self.fetch_page(filter, page).await {
                Ok(batch) => batch,
                Err(err)
                    if err.is_rate_limited()
                        && self.config.partial_pages == PartialPagePolicy::KeepPartial
                        && !issues.is_empty() =>
                {
                    warn!("rate limited after fetching {} issues, keeping partial result", issues.len());
                    return Ok(FetchedIssues {
                        issues,
                        pages,
                        partial: true,
                    });
                }
                Err(err) => return Err(err),
            };

            pages += 1;
            let short = batch.len() < PER_PAGE;
            issues.extend(batch);
            if short {
                break;
            }
        }

        info!("fetched {} issues from {}/{} in {pages} pages", issues.len(), self.config.owner, self.config.repo);
        Ok(FetchedIssues {
            issues,
            pages,
            partial: false,
        })
    }

    pub async fn repository(&self) -> Result<Repository, GitHubError> {
        let response = self.send(self.request(Method::GET, &self.repo_path())).await?;
        Self::decode(response).await
    }

    pub async fn rate_limit(&self) -> Result<RateLimitStatus, GitHubError> {
        let response = self.send(self.request(Method::GET, "/rate_limit")).await?;
        let envelope: RateLimitEnvelope = Self::decode(response).await?;
        Ok(envelope.rate)
    }

    pub async fn current_user(&self) -> Result<User, GitHubError> {
        self.require_token()?;
        let response = self.send(self.request(Method::GET, "/user")).await?;
        Self::decode(response).await
    }

    pub async fn close_issue(&self, number: u64) -> Result<Issue, GitHubError> {
        self.require_token()?;
        let builder = self
            .request(Method::PATCH, &format!("{}/issues/{number}", self.repo_path()))
            .json(&serde_json::json!({ "state": "closed" }));
        let response = self.send(builder).await?;
        Self::decode(response).await
    }

    pub async fn add_assignees(&self, number: u64, logins: &[String]) -> Result<(), GitHubError> {
        self.require_token()?;
        let builder = self
            .request(Method::POST, &format!("{}/issues/{number}/assignees", self.repo_path()))
            .json(&serde_json::json!({ "assignees": logins }));
        self.send(builder).await?;
        Ok(())
    }

    pub async fn add_project_item(&self, project_id: &str, content_id: &str) -> Result<String, GitHubError> {
        self.require_token()?;
        let builder = self.request(Method::POST, "/graphql").json(&serde_json::json!({
            "query": ADD_PROJECT_ITEM,
            "variables": { "projectId": project_id, "contentId": content_id },
        }));
        let response = self.send(builder).await?;
        let body: GraphQlResponse = Self::decode(response).await?;

        if !body.errors.is_empty() {
            let messages: Vec<_> = body.errors.into_iter().map(|err| err.message).collect();
            return Err(GitHubError::GraphQl(messages.join("; ")));
        }
        body.data
            .and_then(|data| data.add_project_v2_item_by_id)
            .map(|payload| payload.item.id)
            .ok_or_else(|| GitHubError::GraphQl("response carried no project item".to_string()))
    }
}
