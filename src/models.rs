use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub color: String,
}

impl Label {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub html_url: String,
}

impl Issue {
    pub fn is_open(&self) -> bool {
        self.state == IssueState::Open
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| label.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPayload {
    pub issues: Vec<Issue>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub xp: u64,
    pub coins: u64,
    pub level: u64,
    pub issues_closed: u64,
    #[serde(default)]
    pub memories: Vec<u32>,
    #[serde(default)]
    pub skills: BTreeMap<String, u32>,
}

/// Everything the dashboard keeps between runs, laid out under the same keys
/// the browser build used in local storage.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(rename = "github_issues_cache", default, skip_serializing_if = "Option::is_none")]
    pub issue_cache: Option<CachedPayload>,
    #[serde(rename = "shadowedRealmsStats", default)]
    pub stats: UserStats,
    #[serde(rename = "github_token", default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    NotFetched,
    Live,
    Cached,
    Mock,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub kind: &'static str,
    pub title: String,
    pub body: String,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub issue: u64,
    pub xp: u64,
    pub coins: u64,
    pub level: u64,
    pub unlocked: Vec<u32>,
    pub notifications: Vec<Notification>,
    pub stats: UserStats,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub issue: u64,
    pub assignee: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct IssuesResponse {
    pub source: DataSource,
    pub partial: bool,
    pub count: usize,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Serialize)]
pub struct MemoryResponse {
    pub id: u32,
    pub title: String,
    pub story: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub token_configured: bool,
    pub repository: Option<String>,
    pub open_issues: Option<u64>,
    pub visibility: Option<String>,
    pub rate_limit: Option<crate::github::RateLimitStatus>,
    pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ProjectItemRequest {
    pub project_id: String,
    pub content_id: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectItemResponse {
    pub item_id: String,
}
