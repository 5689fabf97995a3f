use crate::acquire::FeedOutcome;
use crate::labels::{category_of, category_title, extract_coins, extract_sprint, extract_xp, CATEGORIES, OTHER_CATEGORY};
use crate::models::{DataSource, Issue, IssueState, Label, UserStats};
use crate::progress::{level, portfolio_value, progress_percent, skill_tier, MEMORY_COUNT, SKILLS};
use crate::state::Feed;
use chrono::DateTime;
use serde::Serialize;

/// Hourly request budgets GitHub grants with and without a token.
pub const AUTHENTICATED_RATE: u32 = 5000;
pub const ANONYMOUS_RATE: u32 = 60;

#[derive(Debug, Serialize)]
pub struct Totals {
    pub total_xp: u64,
    pub total_coins: u64,
    pub open_issues: usize,
}

#[derive(Debug, Serialize)]
pub struct PlayerView {
    pub level: u64,
    pub xp: u64,
    pub progress_percent: u64,
    pub coins: u64,
    pub issues_closed: u64,
    pub portfolio_value: u64,
}

#[derive(Debug, Serialize)]
pub struct MemorySlot {
    pub id: u32,
    pub unlocked: bool,
}

#[derive(Debug, Serialize)]
pub struct SkillView {
    pub name: &'static str,
    pub percent: u32,
    pub tier: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Card {
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    pub sprint: u32,
    pub xp: u64,
    pub coins: u64,
    pub labels: Vec<Label>,
    pub html_url: String,
}

#[derive(Debug, Serialize)]
pub struct Section {
    pub tag: &'static str,
    pub title: &'static str,
    pub cards: Vec<Card>,
}

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub source: DataSource,
    pub status: String,
    pub partial: bool,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub respawn_at: Option<String>,
    pub authenticated: bool,
    pub auth_status: &'static str,
    pub hourly_limit: u32,
    pub totals: Totals,
    pub player: PlayerView,
    pub memories: Vec<MemorySlot>,
    pub skills: Vec<SkillView>,
    pub sections: Vec<Section>,
}

fn card(issue: &Issue) -> Card {
    Card {
        number: issue.number,
        title: issue.title.clone(),
        state: issue.state,
        sprint: extract_sprint(&issue.labels),
        xp: extract_xp(&issue.labels),
        coins: extract_coins(&issue.labels),
        labels: issue.labels.clone(),
        html_url: issue.html_url.clone(),
    }
}

fn sections(open: &[&Issue]) -> Vec<Section> {
    let tags = CATEGORIES.iter().map(|(tag, _)| *tag).chain([OTHER_CATEGORY]);
    tags.filter_map(|tag| {
        let cards: Vec<Card> = open
            .iter()
            .filter(|issue| category_of(issue) == tag)
            .map(|issue| card(issue))
            .collect();
        (!cards.is_empty()).then(|| Section {
            tag,
            title: category_title(tag),
            cards,
        })
    })
    .collect()
}

fn status_text(feed: &Feed) -> String {
    let count = feed.issues.len();
    match &feed.outcome {
        None => "Not fetched".to_string(),
        Some(FeedOutcome::Live { partial: false }) => format!("Live ({count} issues)"),
        Some(FeedOutcome::Live { partial: true }) => format!("Live, partial ({count} issues)"),
        Some(FeedOutcome::Cached { .. }) => format!("Cached ({count} issues)"),
        Some(FeedOutcome::Mock) => "Using Cache".to_string(),
        Some(FeedOutcome::Failed { .. }) => "Error".to_string(),
    }
}

fn notice_text(feed: &Feed) -> Option<String> {
    let count = feed.issues.len();
    match &feed.outcome {
        Some(FeedOutcome::Cached { age_ms }) => Some(format!(
            "Using cached data. Showing {count} real project issues from local cache ({} min old)",
            age_ms / 60_000
        )),
        Some(FeedOutcome::Mock) => Some(
            "Using cached data (GitHub unavailable). Data shows simulated issues for demonstration"
                .to_string(),
        ),
        Some(FeedOutcome::Live { partial: true }) => Some(format!(
            "GitHub rate limit reached mid-fetch. Showing the first {count} issues"
        )),
        _ => None,
    }
}

fn respawn_time(reset_secs: i64) -> Option<String> {
    DateTime::from_timestamp(reset_secs, 0).map(|at| at.format("%H:%M:%S UTC").to_string())
}

/// Everything the page shows, derived from the current feed and the
/// player's stats.
pub fn build_board(feed: &Feed, stats: &UserStats, authenticated: bool) -> BoardResponse {
    let open: Vec<&Issue> = feed.issues.iter().filter(|issue| issue.is_open()).collect();

    let totals = Totals {
        total_xp: open.iter().map(|issue| extract_xp(&issue.labels)).sum(),
        total_coins: open.iter().map(|issue| extract_coins(&issue.labels)).sum(),
        open_issues: open.len(),
    };

    let player = PlayerView {
        level: level(stats.xp),
        xp: stats.xp,
        progress_percent: progress_percent(stats.xp),
        coins: stats.coins,
        issues_closed: stats.issues_closed,
        portfolio_value: portfolio_value(&feed.issues),
    };

    let memories = (1..=MEMORY_COUNT)
        .map(|id| MemorySlot {
            id,
            unlocked: stats.has_memory(id),
        })
        .collect();

    let skills = SKILLS
        .iter()
        .map(|&name| {
            let percent = stats.skill_percent(name);
            SkillView {
                name,
                percent,
                tier: skill_tier(percent),
            }
        })
        .collect();

    let (error, respawn_at) = match &feed.outcome {
        Some(FeedOutcome::Failed {
            reason,
            rate_limit_reset,
        }) => (Some(reason.clone()), rate_limit_reset.and_then(respawn_time)),
        _ => (None, None),
    };

    BoardResponse {
        source: feed.source(),
        status: status_text(feed),
        partial: feed.is_partial(),
        notice: notice_text(feed),
        error,
        respawn_at,
        authenticated,
        auth_status: if authenticated {
            "Authenticated (5000/hr)"
        } else {
            "No Auth (60/hr)"
        },
        hourly_limit: if authenticated { AUTHENTICATED_RATE } else { ANONYMOUS_RATE },
        totals,
        player,
        memories,
        skills,
        sections: sections(&open),
    }
}
