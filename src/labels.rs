use crate::models::{Issue, Label};

pub const DEFAULT_XP: u64 = 25;
pub const DEFAULT_COINS: u64 = 10;
pub const DEFAULT_SPRINT: u32 = 1;

/// Category tags in the order their sections appear on the board.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("epic", "Epics"),
    ("user-story", "User Stories"),
    ("task", "Tasks"),
    ("micro-task", "Micro-Tasks"),
    ("documentation", "Documentation"),
    ("core-systems", "Core Systems"),
    ("combat", "Combat"),
    ("environment", "Environment"),
    ("ui-ux", "UI / UX"),
    ("save-system", "Save System"),
    ("audio-polish", "Audio & Polish"),
];

pub const OTHER_CATEGORY: &str = "other";

fn prefixed_number<T: std::str::FromStr>(labels: &[Label], prefix: &str) -> Option<T> {
    labels
        .iter()
        .find(|label| label.name.starts_with(prefix))
        .and_then(|label| label.name[prefix.len()..].trim().parse().ok())
}

pub fn extract_xp(labels: &[Label]) -> u64 {
    prefixed_number(labels, "xp-").unwrap_or(DEFAULT_XP)
}

pub fn extract_coins(labels: &[Label]) -> u64 {
    prefixed_number(labels, "coins-").unwrap_or(DEFAULT_COINS)
}

pub fn extract_sprint(labels: &[Label]) -> u32 {
    prefixed_number(labels, "sprint-").unwrap_or(DEFAULT_SPRINT)
}

pub fn category_of(issue: &Issue) -> &'static str {
    CATEGORIES
        .iter()
        .map(|(tag, _)| *tag)
        .find(|tag| issue.has_label(tag))
        .unwrap_or(OTHER_CATEGORY)
}

pub fn category_title(tag: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|(candidate, _)| *candidate == tag)
        .map(|(_, title)| *title)
        .unwrap_or("Other")
}
