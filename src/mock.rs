use crate::models::{Issue, IssueState, Label};
use std::ops::RangeInclusive;

pub const CLOSED_RANGE: RangeInclusive<u64> = 1..=119;
pub const OPEN_RANGE: RangeInclusive<u64> = 120..=1019;
const CLOSED_NUMBER_OFFSET: u64 = 1000;

pub fn title_for(index: u64) -> String {
    let text = match index {
        0..=50 => format!("Create initial documentation for module {index}"),
        51..=100 => format!("Setup project structure component {}", index - 50),
        101..=180 => format!("Implement movement system part {}", index - 100),
        181..=260 => format!("Build inventory component {}", index - 180),
        261..=340 => format!("Create melee combat feature {}", index - 260),
        341..=420 => format!("Implement magic system element {}", index - 340),
        421..=500 => format!("Design environment asset {}", index - 420),
        501..=580 => format!("Create weather effect {}", index - 500),
        581..=640 => format!("Build character customization {}", index - 580),
        641..=720 => format!("Design UI element {}", index - 640),
        721..=760 => format!("Create HUD component {}", index - 720),
        761..=820 => format!("Implement character progression {}", index - 760),
        821..=880 => format!("Build save/load functionality {}", index - 820),
        881..=900 => format!("Add cloud save support {}", index - 880),
        901..=960 => format!("Create sound effect {}", index - 900),
        _ => format!("Apply final polish task {}", index - 960),
    };
    format!("[ISSUE-{index:04}] {text}")
}

fn reward_tier(index: u64) -> (u64, u64) {
    match index {
        0..=100 => (50, 25),
        101..=260 => (150, 75),
        261..=420 => (250, 125),
        421..=580 => (200, 100),
        581..=760 => (100, 50),
        761..=900 => (200, 100),
        _ => (150, 75),
    }
}

fn category_label(index: u64) -> Label {
    match index {
        0..=100 => Label::new("documentation", "0075ca"),
        101..=260 => Label::new("core-systems", "6b46c1"),
        261..=420 => Label::new("combat", "d73a4a"),
        421..=580 => Label::new("environment", "0e8a16"),
        581..=760 => Label::new("ui-ux", "ff6b35"),
        761..=900 => Label::new("save-system", "fbca04"),
        _ => Label::new("audio-polish", "e99695"),
    }
}

pub fn labels_for(index: u64) -> Vec<Label> {
    let (xp, coins) = reward_tier(index);
    vec![
        Label::new("sprint-1", "0e8a16"),
        Label::new("issue", "d73a4a"),
        Label::new(format!("xp-{xp}"), "ffd700"),
        Label::new(format!("coins-{coins}"), "ff6b35"),
        category_label(index),
    ]
}

/// Synthetic issues for an index range. Closed issues are numbered above the
/// open range so the two never collide.
pub fn generate(range: RangeInclusive<u64>, state: IssueState, owner: &str, repo: &str) -> Vec<Issue> {
    range
        .map(|index| {
            let number = match state {
                IssueState::Open => index,
                IssueState::Closed => CLOSED_NUMBER_OFFSET + index,
            };
            Issue {
                number,
                title: title_for(index),
                state,
                labels: labels_for(index),
                html_url: format!("https://github.com/{owner}/{repo}/issues/{index}"),
            }
        })
        .collect()
}

pub fn full_set(owner: &str, repo: &str) -> Vec<Issue> {
    let mut issues = generate(CLOSED_RANGE, IssueState::Closed, owner, repo);
    issues.extend(generate(OPEN_RANGE, IssueState::Open, owner, repo));
    issues
}
