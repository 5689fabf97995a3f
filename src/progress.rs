use crate::labels::{extract_coins, extract_xp};
use crate::models::{Issue, Notification, UserStats};

pub const XP_PER_LEVEL: u64 = 1000;
pub const MEMORY_COUNT: u32 = 49;

pub const SKILLS: &[&str] = &["Maya", "Unity", "Unreal", "Python", "React", "TCG Design"];

const ASSET_VALUES: &[(&str, u64)] = &[
    ("character-model", 120),
    ("environment", 150),
    ("animation", 95),
    ("script", 125),
    ("gui-tool", 180),
    ("tutorial", 97),
    ("tcg-card", 5),
];

const STORIES: &[(u32, &str)] = &[
    (1, "The Beginning - You stand at the threshold of creation..."),
    (2, "First Steps - The path forward becomes clear..."),
    (3, "Foundation - Stone by stone, the edifice rises..."),
];

const UNREVEALED_STORY: &str = "Story to be revealed...";

pub fn level(xp: u64) -> u64 {
    xp / XP_PER_LEVEL
}

pub fn progress_percent(xp: u64) -> u64 {
    (xp % XP_PER_LEVEL) / 10
}

/// Cumulative XP needed to restore fragment `id`. The first five are tuned
/// by hand; later fragments are spaced 1500 XP apart.
pub fn memory_threshold(id: u32) -> Option<u64> {
    match id {
        1 => Some(100),
        2 => Some(500),
        3 => Some(1000),
        4 => Some(2000),
        5 => Some(3500),
        6..=MEMORY_COUNT => Some(3500 + u64::from(id - 5) * 1500),
        _ => None,
    }
}

pub fn memory_story(id: u32) -> &'static str {
    STORIES
        .iter()
        .find(|(story_id, _)| *story_id == id)
        .map(|(_, story)| *story)
        .unwrap_or(UNREVEALED_STORY)
}

pub fn skill_tier(percent: u32) -> &'static str {
    match percent {
        0..=24 => "Novice",
        25..=49 => "Apprentice",
        50..=74 => "Journeyman",
        75..=99 => "Expert",
        _ => "Master",
    }
}

pub fn portfolio_value(issues: &[Issue]) -> u64 {
    issues
        .iter()
        .filter(|issue| !issue.is_open())
        .flat_map(|issue| {
            ASSET_VALUES
                .iter()
                .filter(|(asset, _)| issue.has_label(asset))
                .map(|(_, value)| *value)
        })
        .sum()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub xp: u64,
    pub coins: u64,
    pub unlocked: Vec<u32>,
    pub level_before: u64,
    pub level_after: u64,
}

impl CompletionReport {
    pub fn notifications(&self) -> Vec<Notification> {
        let mut notes = vec![Notification {
            kind: "reward",
            title: "Quest Complete!".to_string(),
            body: format!("+{} XP / +{} coins", self.xp, self.coins),
            duration_ms: 3000,
        }];
        if self.level_after > self.level_before {
            notes.push(Notification {
                kind: "level",
                title: "Level Up!".to_string(),
                body: format!("You reached level {}", self.level_after),
                duration_ms: 3000,
            });
        }
        notes.extend(self.unlocked.iter().map(|id| Notification {
            kind: "memory",
            title: "Memory Fragment Unlocked!".to_string(),
            body: format!("Memory #{id} has been restored"),
            duration_ms: 5000,
        }));
        notes
    }
}

impl UserStats {
    pub fn has_memory(&self, id: u32) -> bool {
        self.memories.contains(&id)
    }

    /// Appends every fragment whose threshold the current XP has reached.
    /// Returns only the ids that were not already restored.
    pub fn unlock_memories(&mut self) -> Vec<u32> {
        let mut unlocked = Vec::new();
        for id in 1..=MEMORY_COUNT {
            let Some(threshold) = memory_threshold(id) else {
                continue;
            };
            if self.xp >= threshold && !self.has_memory(id) {
                self.memories.push(id);
                unlocked.push(id);
            }
        }
        unlocked
    }

    pub fn record_completion(&mut self, xp: u64, coins: u64) -> CompletionReport {
        let level_before = level(self.xp);
        self.xp = self.xp.saturating_add(xp);
        self.coins = self.coins.saturating_add(coins);
        self.issues_closed = self.issues_closed.saturating_add(1);
        self.level = level(self.xp);
        let unlocked = self.unlock_memories();

        CompletionReport {
            xp,
            coins,
            unlocked,
            level_before,
            level_after: self.level,
        }
    }

    pub fn complete_issue(&mut self, issue: &Issue) -> CompletionReport {
        self.record_completion(extract_xp(&issue.labels), extract_coins(&issue.labels))
    }

    pub fn skill_percent(&self, skill: &str) -> u32 {
        self.skills.get(skill).copied().unwrap_or(0).min(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock;
    use crate::models::{IssueState, Label};

    #[test]
    fn level_and_progress_bar() {
        assert_eq!(level(2500), 2);
        assert_eq!(progress_percent(2500), 50);
        assert_eq!(level(999), 0);
        assert_eq!(progress_percent(999), 99);
        assert_eq!(level(0), 0);
        assert_eq!(progress_percent(1000), 0);
    }

    #[test]
    fn crossing_1000_unlocks_fragment_once() {
        let mut stats = UserStats {
            xp: 900,
            memories: vec![1, 2],
            ..UserStats::default()
        };

        let report = stats.record_completion(150, 75);
        assert_eq!(report.unlocked, vec![3]);
        assert_eq!(stats.memories, vec![1, 2, 3]);

        let again = stats.record_completion(10, 5);
        assert!(again.unlocked.is_empty());
        assert_eq!(stats.unlock_memories(), Vec::<u32>::new());
        assert_eq!(stats.memories.iter().filter(|id| **id == 3).count(), 1);
    }

    #[test]
    fn completion_updates_counters_and_notifies() {
        let mut stats = UserStats::default();
        let issue = &mock::generate(300..=300, IssueState::Open, "o", "r")[0];

        let report = stats.complete_issue(issue);
        assert_eq!(report.xp, 250);
        assert_eq!(report.coins, 125);
        assert_eq!(stats.xp, 250);
        assert_eq!(stats.coins, 125);
        assert_eq!(stats.issues_closed, 1);
        assert_eq!(stats.level, 0);
        assert_eq!(report.unlocked, vec![1]);

        let kinds: Vec<_> = report.notifications().iter().map(|note| note.kind).collect();
        assert_eq!(kinds, vec!["reward", "memory"]);
    }

    #[test]
    fn level_up_is_announced() {
        let mut stats = UserStats {
            xp: 1950,
            memories: vec![1, 2, 3],
            ..UserStats::default()
        };
        let report = stats.record_completion(100, 10);
        assert_eq!(report.level_after, 2);
        assert_eq!(report.unlocked, vec![4]);
        assert!(report.notifications().iter().any(|note| note.kind == "level"));
    }

    #[test]
    fn thresholds_cover_every_fragment() {
        let mut previous = 0;
        for id in 1..=MEMORY_COUNT {
            let threshold = memory_threshold(id).expect("threshold");
            assert!(threshold > previous);
            previous = threshold;
        }
        assert_eq!(memory_threshold(MEMORY_COUNT + 1), None);
        assert_eq!(memory_story(2), "First Steps - The path forward becomes clear...");
        assert_eq!(memory_story(40), "Story to be revealed...");
    }

    #[test]
    fn skill_tiers_and_portfolio() {
        assert_eq!(skill_tier(0), "Novice");
        assert_eq!(skill_tier(25), "Apprentice");
        assert_eq!(skill_tier(74), "Journeyman");
        assert_eq!(skill_tier(99), "Expert");
        assert_eq!(skill_tier(100), "Master");

        let mut closed = mock::generate(1..=1, IssueState::Closed, "o", "r");
        closed[0].labels.push(Label::new("gui-tool", "000000"));
        closed[0].labels.push(Label::new("tutorial", "000000"));
        let mut open = mock::generate(2..=2, IssueState::Open, "o", "r");
        open[0].labels.push(Label::new("gui-tool", "000000"));
        closed.extend(open);
        assert_eq!(portfolio_value(&closed), 277);
    }
}
