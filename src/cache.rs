use crate::models::{CachedPayload, Issue};
use std::time::Duration;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

impl CachedPayload {
    pub fn new(issues: Vec<Issue>, now_ms: i64) -> Self {
        Self {
            issues,
            timestamp: now_ms,
        }
    }

    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.timestamp)
    }

    pub fn is_fresh(&self, now_ms: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.age_ms(now_ms) < ttl_ms
    }

    /// Issues from a cache entry younger than `ttl`. An empty entry counts as
    /// absent.
    pub fn fresh_issues(&self, now_ms: i64, ttl: Duration) -> Option<&[Issue]> {
        if self.is_fresh(now_ms, ttl) && !self.issues.is_empty() {
            Some(&self.issues)
        } else {
            None
        }
    }
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
