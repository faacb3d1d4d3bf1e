//! Flock statistics for the local dashboard
//!
//! Date-keyed egg counts with the simple aggregates the dashboard shows.
//! Loaded from `flock.json` in the data directory; an absent or unreadable
//! log just renders empty.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Default)]
pub struct FlockLog {
    days: BTreeMap<NaiveDate, u32>,
}

impl FlockLog {
    pub fn load(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str::<BTreeMap<NaiveDate, u32>>(&content) {
            Ok(days) => Self { days },
            Err(e) => {
                tracing::warn!("Unreadable flock log at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn record(&mut self, date: NaiveDate, eggs: u32) {
        *self.days.entry(date).or_insert(0) += eggs;
    }

    pub fn daily(&self, date: NaiveDate) -> u32 {
        self.days.get(&date).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.days.values().map(|&n| u64::from(n)).sum()
    }

    /// Eggs over the 7 days ending at `today` (inclusive).
    pub fn trailing_week(&self, today: NaiveDate) -> u64 {
        let start = today - chrono::Duration::days(6);
        self.days
            .range(start..=today)
            .map(|(_, &n)| u64::from(n))
            .sum()
    }

    /// Plain-text dashboard body.
    pub fn render(&self, today: NaiveDate) -> String {
        let mut out = String::from("🐔 Flock dashboard\n");
        if self.days.is_empty() {
            out.push_str("  no records yet\n");
            return out;
        }
        out.push_str(&format!("  today:         {} eggs\n", self.daily(today)));
        out.push_str(&format!(
            "  last 7 days:   {} eggs\n",
            self.trailing_week(today)
        ));
        out.push_str(&format!("  all time:      {} eggs\n", self.total()));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn aggregates_by_date() {
        let mut log = FlockLog::default();
        log.record(d("2026-08-01"), 4);
        log.record(d("2026-08-01"), 2);
        log.record(d("2026-08-03"), 5);
        assert_eq!(log.daily(d("2026-08-01")), 6);
        assert_eq!(log.daily(d("2026-08-02")), 0);
        assert_eq!(log.total(), 11);
    }

    #[test]
    fn trailing_week_is_inclusive() {
        let mut log = FlockLog::default();
        log.record(d("2026-08-01"), 1);
        log.record(d("2026-08-07"), 2);
        log.record(d("2026-08-08"), 4);
        // Window 2026-08-02..=2026-08-08 excludes the first day.
        assert_eq!(log.trailing_week(d("2026-08-08")), 6);
    }

    #[test]
    fn renders_empty_log() {
        let log = FlockLog::default();
        assert!(log.render(d("2026-08-08")).contains("no records yet"));
    }

    #[test]
    fn load_tolerates_missing_file() {
        let log = FlockLog::load(Path::new("/nonexistent/flock.json"));
        assert_eq!(log.total(), 0);
    }
}
