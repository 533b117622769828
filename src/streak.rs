//! Daily study streak.
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// Counts consecutive calendar days with at least one study event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyStreak {
    /// Current streak length in days
    pub count: u32,
    /// Day of the most recent study event
    pub last_studied: Option<NaiveDate>,
}

impl StudyStreak {
    pub fn new(count: u32, last_studied: Option<NaiveDate>) -> Self {
        Self {
            count,
            last_studied,
        }
    }

    /// Records a study event on `today`.
    ///
    /// Same day: unchanged. The day after the last event: +1. Anything else,
    /// including a `today` earlier than the last event: back to 1.
    ///
    /// Returns whether the streak changed.
    pub fn record(&mut self, today: NaiveDate) -> bool {
        let next = match self.last_studied {
            Some(last) if last == today => return false,
            Some(last) if last.succ_opt() == Some(today) => self.count.saturating_add(1),
            _ => 1,
        };

        debug!(
            "Study streak {} -> {} (last studied {:?}, today {})",
            self.count, next, self.last_studied, today
        );
        self.count = next;
        self.last_studied = Some(today);
        true
    }
}
