//! Rolling calendar-day high tracking.
//!
//! The tracker consumes bars in timestamp order and maintains a map from
//! calendar day to that day's maximum high. A day's entry is committed only
//! when the first bar of the next day arrives; until then the running max of
//! the still-open day is held separately and still participates in lookback
//! queries. Missing days contribute a high of 0.

use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct DayHighTracker {
    committed: HashMap<NaiveDate, f64>,
    current_day: Option<NaiveDate>,
    max_seen_today: f64,
}

impl DayHighTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next bar's day and high. Rolling over to a new day commits
    /// the previous day's max.
    pub fn observe(&mut self, date: NaiveDate, high: f64) {
        if self.current_day != Some(date) {
            if let Some(prev) = self.current_day {
                self.committed.insert(prev, self.max_seen_today);
            }
            self.current_day = Some(date);
            self.max_seen_today = 0.0;
        }
        if high > self.max_seen_today {
            self.max_seen_today = high;
        }
    }

    /// Maximum high over the still-open day plus the prior `days` committed
    /// calendar days. Returns 0 when nothing has been observed; callers
    /// treat a non-positive result as "no valid lookback high".
    pub fn lookback_high(&self, days: u32) -> f64 {
        let Some(today) = self.current_day else {
            return 0.0;
        };
        let mut max_high = self.max_seen_today;
        for back in 1..=i64::from(days) {
            let day = today - Duration::days(back);
            if let Some(&high) = self.committed.get(&day) {
                if high > max_high {
                    max_high = high;
                }
            }
        }
        max_high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn empty_tracker_has_no_high() {
        let tracker = DayHighTracker::new();
        assert_eq!(tracker.lookback_high(7), 0.0);
    }

    #[test]
    fn open_day_participates_in_lookback() {
        let mut tracker = DayHighTracker::new();
        tracker.observe(day(1), 105.0);
        // Day 1 is not committed yet but its running max is visible.
        assert_eq!(tracker.lookback_high(7), 105.0);
    }

    #[test]
    fn intraday_bars_accumulate_running_max() {
        let mut tracker = DayHighTracker::new();
        tracker.observe(day(1), 100.0);
        tracker.observe(day(1), 107.0);
        tracker.observe(day(1), 103.0);
        assert_eq!(tracker.lookback_high(7), 107.0);
    }

    #[test]
    fn rollover_commits_previous_day() {
        let mut tracker = DayHighTracker::new();
        tracker.observe(day(1), 110.0);
        tracker.observe(day(2), 95.0);
        // Day 1 committed at 110, day 2 running at 95.
        assert_eq!(tracker.lookback_high(7), 110.0);
    }

    #[test]
    fn lookback_window_excludes_older_days() {
        let mut tracker = DayHighTracker::new();
        tracker.observe(day(1), 200.0);
        for d in 2..=9 {
            tracker.observe(day(d), 100.0);
        }
        // Day 9 is open; committed days 2..=8 are within the 7-day window,
        // day 1 (high 200) is 8 days back and no longer visible.
        assert_eq!(tracker.lookback_high(7), 100.0);
    }

    #[test]
    fn gap_days_contribute_zero() {
        let mut tracker = DayHighTracker::new();
        tracker.observe(day(1), 120.0);
        tracker.observe(day(5), 90.0);
        // Days 2 to 4 are missing; day 1 is 4 days back and still counts.
        assert_eq!(tracker.lookback_high(7), 120.0);
        assert_eq!(tracker.lookback_high(3), 90.0);
    }

    #[test]
    fn same_day_spike_can_set_its_own_baseline() {
        let mut tracker = DayHighTracker::new();
        tracker.observe(day(1), 100.0);
        tracker.observe(day(2), 150.0);
        // The day-2 spike dominates even though day 2 is still open.
        assert_eq!(tracker.lookback_high(7), 150.0);
    }
}
