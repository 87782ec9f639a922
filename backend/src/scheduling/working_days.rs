use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::time::{parse_date, FormatError};

/// A closed calendar range plus the school's Saturday policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Whether Saturday is a working day at all.
    pub saturdays_working: bool,
    /// Drop every second Saturday of the window even when Saturdays work.
    pub second_saturday_off: bool,
}

impl SchedulingWindow {
    /// Build a window, rejecting `start_date > end_date`.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        saturdays_working: bool,
        second_saturday_off: bool,
    ) -> Result<Self, FormatError> {
        if start_date > end_date {
            return Err(FormatError::InvertedRange {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
            saturdays_working,
            second_saturday_off,
        })
    }

    /// Build a window from ISO date strings.
    pub fn parse(
        start_date: &str,
        end_date: &str,
        saturdays_working: bool,
        second_saturday_off: bool,
    ) -> Result<Self, FormatError> {
        Self::new(
            parse_date(start_date)?,
            parse_date(end_date)?,
            saturdays_working,
            second_saturday_off,
        )
    }

    /// Ordered working days of this window.
    pub fn working_days(&self) -> Vec<NaiveDate> {
        compute_working_days(
            self.start_date,
            self.end_date,
            self.saturdays_working,
            self.second_saturday_off,
        )
    }
}

/// Enumerate the days of `[start_date, end_date]` on which lessons happen.
///
/// Sundays never count. Saturdays count only when `saturdays_working`; with
/// `second_saturday_off` the 2nd, 4th, ... Saturday inside the window is also
/// skipped. Returns an empty list for an inverted range.
pub fn compute_working_days(
    start_date: NaiveDate,
    end_date: NaiveDate,
    saturdays_working: bool,
    second_saturday_off: bool,
) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut saturday_count = 0u32;

    for day in start_date.iter_days().take_while(|d| *d <= end_date) {
        match day.weekday() {
            Weekday::Sun => continue,
            Weekday::Sat => {
                if !saturdays_working {
                    continue;
                }
                saturday_count += 1;
                if second_saturday_off && saturday_count % 2 == 0 {
                    continue;
                }
            }
            _ => {}
        }
        days.push(day);
    }

    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_weekdays_only_when_saturdays_off() {
        // 2024-06-03 is a Monday.
        let days = compute_working_days(d(2024, 6, 3), d(2024, 6, 9), false, false);
        assert_eq!(days, (3..=7).map(|day| d(2024, 6, day)).collect::<Vec<_>>());
    }

    #[test]
    fn test_all_saturdays_when_second_saturday_kept() {
        let days = compute_working_days(d(2024, 6, 1), d(2024, 6, 16), true, false);
        assert!(days.contains(&d(2024, 6, 1)));
        assert!(days.contains(&d(2024, 6, 8)));
        assert!(days.contains(&d(2024, 6, 15)));
        assert!(!days.contains(&d(2024, 6, 2)));
    }

    #[test]
    fn test_window_example_drops_sundays_and_second_saturday() {
        let days = compute_working_days(d(2024, 6, 1), d(2024, 6, 10), true, true);
        let expected: Vec<_> = [1, 3, 4, 5, 6, 7, 10]
            .into_iter()
            .map(|day| d(2024, 6, day))
            .collect();
        assert_eq!(days, expected);
    }

    #[test]
    fn test_single_sunday_window_is_empty() {
        assert!(compute_working_days(d(2024, 6, 2), d(2024, 6, 2), true, false).is_empty());
    }

    #[test]
    fn test_inverted_range_is_empty() {
        assert!(compute_working_days(d(2024, 6, 10), d(2024, 6, 1), true, true).is_empty());
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        let err = SchedulingWindow::new(d(2024, 6, 10), d(2024, 6, 1), true, true).unwrap_err();
        assert!(matches!(err, FormatError::InvertedRange { .. }));
    }

    #[test]
    fn test_window_parse_reports_bad_date() {
        let err = SchedulingWindow::parse("2024-06-01", "June 10", false, false).unwrap_err();
        assert!(matches!(err, FormatError::InvalidDate { .. }));
    }

    #[test]
    fn test_window_working_days_matches_free_function() {
        let window = SchedulingWindow::parse("2024-06-01", "2024-06-30", true, true).unwrap();
        assert_eq!(
            window.working_days(),
            compute_working_days(d(2024, 6, 1), d(2024, 6, 30), true, true)
        );
    }
}
