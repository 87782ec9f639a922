//! Holiday-driven rescheduling.
//!
//! Marking a day as a holiday pushes every lesson on or after that day forward
//! so that nothing lands on the holiday, nothing lands on a weekend, and no two
//! originally distinct days end up merged. Lessons that share a day keep
//! sharing one.
//!
//! This engine uses a fixed Saturday + Sunday weekend regardless of the
//! Saturday policy the schedule was generated with.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::{DateChange, LessonPlan};

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// First weekday strictly after `date`.
pub fn next_working_day(date: NaiveDate) -> NaiveDate {
    date.iter_days()
        .skip(1)
        .find(|d| !is_weekend(*d))
        .unwrap_or(date)
}

/// Target of the single-lesson "push tomorrow" action.
///
/// Unlike [`redistribute_for_holiday`] this never cascades: other lessons on
/// the target day stay where they are.
pub fn push_to_next_working_day(date: NaiveDate) -> NaiveDate {
    next_working_day(date)
}

/// Compute the moves caused by declaring `holiday` a day off.
///
/// `items` should be the owner's lessons dated on or after `holiday`, sorted
/// by `(date, id)`. Earlier items are ignored and the input is re-sorted, so a
/// sloppy caller cannot break the ordering guarantees.
///
/// Each original-date group is placed on the earliest day that is
/// - not before its original date,
/// - strictly after the day given to the previous group,
/// - neither a weekend day nor the holiday itself.
///
/// Only items whose date actually changes are returned, which makes a second
/// run with the same holiday a no-op.
pub fn redistribute_for_holiday(holiday: NaiveDate, items: &[LessonPlan]) -> Vec<DateChange> {
    let mut in_scope: Vec<&LessonPlan> = items.iter().filter(|i| i.date >= holiday).collect();
    in_scope.sort_by_key(|i| (i.date, i.id));

    let mut last_assigned = holiday.pred_opt().unwrap_or(holiday);
    let mut changes = Vec::new();

    for group in in_scope.chunk_by(|a, b| a.date == b.date) {
        let original_date = group[0].date;
        let anchor = original_date
            .pred_opt()
            .unwrap_or(original_date)
            .max(last_assigned);

        let new_date = anchor
            .iter_days()
            .skip(1)
            .find(|d| *d != holiday && !is_weekend(*d))
            .unwrap_or(anchor);

        for item in group {
            if item.date != new_date {
                changes.push(DateChange::new(item.id, new_date));
            }
        }
        last_assigned = new_date;
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{LessonPlanId, OwnerId};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn lesson(id: i64, date: NaiveDate) -> LessonPlan {
        LessonPlan {
            id: LessonPlanId(id),
            owner_id: OwnerId::from("teacher-1"),
            date,
            subject: "Maths".into(),
            grade: "4".into(),
            topic: "Fractions".into(),
            content_type: "worksheet".into(),
            content: String::new(),
        }
    }

    #[test]
    fn test_next_working_day_skips_weekend() {
        // Friday -> Monday
        assert_eq!(next_working_day(d(6, 7)), d(6, 10));
        // Saturday -> Monday
        assert_eq!(next_working_day(d(6, 8)), d(6, 10));
        // Monday -> Tuesday
        assert_eq!(next_working_day(d(6, 10)), d(6, 11));
    }

    #[test]
    fn test_push_does_not_consider_holidays() {
        assert_eq!(push_to_next_working_day(d(6, 14)), d(6, 17));
    }

    #[test]
    fn test_empty_items_yield_no_changes() {
        assert!(redistribute_for_holiday(d(6, 10), &[]).is_empty());
    }

    #[test]
    fn test_saturday_holiday_example() {
        let items = vec![lesson(1, d(6, 8)), lesson(2, d(6, 8)), lesson(3, d(6, 10))];
        let changes = redistribute_for_holiday(d(6, 8), &items);

        assert_eq!(
            changes,
            vec![
                DateChange::new(LessonPlanId(1), d(6, 10)),
                DateChange::new(LessonPlanId(2), d(6, 10)),
                DateChange::new(LessonPlanId(3), d(6, 11)),
            ]
        );
    }

    #[test]
    fn test_weekday_holiday_cascades_adjacent_days() {
        // Holiday on Wednesday 06-12, lessons Wed, Thu, Fri.
        let items = vec![lesson(1, d(6, 12)), lesson(2, d(6, 13)), lesson(3, d(6, 14))];
        let changes = redistribute_for_holiday(d(6, 12), &items);

        assert_eq!(
            changes,
            vec![
                DateChange::new(LessonPlanId(1), d(6, 13)),
                DateChange::new(LessonPlanId(2), d(6, 14)),
                DateChange::new(LessonPlanId(3), d(6, 17)),
            ]
        );
    }

    #[test]
    fn test_distant_group_is_left_alone() {
        let items = vec![lesson(1, d(6, 10)), lesson(2, d(6, 20))];
        let changes = redistribute_for_holiday(d(6, 10), &items);
        assert_eq!(changes, vec![DateChange::new(LessonPlanId(1), d(6, 11))]);
    }

    #[test]
    fn test_items_before_holiday_are_ignored() {
        let items = vec![lesson(1, d(6, 5)), lesson(2, d(6, 10))];
        let changes = redistribute_for_holiday(d(6, 10), &items);
        assert_eq!(changes, vec![DateChange::new(LessonPlanId(2), d(6, 11))]);
    }

    #[test]
    fn test_weekend_lesson_after_holiday_moves_to_weekday() {
        // A lesson on a working Saturday is pushed off the weekend.
        let items = vec![lesson(1, d(6, 14)), lesson(2, d(6, 15))];
        let changes = redistribute_for_holiday(d(6, 14), &items);
        assert_eq!(
            changes,
            vec![
                DateChange::new(LessonPlanId(1), d(6, 17)),
                DateChange::new(LessonPlanId(2), d(6, 18)),
            ]
        );
    }

    #[test]
    fn test_unsorted_input_is_handled() {
        let items = vec![lesson(3, d(6, 13)), lesson(2, d(6, 12)), lesson(1, d(6, 12))];
        let changes = redistribute_for_holiday(d(6, 12), &items);
        assert_eq!(
            changes,
            vec![
                DateChange::new(LessonPlanId(1), d(6, 13)),
                DateChange::new(LessonPlanId(2), d(6, 13)),
                DateChange::new(LessonPlanId(3), d(6, 14)),
            ]
        );
    }
}
