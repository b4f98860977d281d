//! Date bucketing for display.
//!
//! Tasks are partitioned by calendar date. Anything before `today` collapses
//! into a single [`DateKey::Past`] bucket. Within a bucket tasks are ordered
//! by their full timestamp.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::task::Task;

/// Bucket key: a calendar day, or the overflow bucket for earlier days.
///
/// Orders as days ascending followed by `Past`, which is also the order the
/// buckets are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateKey {
    Day(NaiveDate),
    Past,
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateKey::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            DateKey::Past => f.write_str("past"),
        }
    }
}

/// Tasks grouped by [`DateKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskGroups {
    buckets: BTreeMap<DateKey, Vec<Task>>,
}

impl TaskGroups {
    pub fn get(&self, key: &DateKey) -> Option<&[Task]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    /// Day buckets (today and later), ascending.
    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, &[Task])> {
        self.buckets.iter().filter_map(|(key, tasks)| match key {
            DateKey::Day(date) => Some((*date, tasks.as_slice())),
            DateKey::Past => None,
        })
    }

    /// The overflow bucket, empty if no task is in the past.
    pub fn past(&self) -> &[Task] {
        self.get(&DateKey::Past).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DateKey, &[Task])> {
        self.buckets.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &DateKey> {
        self.buckets.keys()
    }

    /// Total number of tasks across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<DateKey, Vec<Task>> {
        self.buckets
    }
}

/// Group tasks by their UTC calendar date.
pub fn group_by_date(tasks: &[Task], today: NaiveDate) -> TaskGroups {
    group_by_date_in(tasks, today, &Utc)
}

/// Group tasks by their calendar date in `tz`.
///
/// Bucket choice compares dates only: a task at 00:00 on `today` is a
/// today task, a task at 23:59 yesterday is past.
pub fn group_by_date_in<Tz: TimeZone>(tasks: &[Task], today: NaiveDate, tz: &Tz) -> TaskGroups {
    let mut buckets: BTreeMap<DateKey, Vec<Task>> = BTreeMap::new();

    for task in tasks {
        let day = task.date.with_timezone(tz).date_naive();
        let key = if day < today {
            DateKey::Past
        } else {
            DateKey::Day(day)
        };
        buckets.entry(key).or_default().push(task.clone());
    }

    for bucket in buckets.values_mut() {
        bucket.sort_by_key(|task| task.date);
    }

    TaskGroups { buckets }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::*;

    fn make_task(id: i64, title: &str, y: i32, m: u32, d: u32, h: u32, min: u32) -> Task {
        Task {
            id,
            title: title.into(),
            date: Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap(),
            completed: false,
            synced: true,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_past_and_today_buckets() {
        let tasks = vec![
            make_task(1, "A", 2024, 6, 9, 10, 0),
            make_task(3, "C", 2024, 6, 10, 18, 0),
            make_task(2, "B", 2024, 6, 10, 8, 0),
        ];

        let groups = group_by_date(&tasks, day(2024, 6, 10));

        assert_eq!(titles(groups.past()), vec!["A"]);
        assert_eq!(
            titles(groups.get(&DateKey::Day(day(2024, 6, 10))).unwrap()),
            vec!["B", "C"]
        );
        assert_eq!(groups.keys().count(), 2);
    }

    #[test]
    fn test_yesterday_late_evening_is_past() {
        let tasks = vec![make_task(1, "late", 2024, 6, 9, 23, 59)];
        let groups = group_by_date(&tasks, day(2024, 6, 10));
        assert_eq!(groups.past().len(), 1);
        assert_eq!(groups.days().count(), 0);
    }

    #[test]
    fn test_midnight_belongs_to_today() {
        let tasks = vec![make_task(1, "midnight", 2024, 6, 10, 0, 0)];
        let groups = group_by_date(&tasks, day(2024, 6, 10));
        assert!(groups.past().is_empty());
        assert_eq!(groups.get(&DateKey::Day(day(2024, 6, 10))).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_input() {
        let groups = group_by_date(&[], day(2024, 6, 10));
        assert!(groups.is_empty());
        assert_eq!(groups.len(), 0);
        assert!(groups.past().is_empty());
    }

    #[test]
    fn test_no_task_dropped_or_duplicated() {
        let tasks: Vec<Task> = (0..40)
            .map(|i| make_task(i, "t", 2024, 6, 1 + (i as u32 % 20), (i as u32 * 7) % 24, 0))
            .collect();

        let groups = group_by_date(&tasks, day(2024, 6, 12));

        assert_eq!(groups.len(), tasks.len());
        let mut ids: Vec<i64> = groups.iter().flat_map(|(_, ts)| ts.iter().map(|t| t.id)).collect();
        ids.sort();
        assert_eq!(ids, (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn test_day_buckets_sorted_by_timestamp() {
        let tasks = vec![
            make_task(1, "late", 2024, 6, 11, 22, 0),
            make_task(2, "early", 2024, 6, 11, 6, 0),
            make_task(3, "noon", 2024, 6, 11, 12, 0),
            make_task(4, "next", 2024, 6, 12, 1, 0),
        ];

        let groups = group_by_date(&tasks, day(2024, 6, 10));

        for (_, bucket) in groups.days() {
            assert!(bucket.windows(2).all(|w| w[0].date <= w[1].date));
        }
        let days: Vec<NaiveDate> = groups.days().map(|(d, _)| d).collect();
        assert_eq!(days, vec![day(2024, 6, 11), day(2024, 6, 12)]);
    }

    #[test]
    fn test_past_bucket_sorted_by_timestamp() {
        let tasks = vec![
            make_task(1, "last week evening", 2024, 6, 3, 21, 0),
            make_task(2, "yesterday", 2024, 6, 9, 7, 30),
            make_task(3, "last month", 2024, 5, 20, 12, 0),
            make_task(4, "last week morning", 2024, 6, 3, 8, 15),
            make_task(5, "today", 2024, 6, 10, 9, 0),
        ];

        let groups = group_by_date(&tasks, day(2024, 6, 10));

        let ids: Vec<i64> = groups.past().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 4, 1, 2]);
        assert!(groups.past().windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn test_past_renders_last() {
        let tasks = vec![
            make_task(1, "old", 2024, 5, 1, 9, 0),
            make_task(2, "soon", 2024, 7, 1, 9, 0),
        ];
        let groups = group_by_date(&tasks, day(2024, 6, 10));
        let keys: Vec<String> = groups.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["2024-07-01", "past"]);
    }

    #[test]
    fn test_timezone_shifts_calendar_day() {
        // 01:30 UTC on the 10th is still the 9th three hours west.
        let tasks = vec![make_task(1, "A", 2024, 6, 10, 1, 30)];
        let west = FixedOffset::west_opt(3 * 3600).unwrap();

        let groups = group_by_date_in(&tasks, day(2024, 6, 10), &west);
        assert_eq!(groups.past().len(), 1);

        let groups = group_by_date(&tasks, day(2024, 6, 10));
        assert!(groups.past().is_empty());
    }
}
