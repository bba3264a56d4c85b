use chrono::{Days, NaiveDate};

use crate::task::Task;
use super::{WeekAnchor, DAYS_PER_WEEK};

/// One day of a [`Week`]
#[derive(Clone, Debug)]
pub struct DayBucket<'a> {
    date: NaiveDate,
    is_today: bool,
    tasks: Vec<&'a Task>,
}

impl<'a> DayBucket<'a> {
    pub fn date(&self) -> NaiveDate { self.date }
    pub fn is_today(&self) -> bool { self.is_today }
    /// The tasks created on that day, in input order
    pub fn tasks(&self) -> &[&'a Task] { &self.tasks }

    /// e.g. `Jan 7`
    pub fn label(&self) -> String {
        self.date.format("%b %-d").to_string()
    }
}

/// Seven consecutive days, starting at a week anchor
#[derive(Clone, Debug)]
pub struct Week<'a> {
    days: Vec<DayBucket<'a>>,
}

impl<'a> Week<'a> {
    pub fn days(&self) -> &[DayBucket<'a>] {
        &self.days
    }

    pub fn start(&self) -> NaiveDate {
        self.days[0].date
    }

    pub fn end(&self) -> NaiveDate {
        self.days[self.days.len() - 1].date
    }

    /// e.g. `Jan 7 - Jan 13`
    pub fn range_label(&self) -> String {
        format!("{} - {}", self.start().format("%b %-d"), self.end().format("%b %-d"))
    }

    /// How many tasks this week holds
    pub fn task_count(&self) -> usize {
        self.days.iter().map(|d| d.tasks.len()).sum()
    }
}

/// Spread `tasks` over the seven days starting at `anchor`.
///
/// Each task whose creation date falls within the week lands in exactly one bucket, the others are left out.
pub fn project<'a, I>(tasks: I, anchor: &WeekAnchor, today: NaiveDate) -> Week<'a>
where
    I: IntoIterator<Item = &'a Task>,
{
    let start = anchor.start();
    // The anchor only ever starts weeks that fit in the calendar
    let mut days: Vec<DayBucket<'a>> = (0..DAYS_PER_WEEK as u64)
        .filter_map(|offset| start.checked_add_days(Days::new(offset)))
        .map(|date| DayBucket { date, is_today: date == today, tasks: Vec::new() })
        .collect();

    for task in tasks {
        let offset = (task.created_date().date() - start).num_days();
        if (0..days.len() as i64).contains(&offset) {
            days[offset as usize].tasks.push(task);
        }
    }

    Week { days }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::task::{Priority, TaskStatus};

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn task(id: i64, date: NaiveDate, hour: u32) -> Task {
        Task::new(id, format!("Task {}", id), Priority::none(), TaskStatus::Pending, date.and_hms_opt(hour, 59, 59).unwrap())
    }

    #[test]
    fn seven_ordered_days() {
        let anchor = WeekAnchor::containing(day(1, 10));
        let week = project(Vec::<&Task>::new(), &anchor, day(1, 10));
        assert_eq!(week.days().len(), 7);
        assert_eq!(week.start(), day(1, 7));
        assert_eq!(week.end(), day(1, 13));
        assert_eq!(week.range_label(), "Jan 7 - Jan 13");
        for pair in week.days().windows(2) {
            assert_eq!(pair[1].date() - pair[0].date(), Duration::days(1));
        }
        let today: Vec<bool> = week.days().iter().map(|d| d.is_today()).collect();
        assert_eq!(today, vec![false, false, false, true, false, false, false]);
        assert_eq!(week.days()[3].label(), "Jan 10");
    }

    #[test]
    fn tasks_are_partitioned() {
        let tasks = vec![
            task(1, day(1, 6), 23),   // day before the week
            task(2, day(1, 7), 0),    // first day
            task(3, day(1, 9), 12),
            task(4, day(1, 9), 8),
            task(5, day(1, 13), 23),  // last day, late evening
            task(6, day(1, 14), 0),   // day after
        ];
        let anchor = WeekAnchor::containing(day(1, 9));
        let week = project(&tasks, &anchor, day(2, 1));

        let ids: Vec<Vec<i64>> = week.days().iter()
            .map(|d| d.tasks().iter().map(|t| t.id()).collect())
            .collect();
        assert_eq!(ids, vec![vec![2], vec![], vec![3, 4], vec![], vec![], vec![], vec![5]]);
        assert_eq!(week.task_count(), 3);
        assert!(week.days().iter().all(|d| !d.is_today()));
    }

    #[test]
    fn the_last_representable_week() {
        let tasks = vec![
            Task::new(1, "far past".to_string(), Priority::none(), TaskStatus::Pending, NaiveDate::MIN.and_hms_opt(0, 0, 0).unwrap()),
            Task::new(2, "far future".to_string(), Priority::none(), TaskStatus::Pending, NaiveDate::MAX.and_hms_opt(12, 0, 0).unwrap()),
        ];
        let anchor = WeekAnchor::containing(NaiveDate::MAX);
        let week = project(&tasks, &anchor, day(1, 1));
        assert_eq!(week.days().len(), 7);
        assert_eq!(week.end(), NaiveDate::MAX);
        assert_eq!(week.days()[6].tasks().iter().map(|t| t.id()).collect::<Vec<_>>(), vec![2]);
        assert_eq!(week.task_count(), 1);
    }
}
