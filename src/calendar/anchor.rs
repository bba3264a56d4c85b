use chrono::{Datelike, Days, NaiveDate};

use super::DAYS_PER_WEEK;

/// The first day of the week currently displayed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeekAnchor {
    start: NaiveDate,
}

impl WeekAnchor {
    /// The anchor of the week that contains `date`
    pub fn containing(date: NaiveDate) -> Self {
        Self { start: week_start(date) }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Shift the anchor by a signed number of days, and return the new first day.
    ///
    /// The result is not re-normalized, so that stepping by whole weeks stays aligned on the current week start.
    /// A shift that would push the week out of the representable dates leaves the anchor unchanged, and returns `None`
    pub fn advance(&mut self, days: i64) -> Option<NaiveDate> {
        match shift(self.start, days).filter(|start| last_day(*start).is_some()) {
            Some(start) => {
                self.start = start;
                Some(start)
            },
            None => {
                log::warn!("Unable to move the calendar by {} days from {}", days, self.start);
                None
            },
        }
    }

    /// Move to the week that contains `date`
    pub fn jump_to(&mut self, date: NaiveDate) {
        self.start = week_start(date);
    }

    pub fn previous_week(&mut self) -> Option<NaiveDate> {
        self.advance(-DAYS_PER_WEEK)
    }

    pub fn next_week(&mut self) -> Option<NaiveDate> {
        self.advance(DAYS_PER_WEEK)
    }
}

fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let amount = Days::new(days.unsigned_abs());
    if days < 0 {
        date.checked_sub_days(amount)
    } else {
        date.checked_add_days(amount)
    }
}

/// The last day of the week starting on `start`, if it can be represented
fn last_day(start: NaiveDate) -> Option<NaiveDate> {
    start.checked_add_days(Days::new(DAYS_PER_WEEK as u64 - 1))
}

/// The Sunday on or before `date`.
///
/// At the edges of the calendar, this is the closest day from which a whole week can be represented
fn week_start(date: NaiveDate) -> NaiveDate {
    let sunday = date
        .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_sunday())))
        .unwrap_or(NaiveDate::MIN);
    if last_day(sunday).is_some() {
        sunday
    } else {
        NaiveDate::MAX.checked_sub_days(Days::new(DAYS_PER_WEEK as u64 - 1)).unwrap_or(NaiveDate::MAX)
    }
}
