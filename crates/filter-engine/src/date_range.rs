//! Half-open calendar windows for `date` filter nodes.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use filter_syntax::{DateMode, FilterError, Result};

/// `[start, end)` between two local midnights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// The range covering the days `from` up to, but excluding, `until`.
    pub fn days(from: NaiveDate, until: NaiveDate) -> Self {
        Self {
            start: from.and_time(NaiveTime::MIN),
            end: until.and_time(NaiveTime::MIN),
        }
    }

    /// Resolves a date mode relative to `today`. `All` constrains nothing and
    /// yields `None`.
    pub fn for_mode(mode: &DateMode, today: NaiveDate, week_start: Weekday) -> Result<Option<Self>> {
        let range = match mode {
            DateMode::All => return Ok(None),
            DateMode::Yesterday => Self::days(shift_back(today, 1)?, today),
            DateMode::ThisWeek => {
                let start = start_of_week(today, week_start)?;
                Self::days(start, shift(start, 7)?)
            }
            DateMode::LastWeek => {
                let start = start_of_week(today, week_start)?;
                Self::days(shift_back(start, 7)?, start)
            }
            DateMode::ThisMonth => {
                let first = today.with_day(1).ok_or_else(|| out_of_range(today))?;
                let next = first
                    .checked_add_months(Months::new(1))
                    .ok_or_else(|| out_of_range(first))?;
                Self::days(first, next)
            }
            DateMode::ThisYear => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1)
                    .ok_or_else(|| out_of_range(today))?;
                let next = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
                    .ok_or_else(|| out_of_range(today))?;
                Self::days(first, next)
            }
            DateMode::Specific(day) => Self::days(*day, shift(*day, 1)?),
        };
        Ok(Some(range))
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.end
    }
}

/// The most recent `week_start` on or before `day`.
pub fn start_of_week(day: NaiveDate, week_start: Weekday) -> Result<NaiveDate> {
    let offset = (7 + day.weekday().num_days_from_sunday() - week_start.num_days_from_sunday()) % 7;
    shift_back(day, u64::from(offset))
}

fn shift(day: NaiveDate, days: u64) -> Result<NaiveDate> {
    day.checked_add_days(Days::new(days))
        .ok_or_else(|| out_of_range(day))
}

fn shift_back(day: NaiveDate, days: u64) -> Result<NaiveDate> {
    day.checked_sub_days(Days::new(days))
        .ok_or_else(|| out_of_range(day))
}

fn out_of_range(day: NaiveDate) -> FilterError {
    FilterError::MalformedPayload(format!("date range around {day} is out of bounds"))
}
