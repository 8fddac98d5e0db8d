use chrono::{Datelike as _, Days, NaiveDate, Weekday};
use serde::Serialize;

use crate::error::RosterError;
use crate::models::Project;

pub const WINDOW_DAYS: u32 = 14;

/// The fortnight of dates shown at once, addressed by a multiple of two weeks from the project start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    start: NaiveDate,
    offset: i32,
}

pub fn parse_start_date(input: &str) -> Result<NaiveDate, RosterError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(RosterError::InvalidInput(
            "project start date is missing".to_owned(),
        ));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|error| {
        RosterError::InvalidInput(format!("project start date {input:?}: {error}"))
    })
}

fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(
        date.weekday().num_days_from_monday(),
    )))
}

impl Window {
    /// Starts on the Monday of the ISO week containing `start_date + offset * 14 days`.
    pub fn new(start_date: NaiveDate, offset: i32) -> Result<Self, RosterError> {
        let days = i64::from(offset) * i64::from(WINDOW_DAYS);
        let start = shift_days(start_date, days)
            .and_then(week_start)
            .filter(|start| {
                start
                    .checked_add_days(Days::new(u64::from(WINDOW_DAYS - 1)))
                    .is_some()
            })
            .ok_or_else(|| {
                RosterError::InvalidInput(format!(
                    "offset {offset} from {start_date} is out of the supported date range"
                ))
            })?;
        Ok(Self { start, offset })
    }

    pub fn for_project(project: &Project, offset: i32) -> Result<Self, RosterError> {
        let start_date = project.start_date.ok_or_else(|| {
            RosterError::InvalidInput(format!("project {} has no start date", project.id))
        })?;
        Self::new(start_date, offset)
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last visible date, inclusive.
    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.start + Days::new(u64::from(WINDOW_DAYS - 1))
    }

    #[must_use]
    pub const fn offset(&self) -> i32 {
        self.offset
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end();
        self.start.iter_days().take_while(move |date| *date <= end)
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end()
    }

    #[must_use]
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        if self.contains(date) {
            usize::try_from((date - self.start).num_days()).ok()
        } else {
            None
        }
    }

    /// The two ISO weeks of the window, each seven dates starting on Monday.
    #[must_use]
    pub fn weeks(&self) -> [Vec<NaiveDate>; 2] {
        let dates: Vec<NaiveDate> = self.dates().collect();
        let (first, second) = dates.split_at(7);
        [first.to_vec(), second.to_vec()]
    }

    /// The first date of the window that falls on `day`.
    #[must_use]
    pub fn first(&self, day: Weekday) -> NaiveDate {
        self.start + Days::new(u64::from(day.num_days_from_monday()))
    }

    pub fn next(&self) -> Result<Self, RosterError> {
        self.moved(1)
    }

    pub fn previous(&self) -> Result<Self, RosterError> {
        self.moved(-1)
    }

    pub fn moved(&self, delta: i32) -> Result<Self, RosterError> {
        let offset = self.offset.checked_add(delta).ok_or_else(|| {
            RosterError::InvalidInput(format!("offset {} + {delta} overflows", self.offset))
        })?;
        Self::new(self.start, delta).map(|window| Self { offset, ..window })
    }
}
