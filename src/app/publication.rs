//! Publication issue arithmetic
//!
//! Maps a meeting week onto the dated publication issue that carries its content.
//! The study edition is released two months ahead of use; the workbook covers two
//! months per issue, always starting on an odd month.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};

use crate::app::models::MeetingKind;

/// Monday of the week containing `date`
pub fn week_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Kind of dated publication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationKind {
    /// Study edition, drives the weekend meeting
    Weekly,
    /// Meeting workbook, drives the midweek meeting
    Midweek,
}

impl PublicationKind {
    /// Publication symbol used by the media APIs
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Weekly => "w",
            Self::Midweek => "mwb",
        }
    }

    /// Pattern of the metadata database inside the archive's `contents`
    pub fn database_pattern(&self) -> &'static str {
        match self {
            Self::Weekly => "w*.db",
            Self::Midweek => "mwb*.db",
        }
    }
}

impl From<MeetingKind> for PublicationKind {
    fn from(kind: MeetingKind) -> Self {
        match kind {
            MeetingKind::Midweek => Self::Midweek,
            MeetingKind::Weekend => Self::Weekly,
        }
    }
}

/// A (year, month) publication release
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Issue {
    pub year: i32,
    pub month: u32,
}

impl Issue {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Issue for the month `date` falls in
    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// Issue `months` earlier, rolling the year back as needed
    pub fn months_before(self, months: u32) -> Self {
        let total = self.year * 12 + self.month as i32 - 1 - months as i32;
        Self::new(total.div_euclid(12), total.rem_euclid(12) as u32 + 1)
    }

    /// API form, `YYYYMM`
    pub fn code(&self) -> String {
        format!("{}{:02}", self.year, self.month)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Issue of `kind` that covers the week starting `week`
pub fn issue_for(week: NaiveDate, kind: PublicationKind) -> Issue {
    let target = Issue::of(week);
    match kind {
        PublicationKind::Weekly => target.months_before(2),
        PublicationKind::Midweek if target.month % 2 == 0 => target.months_before(1),
        PublicationKind::Midweek => target,
    }
}
