use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

/// Rollup grouping key: a managed object and the calendar bucket its
/// records fall into. Always derived from a record's start time, never
/// stored, so bucket boundaries are recomputed on every query.
///
/// `week` is the ISO week number while `year` is the calendar year, the
/// same mix Postgres `date_part` produced in the original views.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BucketKey {
    pub mo_gid: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub week: u32,
}

impl BucketKey {
    pub fn from_start(mo_gid: impl Into<String>, start: DateTime<Utc>) -> Self {
        let date = start.date_naive();
        Self {
            mo_gid: mo_gid.into(),
            year: date.year(),
            month: date.month(),
            day: date.day(),
            week: date.iso_week().week(),
        }
    }

    /// The (year, month) ranking partition this bucket belongs to.
    pub fn partition(&self) -> (i32, u32) {
        (self.year, self.month)
    }
}
