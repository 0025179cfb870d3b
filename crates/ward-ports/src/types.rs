use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use ward_core::alert::Severity;

/// Structured filter for alert queries. Adapters translate each field
/// into one predicate of a parameterized WHERE clause; callers never
/// assemble SQL fragments themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertScope {
    pub mo_gid: Option<String>,
    pub ongoing: Option<bool>,
    pub severity: Option<Severity>,
    /// Keep only alerts whose start time falls on this calendar day.
    pub start_day: Option<NaiveDate>,
    /// Keep only alerts updated at or after this instant.
    pub updated_since: Option<DateTime<Utc>>,
}

/// Structured filter for mitigation queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MitigationScope {
    pub mo_gid: Option<String>,
    pub ongoing: Option<bool>,
    pub auto: Option<bool>,
}

/// Scope for the customer-dashboard rollups: a managed object and/or a
/// calendar bucket to narrow to. All fields optional; an empty scope
/// means the whole data set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardScope {
    pub mo_gid: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl DashboardScope {
    /// Whether a bucket falls inside this scope. Bucket filtering happens
    /// after rollup, on derived keys, so it lives here rather than in SQL.
    pub fn contains(&self, key: &ward_core::bucket::BucketKey) -> bool {
        if let Some(gid) = &self.mo_gid {
            if key.mo_gid != *gid {
                return false;
            }
        }
        if let Some(year) = self.year {
            if key.year != year {
                return false;
            }
        }
        if let Some(month) = self.month {
            if key.month != month {
                return false;
            }
        }
        if let Some(day) = self.day {
            if key.day != day {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ward_core::bucket::BucketKey;

    fn key(mo_gid: &str, year: i32, month: u32, day: u32) -> BucketKey {
        BucketKey {
            mo_gid: mo_gid.into(),
            year,
            month,
            day,
            week: 11,
        }
    }

    #[test]
    fn empty_scope_contains_everything() {
        let scope = DashboardScope::default();
        assert!(scope.contains(&key("1", 2025, 3, 10)));
    }

    #[test]
    fn scope_narrows_by_each_field() {
        let scope = DashboardScope {
            mo_gid: Some("1".into()),
            year: Some(2025),
            month: Some(3),
            day: None,
        };
        assert!(scope.contains(&key("1", 2025, 3, 10)));
        assert!(scope.contains(&key("1", 2025, 3, 11)));
        assert!(!scope.contains(&key("2", 2025, 3, 10)));
        assert!(!scope.contains(&key("1", 2025, 4, 10)));
    }
}
