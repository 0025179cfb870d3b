//! Read models for the dashboard's single-record endpoints.
//!
//! These endpoints never return an absent body: when a scope matches
//! nothing, a defined sentinel record with zero counts and `N/A`
//! placeholders is served instead.

use serde::Serialize;

use crate::alert::{AlertRecord, Severity};
use crate::mitigation::MitigationRecord;
use crate::rollup::NOT_AVAILABLE;

pub const NO_ALERT_ID: &str = "NO_ALERT";

/// Severity counters for the alert widgets: ongoing alerts on the left,
/// all-time on the right.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertStats {
    pub total: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub total_high: u64,
    pub total_medium: u64,
    pub total_low: u64,
}

impl AlertStats {
    pub fn from_records(records: &[AlertRecord]) -> Self {
        let mut stats = Self::default();
        for record in records {
            if record.ongoing() {
                stats.total += 1;
            }
            match record.severity {
                Some(Severity::High) => {
                    stats.total_high += 1;
                    if record.ongoing() {
                        stats.high += 1;
                    }
                }
                Some(Severity::Medium) => {
                    stats.total_medium += 1;
                    if record.ongoing() {
                        stats.medium += 1;
                    }
                }
                Some(Severity::Low) => {
                    stats.total_low += 1;
                    if record.ongoing() {
                        stats.low += 1;
                    }
                }
                None => {}
            }
        }
        stats
    }
}

/// The "current alert" card: a display projection of one alert, or the
/// `NO_ALERT` sentinel when the network is quiet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertSummary {
    pub alert_id: String,
    pub client: String,
    pub attack_type: String,
    /// Start time formatted HH:MM:SS in the operator's timezone.
    pub start_time: String,
    pub host_address: String,
    pub severity: String,
    pub mbps: f64,
    pub kpps: f64,
    pub status: String,
}

impl AlertSummary {
    pub fn from_record(record: &AlertRecord) -> Self {
        Self {
            alert_id: record.alert_id.clone(),
            client: record.mo_name.clone().unwrap_or_default(),
            attack_type: record.mo_misusesig.clone().unwrap_or_default(),
            start_time: record.local_start_time().format("%H:%M:%S").to_string(),
            host_address: record.host_address.clone().unwrap_or_default(),
            severity: record
                .severity
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| Severity::Low.as_str().to_string()),
            mbps: record.mbps(),
            kpps: record.kpps(),
            status: if record.ongoing() {
                "Ongoing".into()
            } else {
                "Resolved".into()
            },
        }
    }

    pub fn not_available() -> Self {
        Self {
            alert_id: NO_ALERT_ID.into(),
            client: String::new(),
            attack_type: String::new(),
            start_time: String::new(),
            host_address: String::new(),
            severity: Severity::Low.as_str().into(),
            mbps: 0.0,
            kpps: 0.0,
            status: "No active alerts".into(),
        }
    }
}

/// The dashboard stats card: the busiest managed object for a scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub mo_gid: String,
    pub mo_name: String,
    pub alert_count: u64,
    pub mitigation_count: u64,
    pub hosts_address: String,
}

impl DashboardStats {
    pub fn not_available() -> Self {
        Self {
            mo_gid: "0".into(),
            mo_name: NOT_AVAILABLE.into(),
            alert_count: 0,
            mitigation_count: 0,
            hosts_address: NOT_AVAILABLE.into(),
        }
    }
}

/// Aggregate mitigation counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MitigationStats {
    pub total: u64,
    pub active: u64,
    pub auto: u64,
    pub avg_duration_secs: f64,
}

impl MitigationStats {
    pub fn from_records(records: &[MitigationRecord]) -> Self {
        let mut stats = Self {
            total: records.len() as u64,
            ..Self::default()
        };
        let mut durations = Vec::new();
        for record in records {
            if record.ongoing() {
                stats.active += 1;
            }
            if record.auto {
                stats.auto += 1;
            }
            if let (Some(start), Some(stop)) = (record.start_time, record.stop_time) {
                durations.push((stop - start).num_seconds() as f64);
            }
        }
        if !durations.is_empty() {
            stats.avg_duration_secs = durations.iter().sum::<f64>() / durations.len() as f64;
        }
        stats
    }
}
