use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rollup::NOT_AVAILABLE;

/// A mitigation run by the scrubbing infrastructure, linked to the alert
/// that triggered it. Keyed by `mitigation_id`; upstream ingestion updates
/// `stop_time` in place. Ongoing while the stop time is unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitigationRecord {
    pub mitigation_id: String,
    pub name: Option<String>,
    pub alert_id: String,
    pub mo_gid: Option<String>,
    pub mitigation_type: Option<String>,
    pub auto: bool,
    pub prefix: Option<String>,
    pub ip_version: Option<i64>,
    pub degraded: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
}

impl MitigationRecord {
    pub fn ongoing(&self) -> bool {
        self.stop_time.is_none()
    }
}

/// Mitigation joined with fields from its owning alert, as served by the
/// mitigation endpoints (current, by-id, active, top).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitigationDetail {
    pub mitigation_id: String,
    pub alert_id: String,
    pub host_address: String,
    pub max_impact_bps: f64,
    pub max_impact_pps: f64,
    pub mitigation_type: String,
    pub auto: bool,
    pub ip_version: Option<i64>,
    pub degraded: String,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
    pub prefix: String,
}

impl MitigationDetail {
    /// Sentinel served when no mitigation matches. Counters are zero and
    /// text fields carry the `N/A` placeholder.
    pub fn not_available() -> Self {
        Self {
            mitigation_id: NOT_AVAILABLE.into(),
            alert_id: NOT_AVAILABLE.into(),
            host_address: NOT_AVAILABLE.into(),
            max_impact_bps: 0.0,
            max_impact_pps: 0.0,
            mitigation_type: NOT_AVAILABLE.into(),
            auto: false,
            ip_version: None,
            degraded: NOT_AVAILABLE.into(),
            start_time: None,
            stop_time: None,
            prefix: NOT_AVAILABLE.into(),
        }
    }
}
