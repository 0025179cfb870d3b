pub mod severity;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::America::Sao_Paulo;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub use severity::Severity;

/// A DDoS alert as ingested from the detection appliance.
///
/// Keyed by `alert_id`; upstream ingestion updates `stop_time`, severity
/// and impact figures in place while the attack evolves. An alert is
/// ongoing while its stop time is unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub alert_id: String,
    pub alert_type: Option<String>,
    pub mo_gid: String,
    pub mo_name: Option<String>,
    pub mo_misusesig: Option<String>,
    pub host_address: Option<String>,
    pub country: Option<String>,
    pub severity: Option<Severity>,
    pub max_impact_bps: f64,
    pub max_impact_pps: f64,
    pub start_time: DateTime<Utc>,
    pub stop_time: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl AlertRecord {
    pub fn ongoing(&self) -> bool {
        self.stop_time.is_none()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    /// Peak impact in megabits per second.
    pub fn mbps(&self) -> f64 {
        self.max_impact_bps / 1_000_000.0
    }

    /// Peak impact in thousands of packets per second.
    pub fn kpps(&self) -> f64 {
        self.max_impact_pps / 1_000.0
    }

    /// Start time in the operator's display timezone.
    pub fn local_start_time(&self) -> DateTime<Tz> {
        self.start_time.with_timezone(&Sao_Paulo)
    }
}
