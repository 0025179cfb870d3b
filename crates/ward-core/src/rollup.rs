//! Time-bucketed rollup of alert and mitigation counts per managed object.
//!
//! Alerts and mitigations are grouped independently by bucket key and the
//! two group-bys are then joined on that key. A bucket present on only one
//! side reports zero for the other side, never null. Mitigations carry no
//! useful start time of their own here: they are bucketed through the
//! start time and managed object of the alert that triggered them, and a
//! mitigation whose alert is absent from the input set is dropped.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::alert::AlertRecord;
use crate::bucket::BucketKey;
use crate::mitigation::MitigationRecord;

pub const NOT_AVAILABLE: &str = "N/A";

/// One joined rollup row. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollupRow {
    pub key: BucketKey,
    pub mo_name: String,
    pub alert_count: u64,
    pub mitigation_count: u64,
    /// Distinct host addresses seen in the bucket, sorted. Display only;
    /// no numeric computation uses this field.
    pub hosts: Vec<String>,
}

impl RollupRow {
    /// Semicolon-joined host list for display, `N/A` when empty.
    pub fn hosts_display(&self) -> String {
        if self.hosts.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            self.hosts.join("; ")
        }
    }
}

#[derive(Default)]
struct BucketAccumulator {
    mo_name: Option<String>,
    alert_ids: BTreeSet<String>,
    mitigation_ids: BTreeSet<String>,
    hosts: BTreeSet<String>,
}

/// Build the joined rollup rows for a set of alerts and mitigations,
/// ordered by bucket key.
pub fn rollup(alerts: &[AlertRecord], mitigations: &[MitigationRecord]) -> Vec<RollupRow> {
    let mut buckets: BTreeMap<BucketKey, BucketAccumulator> = BTreeMap::new();

    let mut alerts_by_id: HashMap<&str, &AlertRecord> = HashMap::new();
    for alert in alerts {
        alerts_by_id.insert(alert.alert_id.as_str(), alert);

        let key = BucketKey::from_start(alert.mo_gid.clone(), alert.start_time);
        let acc = buckets.entry(key).or_default();
        acc.alert_ids.insert(alert.alert_id.clone());
        if acc.mo_name.is_none() {
            acc.mo_name = alert.mo_name.clone();
        }
        if let Some(host) = &alert.host_address {
            acc.hosts.insert(host.clone());
        }
    }

    for mitigation in mitigations {
        // Inner-join semantics: no owning alert, no bucket.
        let Some(alert) = alerts_by_id.get(mitigation.alert_id.as_str()) else {
            continue;
        };
        let key = BucketKey::from_start(alert.mo_gid.clone(), alert.start_time);
        buckets
            .entry(key)
            .or_default()
            .mitigation_ids
            .insert(mitigation.mitigation_id.clone());
    }

    buckets
        .into_iter()
        .map(|(key, acc)| RollupRow {
            key,
            mo_name: acc.mo_name.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            alert_count: acc.alert_ids.len() as u64,
            mitigation_count: acc.mitigation_ids.len() as u64,
            hosts: acc.hosts.into_iter().collect(),
        })
        .collect()
}
