//! Ongoing/historical alert reconciliation.
//!
//! Ingestion keeps one row per alert id, but a day's result set can still
//! contain both an ongoing row and a stale historical row for the same
//! attack (the appliance re-announces an alert when it flares back up).
//! An ongoing row supersedes any historical row with the same id. The
//! merged stream is then ranked per (start date, ongoing) partition so the
//! "current alert" and "top alerts" endpoints get a stable ordering.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::alert::AlertRecord;

/// An alert with its 1-based rank inside the (start date, ongoing)
/// partition it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedAlert {
    pub row_id: u32,
    pub record: AlertRecord,
}

/// Merge ongoing and historical rows: every historical row whose id also
/// appears in the ongoing set is dropped, the full ongoing set is kept.
///
/// Deliberately a two-pass filter (build the ongoing id set, then filter)
/// rather than an anti-join pushed to the database, so the cost and
/// behavior stay observable regardless of the storage engine.
pub fn merge_daily(records: Vec<AlertRecord>) -> Vec<AlertRecord> {
    let ongoing_ids: HashSet<String> = records
        .iter()
        .filter(|r| r.ongoing())
        .map(|r| r.alert_id.clone())
        .collect();

    records
        .into_iter()
        .filter(|r| r.ongoing() || !ongoing_ids.contains(&r.alert_id))
        .collect()
}

/// Rank a merged stream: rows are grouped by (start date, ongoing) and
/// numbered within each partition by `updated_at` descending, severity
/// descending (unranked last), alert id ascending as the final tie-break.
pub fn rank_daily(records: Vec<AlertRecord>) -> Vec<RankedAlert> {
    let mut sorted = records;
    sorted.sort_by(|a, b| {
        partition_key(a)
            .cmp(&partition_key(b))
            .then_with(|| b.updated_at.cmp(&a.updated_at))
            .then_with(|| b.severity.cmp(&a.severity))
            .then_with(|| a.alert_id.cmp(&b.alert_id))
    });

    let mut ranked = Vec::with_capacity(sorted.len());
    let mut current: Option<(NaiveDate, bool)> = None;
    let mut row_id = 0;
    for record in sorted {
        let key = partition_key(&record);
        if current != Some(key) {
            current = Some(key);
            row_id = 0;
        }
        row_id += 1;
        ranked.push(RankedAlert { row_id, record });
    }
    ranked
}

/// Merge then rank: the full reconciliation pipeline for one result set.
pub fn reconcile(records: Vec<AlertRecord>) -> Vec<RankedAlert> {
    rank_daily(merge_daily(records))
}

fn partition_key(record: &AlertRecord) -> (NaiveDate, bool) {
    // Ongoing partitions sort after resolved ones within a day; callers
    // filter on the flag rather than relying on partition order.
    (record.start_date(), record.ongoing())
}
