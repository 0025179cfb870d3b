//! Monthly top-N ranking and percentage-of-month share.
//!
//! Ranking partitions are (year, month). Day buckets are ranked inside
//! their partition by alert count descending; every bucket contributes to
//! the partition total even when it falls outside the top-N cut.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::rollup::RollupRow;

/// Managed-object gid of the synthetic "Total" pseudo-row.
pub const TOTAL_SENTINEL_GID: &str = "0";
pub const TOTAL_SENTINEL_NAME: &str = "Total Alerts";

/// How many ranked rows the "top" views keep per partition.
pub const TOP_MONTHLY_LIMIT: u32 = 5;

/// A managed object's rank within one (year, month) partition, by its
/// summed alert count for that month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTopRow {
    pub rank: u32,
    pub mo_gid: String,
    pub mo_name: String,
    pub year: i32,
    pub month: u32,
    pub alert_count: u64,
}

/// A day-level graph point: one bucket's alert count, its rank within the
/// (year, month) partition, and its share of the partition total. The
/// synthetic total row carries rank 0, day 0 and a 100% share.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphRow {
    pub rank: u32,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub mo_gid: String,
    pub mo_name: String,
    pub alert_count: u64,
    pub month_total: u64,
    pub percent: f64,
}

/// Percentage share rounded to two decimal places; zero when the
/// partition is empty.
pub fn percent_of(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(count as f64 / total as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rank every managed object within its (year, month) partition by summed
/// alert count, descending. Ties break on gid ascending so ranks are
/// deterministic.
pub fn monthly_ranking(rollups: &[RollupRow]) -> Vec<MonthlyTopRow> {
    // (year, month) -> mo_gid -> (name, count)
    let mut partitions: BTreeMap<(i32, u32), BTreeMap<String, (String, u64)>> = BTreeMap::new();
    for row in rollups {
        let entry = partitions
            .entry(row.key.partition())
            .or_default()
            .entry(row.key.mo_gid.clone())
            .or_insert_with(|| (row.mo_name.clone(), 0));
        entry.1 += row.alert_count;
    }

    let mut ranked = Vec::new();
    for ((year, month), objects) in partitions {
        let mut rows: Vec<(String, String, u64)> = objects
            .into_iter()
            .map(|(gid, (name, count))| (gid, name, count))
            .collect();
        rows.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
        for (i, (mo_gid, mo_name, alert_count)) in rows.into_iter().enumerate() {
            ranked.push(MonthlyTopRow {
                rank: i as u32 + 1,
                mo_gid,
                mo_name,
                year,
                month,
                alert_count,
            });
        }
    }
    ranked
}

/// The top-N view: ranked rows cut at `limit` per partition. Rows beyond
/// the cut are excluded here but still count toward partition totals.
pub fn top_of_month(rollups: &[RollupRow], limit: u32) -> Vec<MonthlyTopRow> {
    monthly_ranking(rollups)
        .into_iter()
        .filter(|row| row.rank <= limit)
        .collect()
}

/// Build the day-level graph rows plus one synthetic total row per
/// (year, month) partition.
pub fn graph_rows(rollups: &[RollupRow]) -> Vec<GraphRow> {
    // (year, month) -> (day, mo_gid) -> (name, count)
    let mut partitions: BTreeMap<(i32, u32), BTreeMap<(u32, String), (String, u64)>> =
        BTreeMap::new();
    for row in rollups {
        let entry = partitions
            .entry(row.key.partition())
            .or_default()
            .entry((row.key.day, row.key.mo_gid.clone()))
            .or_insert_with(|| (row.mo_name.clone(), 0));
        entry.1 += row.alert_count;
    }

    let mut out = Vec::new();
    for ((year, month), buckets) in partitions {
        let month_total: u64 = buckets.values().map(|(_, count)| *count).sum();

        let mut rows: Vec<(u32, String, String, u64)> = buckets
            .into_iter()
            .map(|((day, gid), (name, count))| (day, gid, name, count))
            .collect();
        // Count descending, then day and gid ascending for stable ranks.
        rows.sort_by(|a, b| b.3.cmp(&a.3).then_with(|| (a.0, &a.1).cmp(&(b.0, &b.1))));

        out.push(GraphRow {
            rank: 0,
            year,
            month,
            day: 0,
            mo_gid: TOTAL_SENTINEL_GID.to_string(),
            mo_name: TOTAL_SENTINEL_NAME.to_string(),
            alert_count: month_total,
            month_total,
            percent: percent_of(month_total, month_total),
        });
        for (i, (day, mo_gid, mo_name, alert_count)) in rows.into_iter().enumerate() {
            out.push(GraphRow {
                rank: i as u32 + 1,
                year,
                month,
                day,
                mo_gid,
                mo_name,
                alert_count,
                month_total,
                percent: percent_of(alert_count, month_total),
            });
        }
    }
    out
}
