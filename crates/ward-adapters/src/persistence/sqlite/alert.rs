use async_trait::async_trait;
use chrono::NaiveTime;

use ward_core::alert::{AlertRecord, Severity};
use ward_ports::error::PortError;
use ward_ports::outbound::AlertRepository;
use ward_ports::types::AlertScope;

use super::executor::QuerySpec;
use super::predicate::{where_clause, Predicate, SqlValue};
use super::{decode_ts, encode_ts, SqliteDb};

const ALERT_COLUMNS: &str = "alert_id, alert_type, mo_gid, mo_name, mo_misusesig, host_address, \
     country, severity, max_impact_bps, max_impact_pps, start_time, stop_time, updated_at";

type AlertRow = (
    String,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    f64,
    f64,
    String,
    Option<String>,
    String,
);

fn decode_alert(row: AlertRow) -> Result<AlertRecord, PortError> {
    let (
        alert_id,
        alert_type,
        mo_gid,
        mo_name,
        mo_misusesig,
        host_address,
        country,
        severity,
        max_impact_bps,
        max_impact_pps,
        start_time,
        stop_time,
        updated_at,
    ) = row;
    Ok(AlertRecord {
        alert_id,
        alert_type,
        mo_gid,
        mo_name,
        mo_misusesig,
        host_address,
        country,
        // Unknown spellings were already tolerated at ingestion; anything
        // unparsable in storage is treated as unranked.
        severity: severity.as_deref().and_then(Severity::parse),
        max_impact_bps,
        max_impact_pps,
        start_time: decode_ts(&start_time)?,
        stop_time: stop_time.as_deref().map(decode_ts).transpose()?,
        updated_at: decode_ts(&updated_at)?,
    })
}

fn scope_predicates(scope: &AlertScope) -> Vec<Predicate> {
    let mut predicates = Vec::new();
    if let Some(gid) = &scope.mo_gid {
        predicates.push(Predicate::eq("mo_gid", gid.clone()));
    }
    match scope.ongoing {
        Some(true) => predicates.push(Predicate::is_null("stop_time")),
        Some(false) => predicates.push(Predicate::is_not_null("stop_time")),
        None => {}
    }
    if let Some(severity) = scope.severity {
        predicates.push(Predicate::eq("severity", severity.as_str()));
    }
    if let Some(day) = scope.start_day {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        predicates.push(Predicate::ge("start_time", encode_ts(start)));
        if let Some(next) = day.succ_opt() {
            let end = next.and_time(NaiveTime::MIN).and_utc();
            predicates.push(Predicate::lt("start_time", encode_ts(end)));
        }
    }
    if let Some(since) = scope.updated_since {
        predicates.push(Predicate::ge("updated_at", encode_ts(since)));
    }
    predicates
}

fn optional_text(value: Option<String>) -> SqlValue {
    match value {
        Some(v) => SqlValue::Text(v),
        None => SqlValue::Null,
    }
}

#[async_trait]
impl AlertRepository for SqliteDb {
    async fn save(&self, alert: &AlertRecord) -> Result<(), PortError> {
        let spec = QuerySpec::new(format!(
            "INSERT INTO alerts ({ALERT_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(alert_id) DO UPDATE SET
                alert_type = excluded.alert_type,
                mo_gid = excluded.mo_gid,
                mo_name = excluded.mo_name,
                mo_misusesig = excluded.mo_misusesig,
                host_address = excluded.host_address,
                country = excluded.country,
                severity = excluded.severity,
                max_impact_bps = excluded.max_impact_bps,
                max_impact_pps = excluded.max_impact_pps,
                start_time = excluded.start_time,
                stop_time = excluded.stop_time,
                updated_at = excluded.updated_at"
        ))
        .bind(alert.alert_id.clone())
        .bind(optional_text(alert.alert_type.clone()))
        .bind(alert.mo_gid.clone())
        .bind(optional_text(alert.mo_name.clone()))
        .bind(optional_text(alert.mo_misusesig.clone()))
        .bind(optional_text(alert.host_address.clone()))
        .bind(optional_text(alert.country.clone()))
        .bind(optional_text(
            alert.severity.map(|s| s.as_str().to_string()),
        ))
        .bind(alert.max_impact_bps)
        .bind(alert.max_impact_pps)
        .bind(encode_ts(alert.start_time))
        .bind(optional_text(alert.stop_time.map(encode_ts)))
        .bind(encode_ts(alert.updated_at));

        self.executor().execute(&spec).await?;
        Ok(())
    }

    async fn fetch(&self, scope: &AlertScope) -> Result<Vec<AlertRecord>, PortError> {
        let (clause, values) = where_clause(&scope_predicates(scope));
        let spec = QuerySpec::new(format!(
            "SELECT {ALERT_COLUMNS} FROM alerts{clause} ORDER BY start_time DESC, alert_id"
        ))
        .bind_all(values);

        let rows: Vec<AlertRow> = self.executor().fetch_all(&spec).await?;
        rows.into_iter().map(decode_alert).collect()
    }

    async fn count(&self, scope: &AlertScope) -> Result<u64, PortError> {
        let (clause, values) = where_clause(&scope_predicates(scope));
        let spec =
            QuerySpec::new(format!("SELECT COUNT(*) FROM alerts{clause}")).bind_all(values);

        let rows: Vec<(i64,)> = self.executor().fetch_all(&spec).await?;
        Ok(rows.first().map_or(0, |(n,)| *n as u64))
    }

    async fn fetch_page(
        &self,
        scope: &AlertScope,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AlertRecord>, PortError> {
        let (clause, values) = where_clause(&scope_predicates(scope));
        let spec = QuerySpec::new(format!(
            "SELECT {ALERT_COLUMNS} FROM alerts{clause}
             ORDER BY start_time DESC, alert_id LIMIT ? OFFSET ?"
        ))
        .bind_all(values)
        .bind(limit)
        .bind(offset);

        let rows: Vec<AlertRow> = self.executor().fetch_all(&spec).await?;
        rows.into_iter().map(decode_alert).collect()
    }
}
