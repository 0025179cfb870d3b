use async_trait::async_trait;

use ward_core::mitigation::{MitigationDetail, MitigationRecord};
use ward_ports::error::PortError;
use ward_ports::outbound::MitigationRepository;
use ward_ports::types::MitigationScope;

use super::executor::QuerySpec;
use super::predicate::{where_clause, Predicate, SqlValue};
use super::{decode_ts, encode_ts, SqliteDb};

const MITIGATION_COLUMNS: &str = "mitigation_id, name, alert_id, mo_gid, mitigation_type, \
     auto, prefix, ip_version, degraded, start_time, stop_time";

/// Alert-joined projection. Text fields the dashboard displays are
/// coalesced to `N/A` in SQL, matching the read model's non-optional
/// columns.
const DETAIL_SELECT: &str = "SELECT m.mitigation_id, m.alert_id, \
     COALESCE(a.host_address, 'N/A'), a.max_impact_bps, a.max_impact_pps, \
     COALESCE(m.mitigation_type, 'N/A'), m.auto, m.ip_version, \
     COALESCE(m.degraded, 'N/A'), m.start_time, m.stop_time, \
     COALESCE(m.prefix, 'N/A') \
     FROM mitigations m INNER JOIN alerts a ON a.alert_id = m.alert_id";

type MitigationRow = (
    String,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
    bool,
    Option<String>,
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<String>,
);

type DetailRow = (
    String,
    String,
    String,
    f64,
    f64,
    String,
    bool,
    Option<i64>,
    String,
    Option<String>,
    Option<String>,
    String,
);

fn decode_mitigation(row: MitigationRow) -> Result<MitigationRecord, PortError> {
    let (
        mitigation_id,
        name,
        alert_id,
        mo_gid,
        mitigation_type,
        auto,
        prefix,
        ip_version,
        degraded,
        start_time,
        stop_time,
    ) = row;
    Ok(MitigationRecord {
        mitigation_id,
        name,
        alert_id,
        mo_gid,
        mitigation_type,
        auto,
        prefix,
        ip_version,
        degraded,
        start_time: start_time.as_deref().map(decode_ts).transpose()?,
        stop_time: stop_time.as_deref().map(decode_ts).transpose()?,
    })
}

fn decode_detail(row: DetailRow) -> Result<MitigationDetail, PortError> {
    let (
        mitigation_id,
        alert_id,
        host_address,
        max_impact_bps,
        max_impact_pps,
        mitigation_type,
        auto,
        ip_version,
        degraded,
        start_time,
        stop_time,
        prefix,
    ) = row;
    Ok(MitigationDetail {
        mitigation_id,
        alert_id,
        host_address,
        max_impact_bps,
        max_impact_pps,
        mitigation_type,
        auto,
        ip_version,
        degraded,
        start_time: start_time.as_deref().map(decode_ts).transpose()?,
        stop_time: stop_time.as_deref().map(decode_ts).transpose()?,
        prefix,
    })
}

fn scope_predicates(scope: &MitigationScope, prefixed: bool) -> Vec<Predicate> {
    let (mo_gid, stop_time, auto) = if prefixed {
        ("m.mo_gid", "m.stop_time", "m.auto")
    } else {
        ("mo_gid", "stop_time", "auto")
    };
    let mut predicates = Vec::new();
    if let Some(gid) = &scope.mo_gid {
        predicates.push(Predicate::eq(mo_gid, gid.clone()));
    }
    match scope.ongoing {
        Some(true) => predicates.push(Predicate::is_null(stop_time)),
        Some(false) => predicates.push(Predicate::is_not_null(stop_time)),
        None => {}
    }
    if let Some(is_auto) = scope.auto {
        predicates.push(Predicate::eq(auto, is_auto));
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
impl MitigationRepository for SqliteDb {
    async fn save(&self, mitigation: &MitigationRecord) -> Result<(), PortError> {
        let spec = QuerySpec::new(format!(
            "INSERT INTO mitigations ({MITIGATION_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(mitigation_id) DO UPDATE SET
                name = excluded.name,
                alert_id = excluded.alert_id,
                mo_gid = excluded.mo_gid,
                mitigation_type = excluded.mitigation_type,
                auto = excluded.auto,
                prefix = excluded.prefix,
                ip_version = excluded.ip_version,
                degraded = excluded.degraded,
                start_time = excluded.start_time,
                stop_time = excluded.stop_time"
        ))
        .bind(mitigation.mitigation_id.clone())
        .bind(optional_text(mitigation.name.clone()))
        .bind(mitigation.alert_id.clone())
        .bind(optional_text(mitigation.mo_gid.clone()))
        .bind(optional_text(mitigation.mitigation_type.clone()))
        .bind(mitigation.auto)
        .bind(optional_text(mitigation.prefix.clone()))
        .bind(match mitigation.ip_version {
            Some(v) => SqlValue::Int(v),
            None => SqlValue::Null,
        })
        .bind(optional_text(mitigation.degraded.clone()))
        .bind(optional_text(mitigation.start_time.map(encode_ts)))
        .bind(optional_text(mitigation.stop_time.map(encode_ts)));

        self.executor().execute(&spec).await?;
        Ok(())
    }

    async fn fetch(&self, scope: &MitigationScope) -> Result<Vec<MitigationRecord>, PortError> {
        let (clause, values) = where_clause(&scope_predicates(scope, false));
        let spec = QuerySpec::new(format!(
            "SELECT {MITIGATION_COLUMNS} FROM mitigations{clause}
             ORDER BY start_time DESC, mitigation_id"
        ))
        .bind_all(values);

        let rows: Vec<MitigationRow> = self.executor().fetch_all(&spec).await?;
        rows.into_iter().map(decode_mitigation).collect()
    }

    async fn fetch_details(
        &self,
        scope: &MitigationScope,
    ) -> Result<Vec<MitigationDetail>, PortError> {
        let (clause, values) = where_clause(&scope_predicates(scope, true));
        let spec = QuerySpec::new(format!(
            "{DETAIL_SELECT}{clause} ORDER BY m.start_time DESC, m.mitigation_id"
        ))
        .bind_all(values);

        let rows: Vec<DetailRow> = self.executor().fetch_all(&spec).await?;
        rows.into_iter().map(decode_detail).collect()
    }

    async fn count_details(&self, scope: &MitigationScope) -> Result<u64, PortError> {
        let (clause, values) = where_clause(&scope_predicates(scope, true));
        let spec = QuerySpec::new(format!(
            "SELECT COUNT(*) FROM mitigations m \
             INNER JOIN alerts a ON a.alert_id = m.alert_id{clause}"
        ))
        .bind_all(values);

        let rows: Vec<(i64,)> = self.executor().fetch_all(&spec).await?;
        Ok(rows.first().map_or(0, |(n,)| *n as u64))
    }

    async fn fetch_details_page(
        &self,
        scope: &MitigationScope,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MitigationDetail>, PortError> {
        let (clause, values) = where_clause(&scope_predicates(scope, true));
        let spec = QuerySpec::new(format!(
            "{DETAIL_SELECT}{clause} ORDER BY m.start_time DESC, m.mitigation_id \
             LIMIT ? OFFSET ?"
        ))
        .bind_all(values)
        .bind(limit)
        .bind(offset);

        let rows: Vec<DetailRow> = self.executor().fetch_all(&spec).await?;
        rows.into_iter().map(decode_detail).collect()
    }

    async fn current_detail(&self) -> Result<Option<MitigationDetail>, PortError> {
        let spec = QuerySpec::new(format!(
            "{DETAIL_SELECT} ORDER BY m.start_time DESC, m.mitigation_id LIMIT 1"
        ));

        let rows: Vec<DetailRow> = self.executor().fetch_all(&spec).await?;
        rows.into_iter().next().map(decode_detail).transpose()
    }

    async fn find_detail(
        &self,
        mitigation_id: &str,
    ) -> Result<Option<MitigationDetail>, PortError> {
        let spec = QuerySpec::new(format!("{DETAIL_SELECT} WHERE m.mitigation_id = ?"))
            .bind(mitigation_id);

        let rows: Vec<DetailRow> = self.executor().fetch_all(&spec).await?;
        rows.into_iter().next().map(decode_detail).transpose()
    }
}
