use std::collections::BTreeMap;
use std::collections::BTreeSet;

use async_trait::async_trait;

use ward_core::page::{Page, PageRequest};
use ward_core::ranking::{graph_rows, top_of_month, GraphRow, MonthlyTopRow, TOP_MONTHLY_LIMIT};
use ward_core::rollup::{rollup, RollupRow, NOT_AVAILABLE};
use ward_core::stats::DashboardStats;
use ward_ports::error::PortError;
use ward_ports::inbound::DashboardQueries;
use ward_ports::outbound::{AlertRepository, MitigationRepository};
use ward_ports::types::{AlertScope, DashboardScope, MitigationScope};

use crate::error::AppError;

/// Customer-dashboard read side: bucketed rollups, monthly rankings and
/// the graph feed. Every answer is derived from one joined snapshot of
/// alerts and mitigations, so counts across endpoints cannot disagree.
pub struct DashboardService<A, M>
where
    A: AlertRepository,
    M: MitigationRepository,
{
    alerts: A,
    mitigations: M,
}

impl<A, M> DashboardService<A, M>
where
    A: AlertRepository,
    M: MitigationRepository,
{
    pub fn new(alerts: A, mitigations: M) -> Self {
        Self { alerts, mitigations }
    }

    pub async fn list_page(
        &self,
        scope: &DashboardScope,
        page: u32,
        page_size: u32,
    ) -> Result<Page<RollupRow>, AppError> {
        let request = PageRequest::new(page, page_size)?;
        Ok(self.list(scope, request).await?)
    }

    /// One rollup snapshot, narrowed to the scope. Bucket keys are derived
    /// in the domain layer, so the scope filter runs on the joined rows
    /// rather than being pushed into SQL.
    async fn rollups(&self, scope: &DashboardScope) -> Result<Vec<RollupRow>, PortError> {
        let alerts = self.alerts.fetch(&AlertScope::default()).await?;
        let mitigations = self.mitigations.fetch(&MitigationScope::default()).await?;
        Ok(rollup(&alerts, &mitigations)
            .into_iter()
            .filter(|row| scope.contains(&row.key))
            .collect())
    }

    /// Per managed object totals across the scoped buckets, gid ascending.
    fn object_totals(rollups: &[RollupRow]) -> Vec<DashboardStats> {
        let mut totals: BTreeMap<String, (String, u64, u64, BTreeSet<String>)> = BTreeMap::new();
        for row in rollups {
            let entry = totals
                .entry(row.key.mo_gid.clone())
                .or_insert_with(|| (row.mo_name.clone(), 0, 0, BTreeSet::new()));
            entry.1 += row.alert_count;
            entry.2 += row.mitigation_count;
            entry.3.extend(row.hosts.iter().cloned());
        }
        totals
            .into_iter()
            .map(
                |(mo_gid, (mo_name, alert_count, mitigation_count, hosts))| DashboardStats {
                    mo_gid,
                    mo_name,
                    alert_count,
                    mitigation_count,
                    hosts_address: if hosts.is_empty() {
                        NOT_AVAILABLE.to_string()
                    } else {
                        hosts.into_iter().collect::<Vec<_>>().join("; ")
                    },
                },
            )
            .collect()
    }
}

#[async_trait]
impl<A, M> DashboardQueries for DashboardService<A, M>
where
    A: AlertRepository,
    M: MitigationRepository,
{
    async fn alert_stats(&self, scope: &DashboardScope) -> Result<DashboardStats, PortError> {
        let rollups = self.rollups(scope).await?;
        Ok(Self::object_totals(&rollups)
            .into_iter()
            // Ties fall to the smaller gid; counts first.
            .max_by(|a, b| {
                a.alert_count
                    .cmp(&b.alert_count)
                    .then_with(|| b.mo_gid.cmp(&a.mo_gid))
            })
            .unwrap_or_else(DashboardStats::not_available))
    }

    async fn mitigation_stats(&self, scope: &DashboardScope) -> Result<DashboardStats, PortError> {
        let rollups = self.rollups(scope).await?;
        Ok(Self::object_totals(&rollups)
            .into_iter()
            .max_by(|a, b| {
                a.mitigation_count
                    .cmp(&b.mitigation_count)
                    .then_with(|| b.mo_gid.cmp(&a.mo_gid))
            })
            .unwrap_or_else(DashboardStats::not_available))
    }

    async fn graph(&self, scope: &DashboardScope) -> Result<Vec<GraphRow>, PortError> {
        let rollups = self.rollups(scope).await?;
        Ok(graph_rows(&rollups))
    }

    async fn top_month(&self, year: i32, month: u32) -> Result<Vec<MonthlyTopRow>, PortError> {
        let scope = DashboardScope {
            year: Some(year),
            month: Some(month),
            ..DashboardScope::default()
        };
        let rollups = self.rollups(&scope).await?;
        Ok(top_of_month(&rollups, TOP_MONTHLY_LIMIT))
    }

    async fn list(
        &self,
        scope: &DashboardScope,
        request: PageRequest,
    ) -> Result<Page<RollupRow>, PortError> {
        let rollups = self.rollups(scope).await?;
        let total = rollups.len() as u64;
        let items = rollups
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Ok(Page::assemble(items, total, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use chrono::{DateTime, Utc};
    use ward_core::alert::AlertRecord;
    use ward_core::mitigation::{MitigationDetail, MitigationRecord};
    use ward_core::ranking::{TOTAL_SENTINEL_GID, TOTAL_SENTINEL_NAME};

    #[derive(Default)]
    struct MockAlertRepo {
        records: Mutex<Vec<AlertRecord>>,
    }

    #[async_trait]
    impl AlertRepository for MockAlertRepo {
        async fn save(&self, alert: &AlertRecord) -> Result<(), PortError> {
            self.records.lock().unwrap().push(alert.clone());
            Ok(())
        }
        async fn fetch(&self, _scope: &AlertScope) -> Result<Vec<AlertRecord>, PortError> {
            Ok(self.records.lock().unwrap().clone())
        }
        async fn count(&self, _scope: &AlertScope) -> Result<u64, PortError> {
            Ok(self.records.lock().unwrap().len() as u64)
        }
        async fn fetch_page(
            &self,
            _scope: &AlertScope,
            _limit: u32,
            _offset: u32,
        ) -> Result<Vec<AlertRecord>, PortError> {
            Ok(self.records.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    struct MockMitigationRepo {
        records: Mutex<Vec<MitigationRecord>>,
    }

    #[async_trait]
    impl MitigationRepository for MockMitigationRepo {
        async fn save(&self, mitigation: &MitigationRecord) -> Result<(), PortError> {
            self.records.lock().unwrap().push(mitigation.clone());
            Ok(())
        }
        async fn fetch(
            &self,
            _scope: &MitigationScope,
        ) -> Result<Vec<MitigationRecord>, PortError> {
            Ok(self.records.lock().unwrap().clone())
        }
        async fn fetch_details(
            &self,
            _scope: &MitigationScope,
        ) -> Result<Vec<MitigationDetail>, PortError> {
            Ok(vec![])
        }
        async fn count_details(&self, _scope: &MitigationScope) -> Result<u64, PortError> {
            Ok(0)
        }
        async fn fetch_details_page(
            &self,
            _scope: &MitigationScope,
            _limit: u32,
            _offset: u32,
        ) -> Result<Vec<MitigationDetail>, PortError> {
            Ok(vec![])
        }
        async fn current_detail(&self) -> Result<Option<MitigationDetail>, PortError> {
            Ok(None)
        }
        async fn find_detail(&self, _id: &str) -> Result<Option<MitigationDetail>, PortError> {
            Ok(None)
        }
    }

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn make_alert(id: &str, mo_gid: &str, start: &str) -> AlertRecord {
        AlertRecord {
            alert_id: id.into(),
            alert_type: None,
            mo_gid: mo_gid.into(),
            mo_name: Some(format!("mo-{mo_gid}")),
            mo_misusesig: None,
            host_address: Some(format!("203.0.113.{mo_gid}")),
            country: None,
            severity: None,
            max_impact_bps: 0.0,
            max_impact_pps: 0.0,
            start_time: ts(start),
            stop_time: None,
            updated_at: ts(start),
        }
    }

    fn make_mitigation(id: &str, alert_id: &str) -> MitigationRecord {
        MitigationRecord {
            mitigation_id: id.into(),
            name: None,
            alert_id: alert_id.into(),
            mo_gid: None,
            mitigation_type: None,
            auto: true,
            prefix: None,
            ip_version: None,
            degraded: None,
            start_time: None,
            stop_time: None,
        }
    }

    fn make_service(
        alerts: Vec<AlertRecord>,
        mitigations: Vec<MitigationRecord>,
    ) -> DashboardService<MockAlertRepo, MockMitigationRepo> {
        DashboardService::new(
            MockAlertRepo {
                records: Mutex::new(alerts),
            },
            MockMitigationRepo {
                records: Mutex::new(mitigations),
            },
        )
    }

    #[tokio::test]
    async fn alert_stats_picks_busiest_object() {
        let svc = make_service(
            vec![
                make_alert("a1", "1", "2025-03-10T08:00:00Z"),
                make_alert("a2", "2", "2025-03-10T08:00:00Z"),
                make_alert("a3", "2", "2025-03-11T08:00:00Z"),
            ],
            vec![],
        );

        let stats = svc.alert_stats(&DashboardScope::default()).await.unwrap();

        assert_eq!(stats.mo_gid, "2");
        assert_eq!(stats.alert_count, 2);
        assert_eq!(stats.hosts_address, "203.0.113.2");
    }

    #[tokio::test]
    async fn alert_stats_empty_scope_serves_sentinel() {
        let svc = make_service(vec![], vec![]);

        let stats = svc.alert_stats(&DashboardScope::default()).await.unwrap();

        assert_eq!(stats.mo_gid, "0");
        assert_eq!(stats.mo_name, NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn mitigation_stats_ranks_by_mitigation_count() {
        let svc = make_service(
            vec![
                make_alert("a1", "1", "2025-03-10T08:00:00Z"),
                make_alert("a2", "2", "2025-03-10T08:00:00Z"),
            ],
            vec![
                make_mitigation("m1", "a1"),
                make_mitigation("m2", "a1"),
                make_mitigation("m3", "a2"),
            ],
        );

        let stats = svc
            .mitigation_stats(&DashboardScope::default())
            .await
            .unwrap();

        assert_eq!(stats.mo_gid, "1");
        assert_eq!(stats.mitigation_count, 2);
    }

    #[tokio::test]
    async fn stats_ties_fall_to_smaller_gid() {
        let svc = make_service(
            vec![
                make_alert("a1", "2", "2025-03-10T08:00:00Z"),
                make_alert("a2", "1", "2025-03-10T08:00:00Z"),
            ],
            vec![],
        );

        let stats = svc.alert_stats(&DashboardScope::default()).await.unwrap();

        assert_eq!(stats.mo_gid, "1");
    }

    #[tokio::test]
    async fn graph_carries_total_row_per_month() {
        let svc = make_service(
            vec![
                make_alert("a1", "1", "2025-03-10T08:00:00Z"),
                make_alert("a2", "2", "2025-03-11T08:00:00Z"),
            ],
            vec![],
        );

        let rows = svc.graph(&DashboardScope::default()).await.unwrap();

        assert_eq!(rows[0].mo_gid, TOTAL_SENTINEL_GID);
        assert_eq!(rows[0].mo_name, TOTAL_SENTINEL_NAME);
        assert_eq!(rows[0].alert_count, 2);
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn top_month_narrows_to_partition_and_cuts_at_limit() {
        let mut alerts = Vec::new();
        for gid in 1..=7 {
            alerts.push(make_alert(
                &format!("a{gid}"),
                &gid.to_string(),
                "2025-03-10T08:00:00Z",
            ));
        }
        alerts.push(make_alert("b1", "9", "2025-04-10T08:00:00Z"));
        let svc = make_service(alerts, vec![]);

        let top = svc.top_month(2025, 3).await.unwrap();

        assert_eq!(top.len(), 5);
        assert!(top.iter().all(|row| row.month == 3));
    }

    #[tokio::test]
    async fn list_pages_scoped_rollups() {
        let alerts: Vec<AlertRecord> = (10..=14)
            .map(|day| {
                make_alert(
                    &format!("a{day}"),
                    "1",
                    &format!("2025-03-{day}T08:00:00Z"),
                )
            })
            .collect();
        let svc = make_service(alerts, vec![]);

        let page = svc
            .list_page(&DashboardScope::default(), 2, 2)
            .await
            .unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].key.day, 12);
    }

    #[tokio::test]
    async fn scope_narrows_every_view() {
        let svc = make_service(
            vec![
                make_alert("a1", "1", "2025-03-10T08:00:00Z"),
                make_alert("a2", "2", "2025-03-10T08:00:00Z"),
            ],
            vec![],
        );
        let scope = DashboardScope {
            mo_gid: Some("1".into()),
            ..DashboardScope::default()
        };

        let stats = svc.alert_stats(&scope).await.unwrap();
        let rows = svc.graph(&scope).await.unwrap();

        assert_eq!(stats.mo_gid, "1");
        // Total row plus the single scoped bucket.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].alert_count, 1);
    }
}
