use async_trait::async_trait;

use ward_core::mitigation::MitigationDetail;
use ward_core::page::{Page, PageRequest};
use ward_core::stats::MitigationStats;
use ward_ports::error::PortError;
use ward_ports::inbound::MitigationQueries;
use ward_ports::outbound::MitigationRepository;
use ward_ports::types::MitigationScope;

use crate::error::AppError;

/// Mitigation read side. Every detail served here is the alert-joined
/// projection; record-level access stays inside the stats computation.
pub struct MitigationService<M: MitigationRepository> {
    mitigations: M,
}

impl<M: MitigationRepository> MitigationService<M> {
    pub fn new(mitigations: M) -> Self {
        Self { mitigations }
    }

    pub async fn list_page(
        &self,
        scope: &MitigationScope,
        page: u32,
        page_size: u32,
    ) -> Result<Page<MitigationDetail>, AppError> {
        let request = PageRequest::new(page, page_size)?;
        Ok(self.list(scope, request).await?)
    }
}

#[async_trait]
impl<M: MitigationRepository> MitigationQueries for MitigationService<M> {
    async fn current(&self) -> Result<MitigationDetail, PortError> {
        Ok(self
            .mitigations
            .current_detail()
            .await?
            .unwrap_or_else(MitigationDetail::not_available))
    }

    async fn find(&self, mitigation_id: &str) -> Result<MitigationDetail, PortError> {
        self.mitigations
            .find_detail(mitigation_id)
            .await?
            .ok_or(PortError::NotFound)
    }

    async fn active(&self) -> Result<Vec<MitigationDetail>, PortError> {
        let scope = MitigationScope {
            ongoing: Some(true),
            ..MitigationScope::default()
        };
        self.mitigations.fetch_details(&scope).await
    }

    async fn list(
        &self,
        scope: &MitigationScope,
        request: PageRequest,
    ) -> Result<Page<MitigationDetail>, PortError> {
        let total = self.mitigations.count_details(scope).await?;
        let items = self
            .mitigations
            .fetch_details_page(scope, request.limit(), request.offset())
            .await?;
        Ok(Page::assemble(items, total, request))
    }

    async fn stats(&self, scope: &MitigationScope) -> Result<MitigationStats, PortError> {
        let records = self.mitigations.fetch(scope).await?;
        Ok(MitigationStats::from_records(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use chrono::{DateTime, Utc};
    use ward_core::mitigation::MitigationRecord;
    use ward_core::rollup::NOT_AVAILABLE;

    #[derive(Default)]
    struct MockMitigationRepo {
        records: Mutex<Vec<MitigationRecord>>,
        details: Mutex<Vec<MitigationDetail>>,
    }

    impl MockMitigationRepo {
        fn with_details(details: Vec<MitigationDetail>) -> Self {
            Self {
                details: Mutex::new(details),
                ..Self::default()
            }
        }

        fn matching_details(&self, scope: &MitigationScope) -> Vec<MitigationDetail> {
            self.details
                .lock()
                .unwrap()
                .iter()
                .filter(|d| scope.ongoing.is_none_or(|o| d.stop_time.is_none() == o))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl MitigationRepository for MockMitigationRepo {
        async fn save(&self, mitigation: &MitigationRecord) -> Result<(), PortError> {
            self.records.lock().unwrap().push(mitigation.clone());
            Ok(())
        }
        async fn fetch(&self, scope: &MitigationScope) -> Result<Vec<MitigationRecord>, PortError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| scope.ongoing.is_none_or(|o| r.ongoing() == o))
                .cloned()
                .collect())
        }
        async fn fetch_details(
            &self,
            scope: &MitigationScope,
        ) -> Result<Vec<MitigationDetail>, PortError> {
            Ok(self.matching_details(scope))
        }
        async fn count_details(&self, scope: &MitigationScope) -> Result<u64, PortError> {
            Ok(self.matching_details(scope).len() as u64)
        }
        async fn fetch_details_page(
            &self,
            scope: &MitigationScope,
            limit: u32,
            offset: u32,
        ) -> Result<Vec<MitigationDetail>, PortError> {
            Ok(self
                .matching_details(scope)
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect())
        }
        async fn current_detail(&self) -> Result<Option<MitigationDetail>, PortError> {
            let details = self.details.lock().unwrap();
            Ok(details
                .iter()
                .max_by_key(|d| d.start_time)
                .cloned())
        }
        async fn find_detail(
            &self,
            mitigation_id: &str,
        ) -> Result<Option<MitigationDetail>, PortError> {
            let details = self.details.lock().unwrap();
            Ok(details
                .iter()
                .find(|d| d.mitigation_id == mitigation_id)
                .cloned())
        }
    }

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn make_detail(id: &str, start: &str, stop: Option<&str>) -> MitigationDetail {
        MitigationDetail {
            mitigation_id: id.into(),
            alert_id: "a1".into(),
            host_address: "203.0.113.9".into(),
            max_impact_bps: 1_000_000.0,
            max_impact_pps: 1_000.0,
            mitigation_type: "tms".into(),
            auto: true,
            ip_version: Some(4),
            degraded: "no".into(),
            start_time: Some(ts(start)),
            stop_time: stop.map(ts),
            prefix: "203.0.113.0/24".into(),
        }
    }

    #[tokio::test]
    async fn current_serves_latest_started_mitigation() {
        let svc = MitigationService::new(MockMitigationRepo::with_details(vec![
            make_detail("m1", "2025-03-10T08:00:00Z", None),
            make_detail("m2", "2025-03-10T09:00:00Z", None),
        ]));

        let current = svc.current().await.unwrap();

        assert_eq!(current.mitigation_id, "m2");
    }

    #[tokio::test]
    async fn current_serves_sentinel_when_none_exist() {
        let svc = MitigationService::new(MockMitigationRepo::default());

        let current = svc.current().await.unwrap();

        assert_eq!(current.mitigation_id, NOT_AVAILABLE);
        assert_eq!(current.max_impact_bps, 0.0);
    }

    #[tokio::test]
    async fn find_unknown_id_is_not_found() {
        let svc = MitigationService::new(MockMitigationRepo::default());

        let err = svc.find("missing").await.unwrap_err();

        assert!(matches!(err, PortError::NotFound));
    }

    #[tokio::test]
    async fn active_filters_to_ongoing() {
        let svc = MitigationService::new(MockMitigationRepo::with_details(vec![
            make_detail("m1", "2025-03-10T08:00:00Z", None),
            make_detail("m2", "2025-03-10T09:00:00Z", Some("2025-03-10T10:00:00Z")),
        ]));

        let active = svc.active().await.unwrap();

        assert_eq!(active.len(), 1);
        assert_eq!(active[0].mitigation_id, "m1");
    }

    #[tokio::test]
    async fn list_pages_details() {
        let details: Vec<MitigationDetail> = (1..=5)
            .map(|i| make_detail(&format!("m{i}"), "2025-03-10T08:00:00Z", None))
            .collect();
        let svc = MitigationService::new(MockMitigationRepo::with_details(details));

        let page = svc
            .list_page(&MitigationScope::default(), 2, 2)
            .await
            .unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items[0].mitigation_id, "m3");
    }
}
