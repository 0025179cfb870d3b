use async_trait::async_trait;
use chrono::NaiveDate;

use ward_core::alert::AlertRecord;
use ward_core::page::{Page, PageRequest};
use ward_core::reconcile::{reconcile, RankedAlert};
use ward_core::stats::{AlertStats, AlertSummary};
use ward_ports::error::PortError;
use ward_ports::inbound::AlertQueries;
use ward_ports::outbound::AlertRepository;
use ward_ports::types::AlertScope;

use crate::error::AppError;

/// Alert read side: current-alert card, ranked top list, severity stats
/// and the plain paged listing.
pub struct AlertService<A: AlertRepository> {
    alerts: A,
}

impl<A: AlertRepository> AlertService<A> {
    pub fn new(alerts: A) -> Self {
        Self { alerts }
    }

    /// Entry point for raw pagination parameters as they arrive from a
    /// transport layer. Validates them before touching storage.
    pub async fn top_page(
        &self,
        day: NaiveDate,
        page: u32,
        page_size: u32,
    ) -> Result<Page<RankedAlert>, AppError> {
        let request = PageRequest::new(page, page_size)?;
        Ok(self.top(day, request).await?)
    }

    pub async fn list_page(
        &self,
        scope: &AlertScope,
        page: u32,
        page_size: u32,
    ) -> Result<Page<AlertRecord>, AppError> {
        let request = PageRequest::new(page, page_size)?;
        Ok(self.list(scope, request).await?)
    }

    fn day_scope(day: NaiveDate) -> AlertScope {
        AlertScope {
            start_day: Some(day),
            ..AlertScope::default()
        }
    }
}

#[async_trait]
impl<A: AlertRepository> AlertQueries for AlertService<A> {
    async fn current(&self, day: NaiveDate) -> Result<AlertSummary, PortError> {
        let records = self.alerts.fetch(&Self::day_scope(day)).await?;
        let ranked = reconcile(records);
        Ok(ranked
            .iter()
            .find(|r| r.record.ongoing())
            .map(|r| AlertSummary::from_record(&r.record))
            .unwrap_or_else(AlertSummary::not_available))
    }

    async fn top(
        &self,
        day: NaiveDate,
        request: PageRequest,
    ) -> Result<Page<RankedAlert>, PortError> {
        // Reconciliation happens on the full day here, so the page is cut
        // from one consistent snapshot rather than re-counted.
        let records = self.alerts.fetch(&Self::day_scope(day)).await?;
        let ranked = reconcile(records);
        let total = ranked.len() as u64;
        let items = ranked
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Ok(Page::assemble(items, total, request))
    }

    async fn stats(&self, scope: &AlertScope) -> Result<AlertStats, PortError> {
        let records = self.alerts.fetch(scope).await?;
        Ok(AlertStats::from_records(&records))
    }

    async fn list(
        &self,
        scope: &AlertScope,
        request: PageRequest,
    ) -> Result<Page<AlertRecord>, PortError> {
        let total = self.alerts.count(scope).await?;
        let items = self
            .alerts
            .fetch_page(scope, request.limit(), request.offset())
            .await?;
        Ok(Page::assemble(items, total, request))
    }
}
