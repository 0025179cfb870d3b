use async_trait::async_trait;
use chrono::NaiveDate;

use ward_core::alert::AlertRecord;
use ward_core::mitigation::MitigationDetail;
use ward_core::page::{Page, PageRequest};
use ward_core::ranking::{GraphRow, MonthlyTopRow};
use ward_core::reconcile::RankedAlert;
use ward_core::rollup::RollupRow;
use ward_core::stats::{AlertStats, AlertSummary, DashboardStats, MitigationStats};

use crate::error::PortError;
use crate::types::{AlertScope, DashboardScope, MitigationScope};

/// Alert-facing query surface of the reporting API.
#[async_trait]
pub trait AlertQueries: Send + Sync {
    /// The most relevant ongoing alert for a day, or the sentinel
    /// summary when none is active.
    async fn current(&self, day: NaiveDate) -> Result<AlertSummary, PortError>;
    /// Reconciled and ranked alerts for a day, paged.
    async fn top(&self, day: NaiveDate, request: PageRequest)
        -> Result<Page<RankedAlert>, PortError>;
    async fn stats(&self, scope: &AlertScope) -> Result<AlertStats, PortError>;
    async fn list(
        &self,
        scope: &AlertScope,
        request: PageRequest,
    ) -> Result<Page<AlertRecord>, PortError>;
}

#[async_trait]
pub trait MitigationQueries: Send + Sync {
    /// Latest mitigation, or the sentinel detail when none exists.
    async fn current(&self) -> Result<MitigationDetail, PortError>;
    async fn find(&self, mitigation_id: &str) -> Result<MitigationDetail, PortError>;
    async fn active(&self) -> Result<Vec<MitigationDetail>, PortError>;
    async fn list(
        &self,
        scope: &MitigationScope,
        request: PageRequest,
    ) -> Result<Page<MitigationDetail>, PortError>;
    async fn stats(&self, scope: &MitigationScope) -> Result<MitigationStats, PortError>;
}

#[async_trait]
pub trait DashboardQueries: Send + Sync {
    /// Busiest managed object by alert count for the scope, or the N/A
    /// sentinel when the scope matches nothing.
    async fn alert_stats(&self, scope: &DashboardScope) -> Result<DashboardStats, PortError>;
    /// Same, ordered by mitigation count.
    async fn mitigation_stats(&self, scope: &DashboardScope) -> Result<DashboardStats, PortError>;
    async fn graph(&self, scope: &DashboardScope) -> Result<Vec<GraphRow>, PortError>;
    async fn top_month(&self, year: i32, month: u32) -> Result<Vec<MonthlyTopRow>, PortError>;
    async fn list(
        &self,
        scope: &DashboardScope,
        request: PageRequest,
    ) -> Result<Page<RollupRow>, PortError>;
}
