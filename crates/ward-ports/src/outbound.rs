use async_trait::async_trait;

use ward_core::alert::AlertRecord;
use ward_core::managed_object::ManagedObject;
use ward_core::mitigation::{MitigationDetail, MitigationRecord};

use crate::error::PortError;
use crate::types::{AlertScope, MitigationScope};

/// Alert persistence. `count` and `fetch_page` are built from identical
/// predicates so a page's `total` can only drift from its items under
/// concurrent writes between the two statements.
#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn save(&self, alert: &AlertRecord) -> Result<(), PortError>;
    async fn fetch(&self, scope: &AlertScope) -> Result<Vec<AlertRecord>, PortError>;
    async fn count(&self, scope: &AlertScope) -> Result<u64, PortError>;
    async fn fetch_page(
        &self,
        scope: &AlertScope,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<AlertRecord>, PortError>;
}

#[async_trait]
pub trait MitigationRepository: Send + Sync {
    async fn save(&self, mitigation: &MitigationRecord) -> Result<(), PortError>;
    async fn fetch(&self, scope: &MitigationScope) -> Result<Vec<MitigationRecord>, PortError>;
    /// Alert-joined projection, unpaged.
    async fn fetch_details(&self, scope: &MitigationScope)
        -> Result<Vec<MitigationDetail>, PortError>;
    /// Count of the alert-joined projection under the same predicates as
    /// `fetch_details_page`.
    async fn count_details(&self, scope: &MitigationScope) -> Result<u64, PortError>;
    async fn fetch_details_page(
        &self,
        scope: &MitigationScope,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MitigationDetail>, PortError>;
    /// The most recently started mitigation, if any.
    async fn current_detail(&self) -> Result<Option<MitigationDetail>, PortError>;
    async fn find_detail(&self, mitigation_id: &str) -> Result<Option<MitigationDetail>, PortError>;
}

#[async_trait]
pub trait ManagedObjectRepository: Send + Sync {
    async fn save(&self, object: &ManagedObject) -> Result<(), PortError>;
    async fn list(&self) -> Result<Vec<ManagedObject>, PortError>;
}
