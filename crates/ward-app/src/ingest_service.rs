use ward_core::alert::AlertRecord;
use ward_core::managed_object::ManagedObject;
use ward_core::mitigation::MitigationRecord;
use ward_ports::outbound::{AlertRepository, ManagedObjectRepository, MitigationRepository};

use crate::error::AppError;

/// Write side: upserts records as the detection appliance re-announces
/// them, and keeps the managed-object catalog in sync as a side effect of
/// alert ingestion.
pub struct IngestionService<A, M, O>
where
    A: AlertRepository,
    M: MitigationRepository,
    O: ManagedObjectRepository,
{
    alerts: A,
    mitigations: M,
    objects: O,
}

impl<A, M, O> IngestionService<A, M, O>
where
    A: AlertRepository,
    M: MitigationRepository,
    O: ManagedObjectRepository,
{
    pub fn new(alerts: A, mitigations: M, objects: O) -> Self {
        Self {
            alerts,
            mitigations,
            objects,
        }
    }

    pub async fn record_alert(&self, alert: &AlertRecord) -> Result<(), AppError> {
        self.alerts.save(alert).await?;
        if let Some(name) = &alert.mo_name {
            self.objects
                .save(&ManagedObject {
                    gid: alert.mo_gid.clone(),
                    name: name.clone(),
                })
                .await?;
        }
        Ok(())
    }

    pub async fn record_mitigation(&self, mitigation: &MitigationRecord) -> Result<(), AppError> {
        self.mitigations.save(mitigation).await?;
        Ok(())
    }

    /// The managed-object catalog as built up by ingestion.
    pub async fn managed_objects(&self) -> Result<Vec<ManagedObject>, AppError> {
        Ok(self.objects.list().await?)
    }
}
