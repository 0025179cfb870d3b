use async_trait::async_trait;

use ward_core::managed_object::ManagedObject;
use ward_ports::error::PortError;
use ward_ports::outbound::ManagedObjectRepository;

use super::executor::QuerySpec;
use super::SqliteDb;

#[async_trait]
impl ManagedObjectRepository for SqliteDb {
    async fn save(&self, object: &ManagedObject) -> Result<(), PortError> {
        let spec = QuerySpec::new(
            "INSERT INTO managedobjects (gid, name) VALUES (?, ?)
             ON CONFLICT(gid) DO UPDATE SET name = excluded.name",
        )
        .bind(object.gid.clone())
        .bind(object.name.clone());

        self.executor().execute(&spec).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ManagedObject>, PortError> {
        let rows: Vec<(String, String)> = self
            .executor()
            .fetch_all(&QuerySpec::new(
                "SELECT gid, name FROM managedobjects ORDER BY name, gid",
            ))
            .await?;

        Ok(rows
            .into_iter()
            .map(|(gid, name)| ManagedObject { gid, name })
            .collect())
    }
}
