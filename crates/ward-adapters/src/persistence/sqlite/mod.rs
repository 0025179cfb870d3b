mod alert;
mod executor;
mod managed_object;
mod mitigation;
mod pool;
mod predicate;

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use ward_ports::error::PortError;

pub use executor::{QueryExecutor, QuerySpec};
pub use pool::{ConnectionPool, PoolConfig, PooledConnection};
pub use predicate::{where_clause, Predicate, SqlValue};

/// SQLite-backed persistence. Repositories are implemented directly on
/// this handle; all statements go through the shared executor.
#[derive(Clone)]
pub struct SqliteDb {
    executor: Arc<QueryExecutor>,
}

impl SqliteDb {
    pub async fn new(config: PoolConfig) -> Result<Self, PortError> {
        let pool = ConnectionPool::connect(config).await?;
        let db = Self {
            executor: Arc::new(QueryExecutor::new(pool)),
        };
        db.init_schema().await?;
        Ok(db)
    }

    /// Open with default pool sizing; the usual entry point for tests and
    /// small deployments.
    pub async fn open(url: &str) -> Result<Self, PortError> {
        Self::new(PoolConfig::new(url)).await
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    pub async fn shutdown(&self) -> Result<(), PortError> {
        self.executor.pool().shutdown().await
    }

    async fn init_schema(&self) -> Result<(), PortError> {
        self.executor
            .execute(&QuerySpec::new(
                "CREATE TABLE IF NOT EXISTS alerts (
                    alert_id TEXT PRIMARY KEY,
                    alert_type TEXT,
                    mo_gid TEXT NOT NULL,
                    mo_name TEXT,
                    mo_misusesig TEXT,
                    host_address TEXT,
                    country TEXT,
                    severity TEXT,
                    max_impact_bps REAL NOT NULL,
                    max_impact_pps REAL NOT NULL,
                    start_time TEXT NOT NULL,
                    stop_time TEXT,
                    updated_at TEXT NOT NULL
                )",
            ))
            .await?;

        self.executor
            .execute(&QuerySpec::new(
                "CREATE INDEX IF NOT EXISTS idx_alerts_start_time ON alerts(start_time)",
            ))
            .await?;

        self.executor
            .execute(&QuerySpec::new(
                "CREATE INDEX IF NOT EXISTS idx_alerts_mo_gid ON alerts(mo_gid)",
            ))
            .await?;

        self.executor
            .execute(&QuerySpec::new(
                "CREATE TABLE IF NOT EXISTS mitigations (
                    mitigation_id TEXT PRIMARY KEY,
                    name TEXT,
                    alert_id TEXT NOT NULL,
                    mo_gid TEXT,
                    mitigation_type TEXT,
                    auto INTEGER NOT NULL,
                    prefix TEXT,
                    ip_version INTEGER,
                    degraded TEXT,
                    start_time TEXT,
                    stop_time TEXT
                )",
            ))
            .await?;

        self.executor
            .execute(&QuerySpec::new(
                "CREATE INDEX IF NOT EXISTS idx_mitigations_alert_id ON mitigations(alert_id)",
            ))
            .await?;

        self.executor
            .execute(&QuerySpec::new(
                "CREATE TABLE IF NOT EXISTS managedobjects (
                    gid TEXT PRIMARY KEY,
                    name TEXT NOT NULL
                )",
            ))
            .await?;

        Ok(())
    }
}

/// Timestamps are stored as RFC 3339 UTC with whole seconds, so string
/// comparison in SQL matches chronological order.
pub(crate) fn encode_ts(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn decode_ts(raw: &str) -> Result<DateTime<Utc>, PortError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| PortError::Decode(format!("bad timestamp {raw:?}: {e}")))
}
