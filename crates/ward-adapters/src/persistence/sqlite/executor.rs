//! Statement execution over pooled connections.
//!
//! Every statement runs on a fresh lease from the pool. A transient
//! connection failure discards the lease and retries exactly once on a
//! new connection; constraint and logic errors surface immediately. DDL
//! sent through the fetch path is executed without attempting to read a
//! result set.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Sqlite};

use ward_ports::error::PortError;

use super::pool::{ConnectionPool, PooledConnection};
use super::predicate::SqlValue;

/// SQL text plus its bound parameters, in placeholder order.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    sql: String,
    params: Vec<SqlValue>,
}

impl QuerySpec {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn bind_all(mut self, values: Vec<SqlValue>) -> Self {
        self.params.extend(values);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    fn is_ddl(&self) -> bool {
        let head = self.sql.trim_start().to_ascii_uppercase();
        head.starts_with("CREATE") || head.starts_with("ALTER") || head.starts_with("DROP")
    }
}

pub struct QueryExecutor {
    pool: ConnectionPool,
    #[cfg(test)]
    inject_transient: std::sync::atomic::AtomicU32,
}

impl QueryExecutor {
    pub fn new(pool: ConnectionPool) -> Self {
        Self {
            pool,
            #[cfg(test)]
            inject_transient: std::sync::atomic::AtomicU32::new(0),
        }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Run a statement and decode all rows. DDL statements are executed
    /// without a fetch and report an empty result set.
    pub async fn fetch_all<O>(&self, spec: &QuerySpec) -> Result<Vec<O>, PortError>
    where
        O: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        if spec.is_ddl() {
            self.execute(spec).await?;
            return Ok(Vec::new());
        }

        let mut retried = false;
        loop {
            let mut lease = self.pool.acquire().await?;
            match self.run_fetch(&mut lease, spec).await {
                Ok(rows) => return Ok(rows),
                Err(err) if err.is_transient() => {
                    lease.mark_broken();
                    if retried {
                        return Err(err);
                    }
                    retried = true;
                    tracing::warn!(error = %err, "transient failure, retrying on a fresh connection");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Run a statement for its side effects; returns the affected row
    /// count. Same retry contract as `fetch_all`.
    pub async fn execute(&self, spec: &QuerySpec) -> Result<u64, PortError> {
        let mut retried = false;
        loop {
            let mut lease = self.pool.acquire().await?;
            match self.run_execute(&mut lease, spec).await {
                Ok(affected) => return Ok(affected),
                Err(err) if err.is_transient() => {
                    lease.mark_broken();
                    if retried {
                        return Err(err);
                    }
                    retried = true;
                    tracing::warn!(error = %err, "transient failure, retrying on a fresh connection");
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn run_fetch<O>(
        &self,
        lease: &mut PooledConnection,
        spec: &QuerySpec,
    ) -> Result<Vec<O>, PortError>
    where
        O: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        #[cfg(test)]
        self.fail_if_injected()?;

        let mut query = sqlx::query_as::<Sqlite, O>(&spec.sql);
        for param in &spec.params {
            query = param.push_bind_as(query);
        }
        query
            .fetch_all(lease.connection())
            .await
            .map_err(classify)
    }

    async fn run_execute(
        &self,
        lease: &mut PooledConnection,
        spec: &QuerySpec,
    ) -> Result<u64, PortError> {
        #[cfg(test)]
        self.fail_if_injected()?;

        let mut query = sqlx::query(&spec.sql);
        for param in &spec.params {
            query = param.push_bind(query);
        }
        let result = query
            .execute(lease.connection())
            .await
            .map_err(classify)?;
        Ok(result.rows_affected())
    }

    #[cfg(test)]
    fn inject_transient_failures(&self, count: u32) {
        use std::sync::atomic::Ordering;
        self.inject_transient.store(count, Ordering::SeqCst);
    }

    #[cfg(test)]
    fn fail_if_injected(&self) -> Result<(), PortError> {
        use std::sync::atomic::Ordering;
        let remaining = self.inject_transient.load(Ordering::SeqCst);
        if remaining > 0 {
            self.inject_transient.store(remaining - 1, Ordering::SeqCst);
            return Err(PortError::TransientConnection("injected failure".into()));
        }
        Ok(())
    }
}

/// Map driver errors onto the port taxonomy. Only connection-level
/// failures come back as transient.
fn classify(err: sqlx::Error) -> PortError {
    match err {
        sqlx::Error::Database(db) => {
            if db.is_unique_violation()
                || db.is_foreign_key_violation()
                || db.is_check_violation()
            {
                PortError::ConstraintViolation(db.to_string())
            } else {
                PortError::SyntaxOrLogic(db.to_string())
            }
        }
        sqlx::Error::Io(e) => PortError::TransientConnection(e.to_string()),
        sqlx::Error::WorkerCrashed => {
            PortError::TransientConnection("connection worker crashed".into())
        }
        sqlx::Error::PoolClosed => PortError::PoolClosed,
        err @ (sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_)) => {
            PortError::Decode(err.to_string())
        }
        other => PortError::SyntaxOrLogic(other.to_string()),
    }
}
