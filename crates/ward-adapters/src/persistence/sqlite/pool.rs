//! Bounded SQLite connection pool.
//!
//! Callers receive a `PooledConnection` lease; dropping it returns the
//! connection to the idle set unless the lease was marked broken, in
//! which case the connection is discarded and its slot freed for a fresh
//! open. Capacity is enforced with a semaphore, so waiters queue instead
//! of opening past `max_connections`.

use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sqlx::sqlite::SqliteConnection;
use sqlx::Connection;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use ward_ports::error::PortError;

const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

const ENV_DATABASE_URL: &str = "WARD_DATABASE_URL";
const ENV_POOL_MIN: &str = "WARD_POOL_MIN";
const ENV_POOL_MAX: &str = "WARD_POOL_MAX";
const ENV_ACQUIRE_TIMEOUT_SECS: &str = "WARD_POOL_ACQUIRE_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PoolConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            min_connections: DEFAULT_MIN_CONNECTIONS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Read the pool configuration from the environment. The database URL
    /// is required; sizing falls back to the defaults.
    pub fn from_env() -> Result<Self, PortError> {
        let url = env::var(ENV_DATABASE_URL)
            .map_err(|_| PortError::PoolInit(format!("{ENV_DATABASE_URL} is not set")))?;
        let mut config = Self::new(url);
        if let Some(min) = read_env_u32(ENV_POOL_MIN)? {
            config.min_connections = min;
        }
        if let Some(max) = read_env_u32(ENV_POOL_MAX)? {
            config.max_connections = max;
        }
        if let Some(secs) = read_env_u32(ENV_ACQUIRE_TIMEOUT_SECS)? {
            config.acquire_timeout = Duration::from_secs(u64::from(secs));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    fn validate(&self) -> Result<(), PortError> {
        if self.max_connections == 0 {
            return Err(PortError::PoolInit(
                "max_connections must be at least 1".into(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(PortError::PoolInit(format!(
                "min_connections {} exceeds max_connections {}",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }
}

fn read_env_u32(name: &str) -> Result<Option<u32>, PortError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<u32>()
            .map(Some)
            .map_err(|_| PortError::PoolInit(format!("{name} is not a number: {raw}"))),
        Err(_) => Ok(None),
    }
}

#[derive(Debug)]
struct PoolState {
    idle: Vec<SqliteConnection>,
    total_open: u32,
    closed: bool,
}

#[derive(Debug)]
struct PoolShared {
    url: String,
    semaphore: Arc<Semaphore>,
    state: Mutex<PoolState>,
}

#[derive(Clone, Debug)]
pub struct ConnectionPool {
    shared: Arc<PoolShared>,
    acquire_timeout: Duration,
}

impl ConnectionPool {
    /// Open the pool and eagerly establish `min_connections`. A failure
    /// here is a configuration or filesystem problem, not a transient one.
    pub async fn connect(config: PoolConfig) -> Result<Self, PortError> {
        config.validate()?;
        let shared = Arc::new(PoolShared {
            url: config.url.clone(),
            semaphore: Arc::new(Semaphore::new(config.max_connections as usize)),
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                total_open: 0,
                closed: false,
            }),
        });

        for _ in 0..config.min_connections {
            let conn = SqliteConnection::connect(&config.url)
                .await
                .map_err(|e| PortError::PoolInit(e.to_string()))?;
            let mut state = lock_state(&shared);
            state.idle.push(conn);
            state.total_open += 1;
        }
        tracing::debug!(
            url = %config.url,
            min = config.min_connections,
            max = config.max_connections,
            "connection pool ready"
        );

        Ok(Self {
            shared,
            acquire_timeout: config.acquire_timeout,
        })
    }

    /// Lease a connection, waiting up to the configured timeout for a
    /// free slot.
    pub async fn acquire(&self) -> Result<PooledConnection, PortError> {
        if lock_state(&self.shared).closed {
            return Err(PortError::PoolClosed);
        }

        let permit = tokio::time::timeout(
            self.acquire_timeout,
            Arc::clone(&self.shared.semaphore).acquire_owned(),
        )
        .await
        .map_err(|_| PortError::PoolExhausted)?
        .map_err(|_| PortError::PoolClosed)?;

        let existing = {
            let mut state = lock_state(&self.shared);
            if state.closed {
                return Err(PortError::PoolClosed);
            }
            state.idle.pop()
        };

        let conn = match existing {
            Some(conn) => conn,
            None => {
                let conn = SqliteConnection::connect(&self.shared.url)
                    .await
                    .map_err(|e| PortError::TransientConnection(e.to_string()))?;
                lock_state(&self.shared).total_open += 1;
                conn
            }
        };

        Ok(PooledConnection {
            conn: Some(conn),
            _permit: permit,
            shared: Arc::clone(&self.shared),
            broken: false,
        })
    }

    /// Close the pool: reject new acquires and drain the idle set. Leases
    /// still out are discarded when they drop.
    pub async fn shutdown(&self) -> Result<(), PortError> {
        self.shared.semaphore.close();
        let idle = {
            let mut state = lock_state(&self.shared);
            state.closed = true;
            state.total_open -= state.idle.len() as u32;
            std::mem::take(&mut state.idle)
        };
        for conn in idle {
            if let Err(e) = conn.close().await {
                tracing::warn!(error = %e, "closing idle connection failed");
            }
        }
        Ok(())
    }

    /// Connections currently open, leased or idle.
    pub fn size(&self) -> u32 {
        lock_state(&self.shared).total_open
    }

    pub fn idle_count(&self) -> usize {
        lock_state(&self.shared).idle.len()
    }
}

fn lock_state(shared: &PoolShared) -> std::sync::MutexGuard<'_, PoolState> {
    // State mutations never panic while holding the lock, so poisoning
    // cannot occur in practice; recover rather than propagate.
    match shared.state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// A leased connection. Returned to the pool on drop unless marked broken.
#[derive(Debug)]
pub struct PooledConnection {
    conn: Option<SqliteConnection>,
    _permit: OwnedSemaphorePermit,
    shared: Arc<PoolShared>,
    broken: bool,
}

impl PooledConnection {
    /// The lease holds a connection from acquire until drop.
    pub fn connection(&mut self) -> &mut SqliteConnection {
        self.conn.as_mut().expect("lease outlived its connection")
    }

    /// Flag the connection as unusable; it will be discarded instead of
    /// returned to the idle set.
    pub fn mark_broken(&mut self) {
        self.broken = true;
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let mut state = lock_state(&self.shared);
            if self.broken || state.closed {
                state.total_open -= 1;
                tracing::debug!("discarding pooled connection");
                drop(conn);
            } else {
                state.idle.push(conn);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str) -> PoolConfig {
        PoolConfig::new(format!("sqlite:file:{name}?mode=memory&cache=shared"))
            .acquire_timeout(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn connect_opens_min_connections_eagerly() {
        let pool = ConnectionPool::connect(config("pool_eager").min_connections(2))
            .await
            .unwrap();

        assert_eq!(pool.size(), 2);
        assert_eq!(pool.idle_count(), 2);
    }

    #[tokio::test]
    async fn connect_rejects_bad_path() {
        let err = ConnectionPool::connect(PoolConfig::new("sqlite:/no/such/dir/ward.db"))
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::PoolInit(_)));
    }

    #[tokio::test]
    async fn connect_rejects_inverted_bounds() {
        let err = ConnectionPool::connect(
            config("pool_bounds").min_connections(3).max_connections(2),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PortError::PoolInit(_)));
    }

    #[tokio::test]
    async fn acquire_at_capacity_times_out() {
        let pool = ConnectionPool::connect(config("pool_cap").max_connections(1))
            .await
            .unwrap();

        let lease = pool.acquire().await.unwrap();
        let err = pool.acquire().await.unwrap_err();

        assert!(matches!(err, PortError::PoolExhausted));
        drop(lease);
    }

    #[tokio::test]
    async fn released_connection_is_reused() {
        let pool = ConnectionPool::connect(config("pool_reuse").max_connections(1))
            .await
            .unwrap();

        let lease = pool.acquire().await.unwrap();
        drop(lease);
        let _lease = pool.acquire().await.unwrap();

        // One physical connection served both leases.
        assert_eq!(pool.size(), 1);
    }

    #[tokio::test]
    async fn broken_connection_is_discarded() {
        let pool = ConnectionPool::connect(config("pool_broken").min_connections(2))
            .await
            .unwrap();

        let mut lease = pool.acquire().await.unwrap();
        lease.mark_broken();
        drop(lease);

        assert_eq!(pool.size(), 1);
        assert_eq!(pool.idle_count(), 1);
        // The surviving idle connection serves the next lease; the freed
        // slot opens a fresh one only when demand needs it.
        let _a = pool.acquire().await.unwrap();
        assert_eq!(pool.size(), 1);
        let _b = pool.acquire().await.unwrap();
        assert_eq!(pool.size(), 2);
    }

    #[tokio::test]
    async fn shutdown_rejects_new_acquires() {
        let pool = ConnectionPool::connect(config("pool_shutdown"))
            .await
            .unwrap();

        pool.shutdown().await.unwrap();
        let err = pool.acquire().await.unwrap_err();

        assert!(matches!(err, PortError::PoolClosed));
        assert_eq!(pool.size(), 0);
    }

    #[tokio::test]
    async fn third_acquire_waits_for_a_release() {
        let pool = ConnectionPool::connect(
            config("pool_waiter")
                .max_connections(2)
                .acquire_timeout(Duration::from_secs(5)),
        )
        .await
        .unwrap();

        let first = pool.acquire().await.unwrap();
        let second = pool.acquire().await.unwrap();
        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire().await.map(drop) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(first);

        waiter.await.unwrap().unwrap();
        // The waiter reused the released connection rather than opening
        // a third.
        assert_eq!(pool.size(), 2);
        drop(second);
    }
}
