use thiserror::Error;

/// Errors crossing the persistence boundary.
///
/// The transient class is the only one the executor retries (once);
/// constraint and logic errors surface immediately and are never retried.
#[derive(Debug, Error)]
pub enum PortError {
    #[error("not found")]
    NotFound,
    #[error("pool initialization failed: {0}")]
    PoolInit(String),
    #[error("connection pool exhausted")]
    PoolExhausted,
    #[error("connection pool is closed")]
    PoolClosed,
    #[error("transient connection error: {0}")]
    TransientConnection(String),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("query failed: {0}")]
    SyntaxOrLogic(String),
    #[error("row decode failed: {0}")]
    Decode(String),
}

impl PortError {
    /// Whether the executor may retry the statement on a fresh connection.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientConnection(_))
    }
}
