use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("page must be at least 1")]
    PageOutOfRange,
    #[error("page size must be between 1 and {0}")]
    PageSizeOutOfRange(u32),
}
