pub mod alert_service;
pub mod dashboard_service;
pub mod error;
pub mod ingest_service;
pub mod mitigation_service;

pub use error::AppError;
