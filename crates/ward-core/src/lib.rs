pub mod alert;
pub mod bucket;
pub mod error;
pub mod managed_object;
pub mod mitigation;
pub mod page;
pub mod ranking;
pub mod reconcile;
pub mod rollup;
pub mod stats;
