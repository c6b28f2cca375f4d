//! Core business logic: record types, the repository abstraction and the
//! financial calculations

pub mod component;
pub mod config;
pub mod financial;
pub mod log;
pub mod metrics;
pub mod payment;
pub mod project;
pub mod projection;
pub mod repository;
pub mod supplier;

// Re-export main types for cleaner imports
pub use financial::{PaymentRecord, PnLResult, compute_irr, compute_pnl};
pub use metrics::{DashboardStats, IrrReport, MetricsService};
pub use repository::{Record, RecordId, Relation, Repository};
