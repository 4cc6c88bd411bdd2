//! Background job scheduler and job implementations.

mod pool_metrics;
mod scheduler;
mod store_health;

pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{run_once, Job, JobScheduler};
pub use store_health::StoreHealthJob;
