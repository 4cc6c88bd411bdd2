//! Store reachability gauge.

use std::sync::Arc;
use std::time::Duration;

use domain::store::EventStore;
use metrics::gauge;

use super::scheduler::Job;

/// Sets `event_store_up` to 1 or 0 after pinging the store.
pub struct StoreHealthJob {
    store: Arc<dyn EventStore>,
}

impl StoreHealthJob {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl Job for StoreHealthJob {
    fn name(&self) -> &'static str {
        "store_health"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn execute(&self) -> anyhow::Result<()> {
        match self.store.ping().await {
            Ok(()) => {
                gauge!("event_store_up").set(1.0);
                Ok(())
            }
            Err(e) => {
                gauge!("event_store_up").set(0.0);
                Err(e.into())
            }
        }
    }
}
