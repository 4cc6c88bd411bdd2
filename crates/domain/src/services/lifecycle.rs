//! Event lifecycle state machine.
//!
//! ```text
//! draft -> published -> ongoing -> completed
//!   |          |           |
//!   +----------+-----------+--> cancelled
//! ```
//!
//! Completed and cancelled are terminal.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EventCoreError;
use crate::models::{Event, EventStatus, NewEvent};
use crate::store::EventStore;

/// Compare-and-set attempts before a transition gives up on a contended row.
const MAX_TRANSITION_ATTEMPTS: usize = 3;

impl EventStatus {
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        use EventStatus::*;
        matches!(
            (self, next),
            (Draft, Published)
                | (Published, Ongoing)
                | (Ongoing, Completed)
                | (Draft, Cancelled)
                | (Published, Cancelled)
                | (Ongoing, Cancelled)
        )
    }
}

/// Published and inside the half-open registration window.
pub fn can_register(event: &Event, now: DateTime<Utc>) -> bool {
    event.status == EventStatus::Published && event.registration_window.contains(now)
}

pub fn can_mark_attendance(event: &Event) -> bool {
    matches!(event.status, EventStatus::Published | EventStatus::Ongoing)
}

/// Creates events and drives their status transitions.
#[derive(Clone)]
pub struct EventLifecycle {
    store: Arc<dyn EventStore>,
}

impl EventLifecycle {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Stores a new event in `draft`.
    pub async fn create(&self, event: NewEvent, now: DateTime<Utc>) -> Result<Event, EventCoreError> {
        let event = self.store.insert_event(event, now).await?;
        info!(event_id = %event.id, title = %event.title, "Event created");
        Ok(event)
    }

    pub async fn get(&self, event_id: Uuid) -> Result<Event, EventCoreError> {
        self.store
            .find_event(event_id)
            .await?
            .ok_or(EventCoreError::EventNotFound { event_id })
    }

    pub async fn publish(&self, event_id: Uuid, now: DateTime<Utc>) -> Result<Event, EventCoreError> {
        self.transition(event_id, EventStatus::Published, now).await
    }

    pub async fn start(&self, event_id: Uuid, now: DateTime<Utc>) -> Result<Event, EventCoreError> {
        self.transition(event_id, EventStatus::Ongoing, now).await
    }

    pub async fn complete(&self, event_id: Uuid, now: DateTime<Utc>) -> Result<Event, EventCoreError> {
        self.transition(event_id, EventStatus::Completed, now).await
    }

    pub async fn cancel(&self, event_id: Uuid, now: DateTime<Utc>) -> Result<Event, EventCoreError> {
        self.transition(event_id, EventStatus::Cancelled, now).await
    }

    /// Validates against the status just read and applies it with a
    /// compare-and-set. A lost race re-reads and re-validates.
    pub async fn transition(
        &self,
        event_id: Uuid,
        next: EventStatus,
        now: DateTime<Utc>,
    ) -> Result<Event, EventCoreError> {
        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let event = self.get(event_id).await?;
            let from = event.status;
            if !from.can_transition_to(next) {
                return Err(EventCoreError::InvalidTransition {
                    event_id,
                    from,
                    to: next,
                });
            }

            if let Some(updated) = self
                .store
                .update_event_status(event_id, from, next, now)
                .await?
            {
                info!(event_id = %event_id, from = %from, to = %next, "Event status changed");
                if next.is_terminal() {
                    // A finished event accepts no attendance; drop its QR code.
                    let revoked = self.store.revoke_attendance_tokens(event_id, now).await?;
                    if revoked > 0 {
                        info!(event_id = %event_id, revoked, "Attendance tokens revoked with event");
                    }
                }
                return Ok(updated);
            }
            warn!(event_id = %event_id, to = %next, "Event status changed concurrently, retrying");
        }

        let current = self.get(event_id).await?;
        Err(EventCoreError::InvalidTransition {
            event_id,
            from: current.status,
            to: next,
        })
    }
}
