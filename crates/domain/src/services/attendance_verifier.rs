//! Attendance verification and marking.
//!
//! The token proves the caller was shown the venue QR code; the caller's
//! identity comes from the session, and attendance is only recorded against
//! a registration that already exists.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::attendance_tokens::AttendanceTokenService;
use super::lifecycle::can_mark_attendance;
use crate::error::{EventCoreError, RegistrationLookup};
use crate::models::{AttendanceMark, Event, EventSummary};
use crate::store::{EventStore, MarkOutcome};

#[derive(Clone)]
pub struct AttendanceVerifier {
    store: Arc<dyn EventStore>,
    tokens: AttendanceTokenService,
}

impl AttendanceVerifier {
    pub fn new(store: Arc<dyn EventStore>, tokens: AttendanceTokenService) -> Self {
        Self { store, tokens }
    }

    async fn load_event(&self, event_id: Uuid) -> Result<Event, EventCoreError> {
        self.store
            .find_event(event_id)
            .await?
            .ok_or(EventCoreError::EventNotFound { event_id })
    }

    /// Read-only token check shown before the attendee confirms.
    pub async fn verify(
        &self,
        event_id: Uuid,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<EventSummary, EventCoreError> {
        self.tokens.validate(event_id, token, now).await?;
        let event = self.load_event(event_id).await?;
        Ok(event.summary())
    }

    /// Marks the alumnus's confirmed registration as attended.
    ///
    /// Repeating the call with a still valid token succeeds and returns the
    /// record as first marked.
    pub async fn mark_attendance(
        &self,
        event_id: Uuid,
        token: &str,
        alumni_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<AttendanceMark, EventCoreError> {
        self.tokens.validate(event_id, token, now).await?;

        let event = self.load_event(event_id).await?;
        if !can_mark_attendance(&event) {
            return Err(EventCoreError::EventNotAttendable {
                event_id,
                status: event.status,
            });
        }

        match self.store.mark_attended(event_id, alumni_id, now).await? {
            MarkOutcome::Marked(registration) => {
                info!(
                    event_id = %event_id,
                    alumni_id = %alumni_id,
                    registration_id = %registration.id,
                    "Attendance marked"
                );
                Ok(AttendanceMark {
                    registration,
                    newly_marked: true,
                })
            }
            MarkOutcome::AlreadyMarked(registration) => {
                debug!(
                    event_id = %event_id,
                    registration_id = %registration.id,
                    "Attendance already marked"
                );
                Ok(AttendanceMark {
                    registration,
                    newly_marked: false,
                })
            }
            MarkOutcome::Cancelled(registration) => Err(EventCoreError::RegistrationCancelled {
                registration_id: registration.id,
            }),
            MarkOutcome::NotRegistered => Err(EventCoreError::RegistrationNotFound {
                lookup: RegistrationLookup::ByAttendee {
                    event_id,
                    alumni_id,
                },
            }),
        }
    }
}
