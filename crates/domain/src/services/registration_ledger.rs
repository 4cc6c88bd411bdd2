//! Registration ledger.
//!
//! Owns the attendee counter and the registration records. The read-side
//! checks here (status, window, eligibility, duplicates) give precise errors
//! early; the store repeats the ones that can race inside its atomic
//! reservation, which is what actually protects capacity.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::pagination::{clamp_limit, encode_cursor};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::eligibility;
use super::lifecycle::can_register;
use crate::error::{EventCoreError, RegistrationLookup};
use crate::models::{
    generate_registration_number, Alumnus, AttendanceSummary, NewRegistration, Registration,
    RegistrationPage,
};
use crate::store::{CancelOutcome, EventStore, ReserveOutcome};

/// Attempts to find an unused registration number before giving up.
const MAX_NUMBER_ATTEMPTS: usize = 5;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 200;

#[derive(Clone)]
pub struct RegistrationLedger {
    store: Arc<dyn EventStore>,
}

impl RegistrationLedger {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Registers an alumnus for an event, taking one seat atomically.
    ///
    /// `fee_paid` is forced to true for free events.
    pub async fn register(
        &self,
        event_id: Uuid,
        alumnus: &Alumnus,
        fee_paid: bool,
        now: DateTime<Utc>,
    ) -> Result<Registration, EventCoreError> {
        let event = self
            .store
            .find_event(event_id)
            .await?
            .ok_or(EventCoreError::EventNotFound { event_id })?;

        if !can_register(&event, now) {
            return Err(EventCoreError::RegistrationClosed {
                event_id,
                status: event.status,
            });
        }

        eligibility::evaluate(&event.eligibility, alumnus).map_err(|reason| {
            EventCoreError::NotEligible {
                event_id,
                alumni_id: alumnus.id,
                reason,
            }
        })?;

        if self
            .store
            .find_confirmed_registration(event_id, alumnus.id)
            .await?
            .is_some()
        {
            return Err(EventCoreError::DuplicateRegistration {
                event_id,
                alumni_id: alumnus.id,
            });
        }

        let fee_paid = fee_paid || event.is_free();

        for _ in 0..MAX_NUMBER_ATTEMPTS {
            let new = NewRegistration {
                event_id,
                alumni_id: alumnus.id,
                registration_number: generate_registration_number(now),
                fee_paid,
                registered_at: now,
            };

            match self.store.reserve_and_register(new).await? {
                ReserveOutcome::Registered(registration) => {
                    info!(
                        event_id = %event_id,
                        alumni_id = %alumnus.id,
                        registration_id = %registration.id,
                        registration_number = %registration.registration_number,
                        "Registration confirmed"
                    );
                    return Ok(registration);
                }
                ReserveOutcome::CapacityExceeded { capacity } => {
                    return Err(EventCoreError::CapacityExceeded { event_id, capacity });
                }
                ReserveOutcome::Duplicate => {
                    return Err(EventCoreError::DuplicateRegistration {
                        event_id,
                        alumni_id: alumnus.id,
                    });
                }
                ReserveOutcome::EventNotOpen { status } => {
                    return Err(EventCoreError::RegistrationClosed { event_id, status });
                }
                ReserveOutcome::EventMissing => {
                    return Err(EventCoreError::EventNotFound { event_id });
                }
                ReserveOutcome::NumberTaken => {
                    warn!(event_id = %event_id, "Registration number collision, regenerating");
                }
            }
        }

        Err(EventCoreError::InvariantViolation(format!(
            "no unused registration number after {} attempts",
            MAX_NUMBER_ATTEMPTS
        )))
    }

    /// Cancels a confirmed registration and releases its seat.
    pub async fn cancel(
        &self,
        registration_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Registration, EventCoreError> {
        match self.store.cancel_registration(registration_id, now).await? {
            CancelOutcome::Cancelled(registration) => {
                info!(
                    event_id = %registration.event_id,
                    registration_id = %registration_id,
                    "Registration cancelled"
                );
                Ok(registration)
            }
            CancelOutcome::NotFound => Err(EventCoreError::RegistrationNotFound {
                lookup: RegistrationLookup::ById(registration_id),
            }),
            CancelOutcome::AlreadyCancelled(_) => {
                Err(EventCoreError::AlreadyCancelled { registration_id })
            }
            CancelOutcome::Attended(_) => {
                Err(EventCoreError::AttendanceAlreadyMarked { registration_id })
            }
            CancelOutcome::CounterUnderflow { event_id } => {
                error!(
                    event_id = %event_id,
                    registration_id = %registration_id,
                    "Attendee counter would drop below zero"
                );
                Err(EventCoreError::InvariantViolation(format!(
                    "current_attendees of event {} is already zero while cancelling registration {}",
                    event_id, registration_id
                )))
            }
        }
    }

    pub async fn get(&self, registration_id: Uuid) -> Result<Registration, EventCoreError> {
        self.store
            .find_registration(registration_id)
            .await?
            .ok_or(EventCoreError::RegistrationNotFound {
                lookup: RegistrationLookup::ById(registration_id),
            })
    }

    /// One page of an event's roster in registration order.
    pub async fn list(
        &self,
        event_id: Uuid,
        after: Option<(DateTime<Utc>, Uuid)>,
        limit: Option<u32>,
    ) -> Result<RegistrationPage, EventCoreError> {
        if self.store.find_event(event_id).await?.is_none() {
            return Err(EventCoreError::EventNotFound { event_id });
        }

        let limit = clamp_limit(limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        let mut data = self
            .store
            .list_registrations(event_id, after, limit + 1)
            .await?;

        let next_cursor = if data.len() > limit as usize {
            data.truncate(limit as usize);
            data.last()
                .map(|last| encode_cursor(last.registered_at, last.id))
        } else {
            None
        };

        Ok(RegistrationPage { data, next_cursor })
    }

    pub async fn summary(&self, event_id: Uuid) -> Result<AttendanceSummary, EventCoreError> {
        Ok(self.store.attendance_summary(event_id).await?)
    }
}
