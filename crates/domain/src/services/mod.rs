//! Domain services for event registration and attendance.
//!
//! Services hold a shared `EventStore` handle and contain the business rules;
//! the store provides the atomic steps they are built from.

pub mod attendance_tokens;
pub mod attendance_verifier;
pub mod eligibility;
pub mod lifecycle;
pub mod registration_ledger;

use std::sync::Arc;

use crate::store::EventStore;

pub use attendance_tokens::{AttendanceTokenService, TokenPolicy, MAX_TOKEN_TTL_MINUTES};
pub use attendance_verifier::AttendanceVerifier;
pub use eligibility::{evaluate, is_eligible, IneligibleReason};
pub use lifecycle::{can_mark_attendance, can_register, EventLifecycle};
pub use registration_ledger::{RegistrationLedger, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// All services wired to one store.
#[derive(Clone)]
pub struct EventServices {
    pub lifecycle: EventLifecycle,
    pub ledger: RegistrationLedger,
    pub tokens: AttendanceTokenService,
    pub verifier: AttendanceVerifier,
}

impl EventServices {
    pub fn new(store: Arc<dyn EventStore>, policy: TokenPolicy) -> Self {
        let tokens = AttendanceTokenService::new(store.clone(), policy);
        Self {
            lifecycle: EventLifecycle::new(store.clone()),
            ledger: RegistrationLedger::new(store.clone()),
            verifier: AttendanceVerifier::new(store, tokens.clone()),
            tokens,
        }
    }
}
