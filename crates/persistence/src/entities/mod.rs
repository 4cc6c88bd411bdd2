//! Database entity definitions.
//!
//! Entities map directly to database rows and convert into domain models.

pub mod attendance_token;
pub mod event;
pub mod registration;

pub use attendance_token::AttendanceTokenEntity;
pub use event::{EventEntity, EventStatusDb};
pub use registration::{RegistrationEntity, RegistrationStatusDb};
