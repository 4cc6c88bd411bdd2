//! Repository implementations for database operations.

pub mod attendance_token;
pub mod event;
pub mod registration;

pub use attendance_token::AttendanceTokenRepository;
pub use event::EventRepository;
pub use registration::RegistrationRepository;
