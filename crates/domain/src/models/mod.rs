//! Domain models for event registration and attendance.

pub mod alumnus;
pub mod attendance_token;
pub mod event;
pub mod registration;

pub use alumnus::Alumnus;
pub use attendance_token::{
    build_qr_data, generate_token, AttendanceMark, AttendanceToken, IssueAttendanceTokenRequest,
    IssueAttendanceTokenResponse, IssuedAttendanceToken, MarkAttendanceRequest,
    NewAttendanceToken, RevokeAttendanceTokenResponse, TokenState, VerifyAttendanceQuery,
    DEFAULT_TOKEN_TTL_MINUTES, TOKEN_PREFIX,
};
pub use event::{
    CreateEventRequest, EligibilityRules, Event, EventResponse, EventStatus, EventSummary,
    NewEvent, RegistrationWindow,
};
pub use registration::{
    generate_registration_number, AttendanceSummary, ListRegistrationsQuery, NewRegistration,
    RegisterForEventRequest, Registration, RegistrationPage, RegistrationStatus,
};
