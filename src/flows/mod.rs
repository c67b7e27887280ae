//! Authentication flows.
//!
//! Each flow is a plain struct, generic over the storage traits it needs,
//! with the mailer and clock injected. Wire them up once at startup and call
//! them from your route handlers.

pub mod enrollment;
pub mod login;
pub mod register;
pub mod reset;
mod types;

pub use enrollment::{EnrollmentFlowConfig, TwoFactorEnrollmentFlow};
pub use login::{LoginFlow, LoginFlowConfig};
pub use register::RegistrationFlow;
pub use reset::{PasswordResetFlow, PasswordResetFlowConfig};
pub use types::{
    AuthenticatedUser, LoginOutcome, LoginRequest, PasswordResetComplete, PasswordResetRequest,
    RegisterRequest, SecondFactorRequest, TwoFactorUpdate,
};
