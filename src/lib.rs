//! Breakwater - the security protocol layer for email-based authentication
//!
//! Breakwater implements the account-security flows a web application needs
//! behind its route handlers: registration, password login with an emailed
//! second factor, two-factor enrollment, and single-use password reset
//! tokens. Storage and email delivery are injected through traits, so the
//! crate carries no opinion about your database or SMTP provider.
//!
//! # Features
//!
//! - **One-time codes**: Deterministic six-digit codes on 1-minute steps
//! - **Login**: Credential check with a step-up emailed second factor
//! - **Enrollment**: Challenge-confirmed enable/disable of two-factor auth
//! - **Reset tokens**: 256-bit single-use tokens, hashed at rest
//! - **Passwords**: Argon2id hashing off the async runtime
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use breakwater::{LoginFlow, LoginFlowConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize logging
//!     breakwater::init_tracing();
//!
//!     // `users` implements UserStore, `mailer` implements Mailer
//!     let login = LoginFlow::new(users, Arc::new(mailer), LoginFlowConfig::default());
//!
//!     // Call from your route handlers
//!     let outcome = login.submit_credentials(request).await?;
//! }
//! ```

pub mod challenge;
pub mod clock;
mod error;
pub mod flows;
pub mod mailer;
pub mod otp;
pub mod password;
pub mod storage;

// Re-exports for public API
pub use challenge::{ChallengeSlot, TwoFactorAction, CHALLENGE_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BreakwaterError, Result};
pub use flows::{
    AuthenticatedUser, EnrollmentFlowConfig, LoginFlow, LoginFlowConfig, LoginOutcome,
    LoginRequest, PasswordResetComplete, PasswordResetFlow, PasswordResetFlowConfig,
    PasswordResetRequest, RegisterRequest, RegistrationFlow, SecondFactorRequest,
    TwoFactorEnrollmentFlow, TwoFactorUpdate,
};
pub use mailer::{ConsoleMailer, Email, Mailer};
pub use otp::{generate_secret, IssuedCode, OtpEngine};
pub use password::{PasswordConfig, PasswordHasher, PasswordPolicy};
pub use storage::{ResetTokenStore, UserCreator, UserStore};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main()
/// before wiring up the flows.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "breakwater=debug")
/// - `BREAKWATER_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("BREAKWATER_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
