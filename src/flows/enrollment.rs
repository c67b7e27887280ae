//! Two-factor enrollment: enabling and disabling the emailed second factor.
//!
//! Both transitions are challenge-confirmed. Initiation stores an
//! `EnrollmentChallenge` in the user's slot and emails the code for its
//! issuance step; confirmation recomputes that step's code from the stored
//! secret and compares exactly. Only a confirmed challenge flips the
//! enabled flag.

use crate::challenge::{challenge_expired, ChallengeSlot, TwoFactorAction, CHALLENGE_TTL};
use crate::clock::{Clock, SystemClock};
use crate::error::{BreakwaterError, Result};
use crate::mailer::{verification_code_email, CodePurpose, Mailer};
use crate::otp::{generate_secret, OtpEngine};
use crate::storage::UserStore;
use std::sync::Arc;
use std::time::Duration;

use super::types::TwoFactorUpdate;

/// Configuration for the enrollment flow.
#[derive(Clone)]
pub struct EnrollmentFlowConfig {
    /// Sender address for challenge emails.
    pub from_address: String,
    /// How long an issued enrollment challenge stays confirmable.
    pub challenge_ttl: Duration,
}

impl Default for EnrollmentFlowConfig {
    fn default() -> Self {
        Self {
            from_address: "noreply@localhost".to_string(),
            challenge_ttl: CHALLENGE_TTL,
        }
    }
}

/// Handles enabling and disabling two-factor authentication.
pub struct TwoFactorEnrollmentFlow<U: UserStore> {
    users: U,
    mailer: Arc<dyn Mailer>,
    otp: OtpEngine,
    clock: Arc<dyn Clock>,
    config: EnrollmentFlowConfig,
}

impl<U: UserStore> TwoFactorEnrollmentFlow<U> {
    /// Create a new enrollment flow.
    pub fn new(users: U, mailer: Arc<dyn Mailer>, config: EnrollmentFlowConfig) -> Self {
        Self {
            users,
            mailer,
            otp: OtpEngine::new(),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Set a custom time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start enabling two-factor auth for an authenticated user.
    ///
    /// Generates a brand-new secret, stores it as a pending challenge, and
    /// emails the code. Nothing is enabled until [`confirm`](Self::confirm)
    /// succeeds; a repeat call simply replaces the pending challenge with a
    /// fresh secret.
    pub async fn initiate_enable(&self, user_id: &str) -> Result<()> {
        let user = self.require_user(user_id).await?;

        if self.users.two_factor_enabled(&user).await? {
            return Err(BreakwaterError::validation(
                "Two-factor authentication is already enabled",
            ));
        }

        let secret = generate_secret();
        self.issue(&user, secret, TwoFactorAction::Enable).await
    }

    /// Start disabling two-factor auth for an authenticated user.
    ///
    /// Reuses the enrolled secret so the confirmation code is derived from
    /// the factor being removed.
    pub async fn initiate_disable(&self, user_id: &str) -> Result<()> {
        let user = self.require_user(user_id).await?;

        if !self.users.two_factor_enabled(&user).await? {
            return Err(BreakwaterError::validation(
                "Two-factor authentication is not enabled",
            ));
        }

        let secret = match self.users.challenge(user_id).await? {
            Some(slot) => slot.secret().to_string(),
            None => {
                return Err(BreakwaterError::internal(
                    "two-factor enabled but no secret on record",
                ))
            }
        };

        self.issue(&user, secret, TwoFactorAction::Disable).await
    }

    /// Confirm a pending enrollment challenge with the emailed code.
    ///
    /// On a match the enabled flag flips and the slot settles: enable leaves
    /// the confirmed secret as the persistent `TwoFactorSecret`, disable
    /// clears the slot entirely. Expiry rolls the slot back to its
    /// pre-initiation state.
    pub async fn confirm(&self, user_id: &str, code: &str) -> Result<TwoFactorUpdate> {
        self.require_user(user_id).await?;

        let (secret, action, issued_at) = match self.users.challenge(user_id).await? {
            Some(ChallengeSlot::EnrollmentChallenge {
                secret,
                action,
                issued_at,
            }) => (secret, action, issued_at),
            _ => {
                return Err(BreakwaterError::validation(
                    "No pending two-factor challenge",
                ))
            }
        };

        if challenge_expired(issued_at, self.clock.now(), self.config.challenge_ttl) {
            let rollback = match action {
                // Enable never completed, so there is nothing to keep
                TwoFactorAction::Enable => None,
                // The factor is still enabled; its secret must survive
                TwoFactorAction::Disable => Some(ChallengeSlot::TwoFactorSecret { secret }),
            };
            self.users.set_challenge(user_id, rollback).await?;
            tracing::info!(
                target: "auth.two_factor.challenge_expired",
                user_id = %user_id,
                action = ?action,
                "Enrollment challenge expired"
            );
            return Err(BreakwaterError::ExpiredChallenge);
        }

        // The challenge is pinned to its issuance step, so the expected code
        // is recomputed rather than searched for across a window.
        if code.trim() != self.otp.code_at(&secret, issued_at) {
            tracing::info!(
                target: "auth.two_factor.confirm_failed",
                user_id = %user_id,
                action = ?action,
                "Enrollment code rejected"
            );
            return Err(BreakwaterError::InvalidCode);
        }

        let update = match action {
            TwoFactorAction::Enable => {
                self.users.enable_two_factor(user_id, &secret).await?;
                TwoFactorUpdate::Enabled
            }
            TwoFactorAction::Disable => {
                self.users.disable_two_factor(user_id).await?;
                TwoFactorUpdate::Disabled
            }
        };

        tracing::info!(
            target: "auth.two_factor.updated",
            user_id = %user_id,
            state = ?update,
            "Two-factor state changed"
        );

        Ok(update)
    }

    async fn require_user(&self, user_id: &str) -> Result<U::User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| BreakwaterError::unauthorized("Unknown user"))
    }

    async fn issue(&self, user: &U::User, secret: String, action: TwoFactorAction) -> Result<()> {
        let user_id = self.users.user_id(user);
        let email = self.users.user_email(user);

        let issued = self.otp.generate(&secret, self.clock.now());
        self.users
            .set_challenge(
                &user_id,
                Some(ChallengeSlot::EnrollmentChallenge {
                    secret,
                    action,
                    issued_at: issued.issued_at,
                }),
            )
            .await?;

        let purpose = match action {
            TwoFactorAction::Enable => CodePurpose::EnableTwoFactor,
            TwoFactorAction::Disable => CodePurpose::DisableTwoFactor,
        };

        // Challenge issuance stands even if delivery fails; re-initiation
        // gets a fresh code
        let username = self.users.user_name(user).unwrap_or_else(|| email.clone());
        let message = verification_code_email(
            &self.config.from_address,
            &email,
            &username,
            &issued.code,
            purpose,
        );
        if let Err(e) = self.mailer.send(&message).await {
            tracing::warn!(user_id = %user_id, "Failed to send enrollment code: {e}");
        }

        tracing::info!(
            target: "auth.two_factor.challenge_issued",
            user_id = %user_id,
            action = ?action,
            "Enrollment challenge issued"
        );

        Ok(())
    }
}
