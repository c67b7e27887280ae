//! Login flow with step-up second factor.
//!
//! This module emits tracing events for security monitoring:
//! - `auth.login.succeeded` - Login completed, identity handed to the caller
//! - `auth.login.failed` - Credentials or second factor rejected
//! - `auth.login.second_factor_required` - Challenge issued and dispatched

use crate::challenge::{challenge_expired, ChallengeSlot, CHALLENGE_TTL};
use crate::clock::{Clock, SystemClock};
use crate::error::{BreakwaterError, Result};
use crate::mailer::{verification_code_email, CodePurpose, Mailer};
use crate::otp::OtpEngine;
use crate::password::PasswordHasher;
use crate::storage::UserStore;
use std::sync::Arc;
use std::time::Duration;

use super::types::{AuthenticatedUser, LoginOutcome, LoginRequest, SecondFactorRequest};

/// Configuration for the login flow.
#[derive(Clone)]
pub struct LoginFlowConfig {
    /// Sender address for challenge emails.
    pub from_address: String,
    /// How long an issued login challenge stays confirmable.
    pub challenge_ttl: Duration,
}

impl Default for LoginFlowConfig {
    fn default() -> Self {
        Self {
            from_address: "noreply@localhost".to_string(),
            challenge_ttl: CHALLENGE_TTL,
        }
    }
}

/// Handles the login flow including the emailed second factor.
pub struct LoginFlow<U: UserStore> {
    users: U,
    mailer: Arc<dyn Mailer>,
    otp: OtpEngine,
    password_hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
    config: LoginFlowConfig,
}

impl<U: UserStore> LoginFlow<U> {
    /// Create a new login flow.
    pub fn new(users: U, mailer: Arc<dyn Mailer>, config: LoginFlowConfig) -> Self {
        Self {
            users,
            mailer,
            otp: OtpEngine::new(),
            password_hasher: PasswordHasher::default(),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Set a custom password hasher.
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.password_hasher = hasher;
        self
    }

    /// Set a custom time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Primary login: check credentials, then either authenticate directly,
    /// issue a step-up challenge, or resolve one if a code came along.
    pub async fn submit_credentials(&self, req: LoginRequest) -> Result<LoginOutcome> {
        let email = req.email.trim().to_lowercase();

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                // Hash anyway so unknown addresses cost the same as wrong
                // passwords
                let _ = self
                    .password_hasher
                    .hash_blocking("breakwater-dummy".into())
                    .await;
                tracing::info!(
                    target: "auth.login.failed",
                    email = %email,
                    reason = "unknown_email",
                    "Login rejected"
                );
                return Err(BreakwaterError::InvalidCredentials);
            }
        };

        let hash = self.users.password_hash(&user).await?;
        if !self
            .password_hasher
            .verify_blocking(req.password, hash)
            .await?
        {
            tracing::info!(
                target: "auth.login.failed",
                email = %email,
                reason = "wrong_password",
                "Login rejected"
            );
            return Err(BreakwaterError::InvalidCredentials);
        }

        if !self.users.two_factor_enabled(&user).await? {
            return self.complete_login(&user);
        }

        // Client resubmitted credentials together with the emailed code
        if let Some(code) = req.code {
            return self.resolve_challenge(&user, code.trim()).await;
        }

        self.issue_challenge(&user).await
    }

    /// Second step: verify the emailed code against the pending challenge.
    pub async fn submit_second_factor(&self, req: SecondFactorRequest) -> Result<LoginOutcome> {
        let email = req.email.trim().to_lowercase();

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(BreakwaterError::InvalidCredentials)?;

        self.resolve_challenge(&user, req.code.trim()).await
    }

    /// Generate a fresh code from the persistent secret, suspend the secret
    /// inside a `LoginChallenge`, and dispatch the code.
    async fn issue_challenge(&self, user: &U::User) -> Result<LoginOutcome> {
        let user_id = self.users.user_id(user);
        let email = self.users.user_email(user);

        // The secret survives in whichever slot variant currently holds it;
        // a missing slot on a 2FA-enabled account is a storage-level bug.
        let secret = match self.users.challenge(&user_id).await? {
            Some(slot) => slot.secret().to_string(),
            None => {
                return Err(BreakwaterError::internal(
                    "two-factor enabled but no secret on record",
                ))
            }
        };

        let issued = self.otp.generate(&secret, self.clock.now());
        self.users
            .set_challenge(
                &user_id,
                Some(ChallengeSlot::LoginChallenge {
                    secret,
                    code: issued.code.clone(),
                    issued_at: issued.issued_at,
                }),
            )
            .await?;

        // Challenge issuance stands even if delivery fails; the user can
        // retry and get a resend
        let username = self.users.user_name(user).unwrap_or_else(|| email.clone());
        let message = verification_code_email(
            &self.config.from_address,
            &email,
            &username,
            &issued.code,
            CodePurpose::Login,
        );
        if let Err(e) = self.mailer.send(&message).await {
            tracing::warn!(user_id = %user_id, "Failed to send login code: {e}");
        }

        tracing::info!(
            target: "auth.login.second_factor_required",
            user_id = %user_id,
            "Step-up challenge issued"
        );

        Ok(LoginOutcome::SecondFactorRequired { email })
    }

    /// Exact-match check of `code` against the pending login challenge.
    ///
    /// Success and expiry both restore the persistent secret into the slot;
    /// a mismatch leaves the challenge pending so the user can retry within
    /// the window.
    async fn resolve_challenge(&self, user: &U::User, code: &str) -> Result<LoginOutcome> {
        let user_id = self.users.user_id(user);

        let (secret, expected, issued_at) = match self.users.challenge(&user_id).await? {
            Some(ChallengeSlot::LoginChallenge {
                secret,
                code,
                issued_at,
            }) => (secret, code, issued_at),
            _ => {
                tracing::info!(
                    target: "auth.login.failed",
                    user_id = %user_id,
                    reason = "no_pending_challenge",
                    "Second factor rejected"
                );
                return Err(BreakwaterError::InvalidCredentials);
            }
        };

        if challenge_expired(issued_at, self.clock.now(), self.config.challenge_ttl) {
            self.users
                .set_challenge(&user_id, Some(ChallengeSlot::TwoFactorSecret { secret }))
                .await?;
            tracing::info!(
                target: "auth.login.failed",
                user_id = %user_id,
                reason = "expired_challenge",
                "Second factor rejected"
            );
            return Err(BreakwaterError::ExpiredChallenge);
        }

        if code != expected {
            tracing::info!(
                target: "auth.login.failed",
                user_id = %user_id,
                reason = "code_mismatch",
                "Second factor rejected"
            );
            return Err(BreakwaterError::InvalidCredentials);
        }

        self.users
            .set_challenge(&user_id, Some(ChallengeSlot::TwoFactorSecret { secret }))
            .await?;

        self.complete_login(user)
    }

    fn complete_login(&self, user: &U::User) -> Result<LoginOutcome> {
        let identity = AuthenticatedUser {
            id: self.users.user_id(user),
            email: self.users.user_email(user),
            name: self.users.user_name(user),
        };

        tracing::info!(
            target: "auth.login.succeeded",
            user_id = %identity.id,
            "Login completed"
        );

        Ok(LoginOutcome::Authenticated { user: identity })
    }
}
