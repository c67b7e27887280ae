//! Password reset via emailed single-use tokens.
//!
//! Tokens are 256-bit random values handed out only inside the reset email;
//! storage sees just their SHA-256 hash, so a leaked token table cannot be
//! replayed. Completion claims the token atomically and then sweeps every
//! other token the user holds.

use crate::clock::{Clock, SystemClock};
use crate::error::{BreakwaterError, Result};
use crate::mailer::{password_reset_email, Mailer};
use crate::password::{PasswordHasher, PasswordPolicy};
use crate::storage::{ResetTokenStore, UserStore};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use super::types::{PasswordResetComplete, PasswordResetRequest};

/// Configuration for the password reset flow.
#[derive(Clone)]
pub struct PasswordResetFlowConfig {
    /// Sender address for reset emails.
    pub from_address: String,
    /// Base URL the reset link points at, without a trailing slash.
    pub app_url: String,
    /// How long an issued token stays usable.
    pub token_ttl: Duration,
}

impl Default for PasswordResetFlowConfig {
    fn default() -> Self {
        Self {
            from_address: "noreply@localhost".to_string(),
            app_url: "http://localhost:3000".to_string(),
            token_ttl: Duration::from_secs(60 * 60),
        }
    }
}

/// Handles the forgot-password and reset-password endpoints.
pub struct PasswordResetFlow<U: UserStore, S: ResetTokenStore> {
    users: U,
    tokens: S,
    mailer: Arc<dyn Mailer>,
    password_hasher: PasswordHasher,
    password_policy: PasswordPolicy,
    clock: Arc<dyn Clock>,
    config: PasswordResetFlowConfig,
}

impl<U: UserStore, S: ResetTokenStore> PasswordResetFlow<U, S> {
    /// Create a new password reset flow.
    pub fn new(users: U, tokens: S, mailer: Arc<dyn Mailer>, config: PasswordResetFlowConfig) -> Self {
        Self {
            users,
            tokens,
            mailer,
            password_hasher: PasswordHasher::default(),
            password_policy: PasswordPolicy::default(),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Set a custom password hasher.
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.password_hasher = hasher;
        self
    }

    /// Set a custom password policy.
    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.password_policy = policy;
        self
    }

    /// Set a custom time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Handle a forgot-password request.
    ///
    /// Returns `Ok(())` whether or not the address is registered, so the
    /// endpoint cannot be used to probe for accounts. For a known address a
    /// token is stored and the reset link emailed.
    pub async fn request_reset(&self, req: PasswordResetRequest) -> Result<()> {
        let email = req.email.trim().to_lowercase();

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                tracing::info!(
                    target: "auth.password.reset_requested",
                    email = %email,
                    known = false,
                    "Reset requested for unknown address"
                );
                return Ok(());
            }
        };

        let token = generate_token();
        let expires = self.clock.now() + self.config.token_ttl;
        self.tokens
            .store_token(&self.users.user_id(&user), &hash_token(&token), expires)
            .await?;

        // The token is stored either way; a delivery failure just means the
        // user asks again
        let username = self.users.user_name(&user).unwrap_or_else(|| email.clone());
        let reset_url = format!("{}/reset-password/{token}", self.config.app_url);
        let message =
            password_reset_email(&self.config.from_address, &email, &username, &reset_url);
        if let Err(e) = self.mailer.send(&message).await {
            tracing::warn!(email = %email, "Failed to send reset email: {e}");
        }

        tracing::info!(
            target: "auth.password.reset_requested",
            user_id = %self.users.user_id(&user),
            known = true,
            "Reset token issued"
        );

        Ok(())
    }

    /// Check whether a token is currently redeemable, without consuming it.
    ///
    /// Backs the reset page's initial load, so a dead link can say so before
    /// the user types a new password.
    pub async fn validate_token(&self, token: &str) -> Result<bool> {
        let found = self
            .tokens
            .find_valid(&hash_token(token), self.clock.now())
            .await?;
        Ok(found.is_some())
    }

    /// Complete a reset: claim the token, update the password, sweep the
    /// user's remaining tokens.
    pub async fn complete_reset(&self, req: PasswordResetComplete) -> Result<()> {
        self.password_policy.check(&req.new_password)?;

        // Atomic claim: a token redeemed by a concurrent request is gone
        // before we see it
        let user_id = self
            .tokens
            .claim(&hash_token(&req.token), self.clock.now())
            .await?
            .ok_or(BreakwaterError::InvalidOrExpiredToken)?;

        let hash = self.password_hasher.hash_blocking(req.new_password).await?;
        self.users.update_password_hash(&user_id, &hash).await?;

        // Best effort: the password is already changed, so a failed sweep
        // must not surface as a reset failure
        if let Err(e) = self.tokens.delete_all_for_user(&user_id).await {
            tracing::warn!(user_id = %user_id, "Failed to sweep reset tokens: {e}");
        }

        tracing::info!(
            target: "auth.password.reset_completed",
            user_id = %user_id,
            "Password reset"
        );

        Ok(())
    }
}

/// Generate a 256-bit random token, URL-safe base64 without padding.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// The at-rest form of a token.
fn hash_token(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::super::support::{FailingMailer, MemoryStore, RecordingMailer};
    use super::*;
    use crate::clock::ManualClock;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn t0() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_040)
    }

    struct Fixture {
        store: MemoryStore,
        mailer: RecordingMailer,
        clock: Arc<ManualClock>,
        flow: PasswordResetFlow<MemoryStore, MemoryStore>,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let mailer = RecordingMailer::new();
        let clock = Arc::new(ManualClock::starting_at(t0()));
        let flow = PasswordResetFlow::new(
            store.clone(),
            store.clone(),
            Arc::new(mailer.clone()),
            PasswordResetFlowConfig {
                app_url: "https://app.test".into(),
                ..Default::default()
            },
        )
        .with_hasher(MemoryStore::fast_hasher())
        .with_clock(clock.clone());
        Fixture {
            store,
            mailer,
            clock,
            flow,
        }
    }

    fn request(email: &str) -> PasswordResetRequest {
        PasswordResetRequest {
            email: email.into(),
        }
    }

    /// Pull the plaintext token back out of the emailed link.
    fn emailed_token(mailer: &RecordingMailer) -> String {
        let sent = mailer.sent();
        let text = sent.last().unwrap().text.clone().unwrap();
        let url = text
            .lines()
            .find(|l| l.contains("/reset-password/"))
            .unwrap();
        url.rsplit('/').next().unwrap().trim().to_string()
    }

    #[tokio::test]
    async fn unknown_address_succeeds_without_sending() {
        let fx = fixture();

        fx.flow
            .request_reset(request("ghost@example.com"))
            .await
            .unwrap();

        assert!(fx.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn known_address_gets_a_link_and_a_stored_hash() {
        let fx = fixture();
        let id = fx.store.add_user("user@example.com", "old password");

        fx.flow
            .request_reset(request("User@Example.com"))
            .await
            .unwrap();

        let token = emailed_token(&fx.mailer);
        assert_eq!(fx.store.token_count(&id), 1);
        // Plaintext token never reaches storage
        assert!(fx.flow.validate_token(&token).await.unwrap());
    }

    #[tokio::test]
    async fn full_reset_updates_the_password() {
        let fx = fixture();
        fx.store.add_user("user@example.com", "old password");

        fx.flow
            .request_reset(request("user@example.com"))
            .await
            .unwrap();
        let token = emailed_token(&fx.mailer);

        fx.flow
            .complete_reset(PasswordResetComplete {
                token,
                new_password: "brand new password".into(),
            })
            .await
            .unwrap();

        let stored = fx.store.user("user@example.com");
        assert!(MemoryStore::fast_hasher()
            .verify("brand new password", &stored.password_hash)
            .unwrap());
    }

    #[tokio::test]
    async fn token_is_single_use() {
        let fx = fixture();
        fx.store.add_user("user@example.com", "old password");

        fx.flow
            .request_reset(request("user@example.com"))
            .await
            .unwrap();
        let token = emailed_token(&fx.mailer);

        fx.flow
            .complete_reset(PasswordResetComplete {
                token: token.clone(),
                new_password: "brand new password".into(),
            })
            .await
            .unwrap();

        let err = fx
            .flow
            .complete_reset(PasswordResetComplete {
                token,
                new_password: "another password".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BreakwaterError::InvalidOrExpiredToken));
    }

    #[tokio::test]
    async fn reset_sweeps_every_outstanding_token() {
        let fx = fixture();
        let id = fx.store.add_user("user@example.com", "old password");

        // Three forgot-password requests, three live tokens
        for _ in 0..3 {
            fx.flow
                .request_reset(request("user@example.com"))
                .await
                .unwrap();
        }
        assert_eq!(fx.store.token_count(&id), 3);
        let latest = emailed_token(&fx.mailer);

        fx.flow
            .complete_reset(PasswordResetComplete {
                token: latest,
                new_password: "brand new password".into(),
            })
            .await
            .unwrap();

        assert_eq!(fx.store.token_count(&id), 0);
    }

    #[tokio::test]
    async fn token_expires_after_an_hour() {
        let fx = fixture();
        fx.store.add_user("user@example.com", "old password");

        fx.flow
            .request_reset(request("user@example.com"))
            .await
            .unwrap();
        let token = emailed_token(&fx.mailer);

        fx.clock.advance(Duration::from_secs(61 * 60));

        assert!(!fx.flow.validate_token(&token).await.unwrap());
        let err = fx
            .flow
            .complete_reset(PasswordResetComplete {
                token,
                new_password: "brand new password".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BreakwaterError::InvalidOrExpiredToken));
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let fx = fixture();

        assert!(!fx.flow.validate_token("not-a-real-token").await.unwrap());
        let err = fx
            .flow
            .complete_reset(PasswordResetComplete {
                token: "not-a-real-token".into(),
                new_password: "brand new password".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BreakwaterError::InvalidOrExpiredToken));
    }

    #[tokio::test]
    async fn weak_new_password_is_rejected_before_the_token_is_spent() {
        let fx = fixture();
        fx.store.add_user("user@example.com", "old password");

        fx.flow
            .request_reset(request("user@example.com"))
            .await
            .unwrap();
        let token = emailed_token(&fx.mailer);

        let err = fx
            .flow
            .complete_reset(PasswordResetComplete {
                token: token.clone(),
                new_password: "short".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BreakwaterError::Validation(_)));

        // Token survives the rejected attempt
        assert!(fx.flow.validate_token(&token).await.unwrap());
    }

    #[tokio::test]
    async fn delivery_failure_still_stores_the_token() {
        let store = MemoryStore::new();
        let id = store.add_user("user@example.com", "old password");
        let flow = PasswordResetFlow::new(
            store.clone(),
            store.clone(),
            Arc::new(FailingMailer),
            PasswordResetFlowConfig::default(),
        )
        .with_hasher(MemoryStore::fast_hasher());

        flow.request_reset(request("user@example.com"))
            .await
            .unwrap();

        assert_eq!(store.token_count(&id), 1);
    }
}
