//! Reset-token storage trait.

use crate::error::Result;
use async_trait::async_trait;
use std::time::SystemTime;

/// Trait for password-reset token storage.
///
/// Only token *hashes* ever reach this store; the plaintext token lives in
/// the reset email and nowhere else. A user may hold several outstanding
/// tokens at once (repeated forgot-password requests), which is why
/// consumption deletes them all.
#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    /// Persist a token hash with its expiry instant.
    async fn store_token(
        &self,
        user_id: &str,
        token_hash: &str,
        expires: SystemTime,
    ) -> Result<()>;

    /// Look up an unexpired token by hash without consuming it.
    ///
    /// Returns the owning user's id. Used by the reset page to check a link
    /// before the user has typed a new password.
    async fn find_valid(&self, token_hash: &str, now: SystemTime) -> Result<Option<String>>;

    /// Atomically delete-and-claim an unexpired token by hash.
    ///
    /// Must be a single conditional operation: of two concurrent resets
    /// presenting the same token, exactly one may receive the user id.
    async fn claim(&self, token_hash: &str, now: SystemTime) -> Result<Option<String>>;

    /// Delete every reset token belonging to the user.
    ///
    /// Called after a successful password update so no stale token survives
    /// the reset.
    async fn delete_all_for_user(&self, user_id: &str) -> Result<()>;
}
