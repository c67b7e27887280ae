//! Registration flow.

use crate::error::{BreakwaterError, Result};
use crate::password::{PasswordHasher, PasswordPolicy};
use crate::storage::UserCreator;

use super::types::RegisterRequest;

/// Handles user registration.
pub struct RegistrationFlow<C: UserCreator> {
    user_creator: C,
    password_hasher: PasswordHasher,
    password_policy: PasswordPolicy,
}

impl<C: UserCreator> RegistrationFlow<C> {
    /// Create a new registration flow.
    pub fn new(user_creator: C) -> Self {
        Self {
            user_creator,
            password_hasher: PasswordHasher::default(),
            password_policy: PasswordPolicy::default(),
        }
    }

    /// Set a custom password policy.
    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.password_policy = policy;
        self
    }

    /// Set a custom password hasher.
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.password_hasher = hasher;
        self
    }

    /// Register a new user.
    pub async fn register(&self, req: RegisterRequest) -> Result<C::User> {
        let email = req.email.trim().to_lowercase();

        // Input is rejected before any storage or hashing work
        if !is_valid_email(&email) {
            return Err(BreakwaterError::validation("Invalid email format"));
        }
        self.password_policy.check(&req.password)?;

        if self.user_creator.email_exists(&email).await? {
            return Err(BreakwaterError::validation("Email already registered"));
        }

        let hash = self.password_hasher.hash_blocking(req.password).await?;

        let user = self
            .user_creator
            .create_user(&email, &hash, req.name.as_deref())
            .await?;

        tracing::info!(
            target: "auth.register.completed",
            email = %email,
            "User registered"
        );

        Ok(user)
    }
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    // Basic validation - has @ and domain
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }

    let local = parts[0];
    let domain = parts[1];

    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
