//! User record storage trait.

use crate::challenge::ChallengeSlot;
use crate::error::Result;
use async_trait::async_trait;

/// Trait for the user-record operations the login and enrollment flows need.
///
/// # Example
///
/// ```rust,ignore
/// use breakwater::storage::UserStore;
/// use async_trait::async_trait;
///
/// struct MyUserStore {
///     db: DatabaseConnection,
/// }
///
/// #[async_trait]
/// impl UserStore for MyUserStore {
///     type User = MyUser;
///
///     async fn find_by_email(&self, email: &str) -> Result<Option<Self::User>> {
///         Ok(self.db.find_user_by_email(email).await?)
///     }
///
///     // ... implement other methods
/// }
/// ```
#[async_trait]
pub trait UserStore: Send + Sync {
    /// The user type returned by this store.
    type User: Send + Sync + Clone;

    /// Find a user by email address (case-insensitive).
    async fn find_by_email(&self, email: &str) -> Result<Option<Self::User>>;

    /// Find a user by their unique ID.
    async fn find_by_id(&self, id: &str) -> Result<Option<Self::User>>;

    /// Get the user's ID as a string.
    fn user_id(&self, user: &Self::User) -> String;

    /// Get the user's email address.
    fn user_email(&self, user: &Self::User) -> String;

    /// Get the user's name (if available).
    fn user_name(&self, _user: &Self::User) -> Option<String> {
        None
    }

    /// Get the user's password hash.
    async fn password_hash(&self, user: &Self::User) -> Result<String>;

    /// Replace the user's password hash.
    async fn update_password_hash(&self, user_id: &str, hash: &str) -> Result<()>;

    /// Whether the user has two-factor authentication enabled.
    async fn two_factor_enabled(&self, user: &Self::User) -> Result<bool>;

    /// Read the user's challenge slot.
    async fn challenge(&self, user_id: &str) -> Result<Option<ChallengeSlot>>;

    /// Replace the user's challenge slot in one write.
    ///
    /// The whole tagged value is swapped keyed on user id, so concurrent
    /// writers can race (last one wins) without ever leaving the slot holding
    /// two purposes at once.
    async fn set_challenge(&self, user_id: &str, slot: Option<ChallengeSlot>) -> Result<()>;

    /// Turn two-factor authentication on: set the flag and store `secret` as
    /// the persistent slot value in a single storage operation.
    async fn enable_two_factor(&self, user_id: &str, secret: &str) -> Result<()>;

    /// Turn two-factor authentication off: clear the flag and empty the slot
    /// in a single storage operation.
    async fn disable_two_factor(&self, user_id: &str) -> Result<()>;
}

/// Trait for creating new users during registration.
#[async_trait]
pub trait UserCreator: Send + Sync {
    /// The user type created by this store.
    type User: Send + Sync;

    /// Check if an email address is already registered.
    async fn email_exists(&self, email: &str) -> Result<bool>;

    /// Create a new user with the given credentials.
    ///
    /// New users start with two-factor authentication off and an empty
    /// challenge slot.
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<Self::User>;
}
