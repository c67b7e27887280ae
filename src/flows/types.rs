//! Request and outcome types for the authentication flows.

use serde::{Deserialize, Serialize};

/// Registration request.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// User's email address.
    pub email: String,
    /// User's password.
    pub password: String,
    /// User's name (optional).
    pub name: Option<String>,
}

/// Login request from client.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User's email address.
    pub email: String,
    /// User's password.
    pub password: String,
    /// Optional one-time code, supplied when the client resubmits
    /// credentials to resolve a pending step-up challenge.
    pub code: Option<String>,
}

/// Second step of a two-factor login.
#[derive(Debug, Clone, Deserialize)]
pub struct SecondFactorRequest {
    /// User's email address.
    pub email: String,
    /// The emailed verification code.
    pub code: String,
}

/// The identity handed to the caller once authentication completes.
///
/// Session or token issuance is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Result of a credential or second-factor submission.
///
/// `SecondFactorRequired` is an expected branch of a *successful* password
/// check, so it is a variant here rather than an error: callers must branch
/// on it explicitly and a generic error handler can never swallow it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginOutcome {
    /// Credentials (and second factor, where enabled) accepted.
    Authenticated { user: AuthenticatedUser },
    /// Password accepted, but a verification code has been emailed and must
    /// be submitted before the login completes.
    SecondFactorRequired { email: String },
}

/// Result of a confirmed two-factor enrollment challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TwoFactorUpdate {
    Enabled,
    Disabled,
}

/// Password reset request.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetRequest {
    /// User's email address.
    pub email: String,
}

/// Password reset completion request.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetComplete {
    /// The reset token from the email.
    pub token: String,
    /// The new password.
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_outcome_is_tagged() {
        let outcome = LoginOutcome::SecondFactorRequired {
            email: "user@example.com".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "second_factor_required");
        assert_eq!(json["email"], "user@example.com");
    }

    #[test]
    fn authenticated_outcome_carries_identity() {
        let outcome = LoginOutcome::Authenticated {
            user: AuthenticatedUser {
                id: "user-1".into(),
                email: "user@example.com".into(),
                name: None,
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "authenticated");
        assert_eq!(json["user"]["id"], "user-1");
        assert!(json["user"].get("name").is_none());
    }
}
