use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The main error type for breakwater flows.
///
/// Note that "second factor required" is deliberately *not* an error: it is an
/// expected branch of a successful credential check and lives in
/// [`crate::flows::LoginOutcome`]. Only genuine failures belong here.
#[derive(Debug, thiserror::Error)]
pub enum BreakwaterError {
    /// Malformed or policy-violating input, reported before any storage or
    /// hashing work happens.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No session or insufficient privilege for the requested operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad email/password pair. Deliberately indistinguishable from
    /// "no such account".
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A one-time code that does not match the pending challenge.
    #[error("Invalid verification code")]
    InvalidCode,

    /// A challenge older than its validity window. The caller must restart
    /// the flow that issued it.
    #[error("Verification code has expired")]
    ExpiredChallenge,

    /// Unknown, already-consumed, or expired reset token. The cases are
    /// deliberately merged so callers cannot probe which one applied.
    #[error("Invalid or expired reset token")]
    InvalidOrExpiredToken,

    /// Unexpected storage/delivery/hashing fault.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Standard error response body for API errors.
#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
    error_id: String,
}

impl BreakwaterError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::InvalidCode | Self::ExpiredChallenge | Self::InvalidOrExpiredToken => {
                StatusCode::BAD_REQUEST
            }
            Self::Internal(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to clients.
    ///
    /// 4xx variants already carry non-enumerating, user-facing text. Internal
    /// faults are collapsed to a generic message; the detail stays in the
    /// server-side log keyed by the generated error id.
    fn safe_message(&self) -> String {
        match self {
            Self::Internal(_) | Self::Anyhow(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for BreakwaterError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_id = uuid::Uuid::new_v4().to_string();

        // Full detail server-side only
        tracing::error!(
            status = status.as_u16(),
            error_id = %error_id,
            error = %self,
            "Request failed"
        );

        let body = Json(ErrorResponse {
            error: self.safe_message(),
            error_id,
        });

        (status, body).into_response()
    }
}

/// Result type alias for breakwater operations.
pub type Result<T> = std::result::Result<T, BreakwaterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error() {
        let err = BreakwaterError::validation("email is required");
        assert!(matches!(err, BreakwaterError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: email is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn credential_errors_are_unauthorized() {
        assert_eq!(
            BreakwaterError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            BreakwaterError::unauthorized("no session").status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn challenge_errors_are_bad_request() {
        assert_eq!(
            BreakwaterError::InvalidCode.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BreakwaterError::ExpiredChallenge.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BreakwaterError::InvalidOrExpiredToken.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn invalid_credentials_message_does_not_enumerate() {
        // Same message whether the account exists or not
        assert_eq!(
            BreakwaterError::InvalidCredentials.to_string(),
            "Invalid credentials"
        );
    }

    #[test]
    fn internal_detail_is_hidden() {
        let err = BreakwaterError::internal("db at 10.0.0.3:5432 unreachable");
        assert_eq!(err.safe_message(), "Internal server error");

        let err: BreakwaterError = anyhow::anyhow!("sensitive stack info").into();
        assert_eq!(err.safe_message(), "Internal server error");
    }

    #[test]
    fn client_errors_keep_their_message() {
        assert_eq!(
            BreakwaterError::InvalidOrExpiredToken.safe_message(),
            "Invalid or expired reset token"
        );
        assert_eq!(
            BreakwaterError::validation("password too short").safe_message(),
            "Validation failed: password too short"
        );
    }

    #[tokio::test]
    async fn into_response_sets_status() {
        let response = BreakwaterError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = BreakwaterError::internal("oops").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn response_body_has_error_id() {
        let response = BreakwaterError::ExpiredChallenge.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "Verification code has expired");
        assert!(uuid::Uuid::parse_str(json["error_id"].as_str().unwrap()).is_ok());
    }
}
