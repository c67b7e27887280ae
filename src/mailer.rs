//! Out-of-band delivery of codes and reset links.
//!
//! The flows never talk to SMTP directly: they build an [`Email`] and hand it
//! to an injected [`Mailer`], so tests can substitute a recording mailer and
//! deployments can plug in whatever transport they run.

use crate::error::{BreakwaterError, Result};
use async_trait::async_trait;

/// An email message to be sent.
#[derive(Debug, Clone)]
pub struct Email {
    /// Sender address (e.g., "noreply@example.com").
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body (optional if html is provided).
    pub text: Option<String>,
    /// HTML body (optional if text is provided).
    pub html: Option<String>,
}

impl Email {
    pub fn new(from: impl Into<String>, to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            text: None,
            html: None,
        }
    }

    /// Set the plain text body.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.text = Some(body.into());
        self
    }

    /// Set the HTML body.
    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.html = Some(body.into());
        self
    }

    /// Validate the email has the required fields.
    pub fn validate(&self) -> Result<()> {
        if self.from.is_empty() {
            return Err(BreakwaterError::validation("Email 'from' is required"));
        }
        if self.to.is_empty() {
            return Err(BreakwaterError::validation("Email 'to' is required"));
        }
        if self.subject.is_empty() {
            return Err(BreakwaterError::validation("Email 'subject' is required"));
        }
        if self.text.is_none() && self.html.is_none() {
            return Err(BreakwaterError::validation(
                "Email must have either 'text' or 'html' body",
            ));
        }
        Ok(())
    }
}

/// Mailer trait for sending emails.
///
/// Fire-and-forget from the flows' perspective: once a challenge or token has
/// been persisted, a delivery failure is logged and the user can request a
/// resend, but the issuance itself stands.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send an email.
    async fn send(&self, email: &Email) -> Result<()>;
}

/// Which flow a verification code belongs to. Drives subject and wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePurpose {
    EnableTwoFactor,
    DisableTwoFactor,
    Login,
}

impl CodePurpose {
    fn subject(self) -> &'static str {
        match self {
            Self::EnableTwoFactor => "Two-Factor Authentication Setup",
            Self::DisableTwoFactor => "Disable Two-Factor Authentication",
            Self::Login => "Login Verification Code",
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            Self::EnableTwoFactor => {
                "Use this code to complete your two-factor authentication setup."
            }
            Self::DisableTwoFactor => {
                "This code will be used to disable two-factor authentication on your account."
            }
            Self::Login => "Use this code to complete your login.",
        }
    }
}

/// Build the message carrying a one-time verification code.
pub fn verification_code_email(
    from: &str,
    to: &str,
    username: &str,
    code: &str,
    purpose: CodePurpose,
) -> Email {
    let text = format!(
        "Hello {username},\n\n\
         Your verification code is: {code}\n\n\
         This code will expire in 10 minutes.\n\n\
         {}\n\n\
         If you didn't request this code, please ignore this email.\n",
        purpose.instruction()
    );
    let html = format!(
        "<h1>{}</h1>\
         <p>Hello {username},</p>\
         <p>Your verification code is: <strong>{code}</strong></p>\
         <p>This code will expire in 10 minutes.</p>\
         <p>{}</p>\
         <p>If you didn't request this code, please ignore this email.</p>",
        purpose.subject(),
        purpose.instruction()
    );

    Email::new(from, to, purpose.subject()).text(text).html(html)
}

/// Build the password-reset message carrying the reset link.
pub fn password_reset_email(from: &str, to: &str, username: &str, reset_url: &str) -> Email {
    let text = format!(
        "Hello {username},\n\n\
         We received a request to reset your password. Open the link below to \
         choose a new one. The link expires in 1 hour.\n\n\
         {reset_url}\n\n\
         If you didn't request a password reset, you can safely ignore this \
         email.\n"
    );
    let html = format!(
        "<h1>Reset your password</h1>\
         <p>Hello {username},</p>\
         <p>We received a request to reset your password. The link below \
         expires in 1 hour.</p>\
         <p><a href=\"{reset_url}\">Reset password</a></p>\
         <p>If you didn't request a password reset, you can safely ignore \
         this email.</p>"
    );

    Email::new(from, to, "Reset your password").text(text).html(html)
}

/// A mailer that prints emails to stdout instead of sending them.
///
/// For development only: body content may carry codes and reset tokens, and
/// stdout is often captured by log collectors. Bodies are redacted unless
/// `with_full_output(true)` is set.
#[derive(Debug, Clone, Default)]
pub struct ConsoleMailer {
    show_full_content: bool,
}

impl ConsoleMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show full bodies. Development only.
    pub fn with_full_output(mut self, enabled: bool) -> Self {
        if enabled {
            tracing::warn!(
                "ConsoleMailer: full output enabled - email content will be visible in logs. \
                 Do not use in production!"
            );
        }
        self.show_full_content = enabled;
        self
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        email.validate()?;

        println!("[EMAIL] ════════════════════════════════════════");
        println!("[EMAIL] From:    {}", email.from);
        println!("[EMAIL] To:      {}", email.to);
        println!("[EMAIL] Subject: {}", email.subject);
        println!("[EMAIL] ────────────────────────────────────────");

        if self.show_full_content {
            if let Some(ref text) = email.text {
                for line in text.lines() {
                    println!("[EMAIL] {line}");
                }
            }
        } else if let Some(ref text) = email.text {
            println!("[EMAIL] [TEXT] {} bytes [REDACTED]", text.len());
        }

        println!("[EMAIL] ════════════════════════════════════════");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_email_carries_the_code() {
        let email =
            verification_code_email("noreply@app.test", "user@app.test", "Pat", "123456", CodePurpose::Login);

        assert_eq!(email.subject, "Login Verification Code");
        assert!(email.text.as_ref().unwrap().contains("123456"));
        assert!(email.html.as_ref().unwrap().contains("123456"));
        assert!(email.validate().is_ok());
    }

    #[test]
    fn code_email_subject_tracks_purpose() {
        let enable = verification_code_email("f@t", "t@t", "u", "1", CodePurpose::EnableTwoFactor);
        let disable = verification_code_email("f@t", "t@t", "u", "1", CodePurpose::DisableTwoFactor);
        assert_eq!(enable.subject, "Two-Factor Authentication Setup");
        assert_eq!(disable.subject, "Disable Two-Factor Authentication");
    }

    #[test]
    fn reset_email_carries_the_link() {
        let email = password_reset_email(
            "noreply@app.test",
            "user@app.test",
            "Pat",
            "https://app.test/reset-password/tok123",
        );
        assert!(email
            .text
            .as_ref()
            .unwrap()
            .contains("https://app.test/reset-password/tok123"));
    }

    #[test]
    fn email_validation_requires_a_body() {
        let email = Email::new("from@test.com", "to@test.com", "Subject");
        assert!(email.validate().is_err());
        assert!(email.text("body").validate().is_ok());
    }

    #[tokio::test]
    async fn console_mailer_sends_without_error() {
        let mailer = ConsoleMailer::new();
        let email = Email::new("from@test.com", "to@test.com", "Test Subject").text("Test body");
        assert!(mailer.send(&email).await.is_ok());
    }
}
