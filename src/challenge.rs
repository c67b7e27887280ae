//! The per-user challenge slot.
//!
//! Each account carries at most one secret-bearing value at a time: the
//! persistent two-factor secret, a transient enrollment challenge, or a
//! transient login challenge. Modelling the slot as a single enum makes the
//! illegal states (two purposes at once, a malformed encoding) unrepresentable
//! and forces every transition to pick exactly one purpose.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// How long an issued enrollment or login challenge stays confirmable.
pub const CHALLENGE_TTL: Duration = Duration::from_secs(10 * 60);

/// What a pending enrollment challenge will do once confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwoFactorAction {
    Enable,
    Disable,
}

/// The single mutable secret-purpose slot on a user record.
///
/// Invariant: `TwoFactorSecret` is present exactly when the account has
/// two-factor authentication enabled. The transient variants each carry the
/// secret they were derived from so the persistent state can be restored when
/// the challenge resolves or expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "purpose", rename_all = "snake_case")]
pub enum ChallengeSlot {
    /// The long-lived secret of a 2FA-enabled account.
    TwoFactorSecret { secret: String },

    /// A pending enable/disable confirmation. The expected code is recomputed
    /// from `secret` at the step containing `issued_at` and compared exactly,
    /// with a single absolute age check against [`CHALLENGE_TTL`].
    EnrollmentChallenge {
        secret: String,
        action: TwoFactorAction,
        issued_at: SystemTime,
    },

    /// A pending step-up login. `secret` is the suspended persistent secret;
    /// `code` is the literal value that was emailed and must match exactly.
    LoginChallenge {
        secret: String,
        code: String,
        issued_at: SystemTime,
    },
}

impl ChallengeSlot {
    /// The secret held by any variant.
    pub fn secret(&self) -> &str {
        match self {
            Self::TwoFactorSecret { secret }
            | Self::EnrollmentChallenge { secret, .. }
            | Self::LoginChallenge { secret, .. } => secret,
        }
    }
}

/// Absolute age check for a stored challenge.
///
/// An `issued_at` in the future (clock skew between nodes) counts as not
/// expired; expiry only triggers once the wall clock has moved past the TTL.
pub(crate) fn challenge_expired(issued_at: SystemTime, now: SystemTime, ttl: Duration) -> bool {
    now.duration_since(issued_at)
        .map(|age| age > ttl)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn t0() -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_040)
    }

    #[test]
    fn expiry_is_absolute() {
        let ttl = CHALLENGE_TTL;
        assert!(!challenge_expired(t0(), t0(), ttl));
        assert!(!challenge_expired(t0(), t0() + Duration::from_secs(600), ttl));
        assert!(challenge_expired(t0(), t0() + Duration::from_secs(601), ttl));
    }

    #[test]
    fn future_issuance_is_not_expired() {
        let issued = t0() + Duration::from_secs(120);
        assert!(!challenge_expired(issued, t0(), CHALLENGE_TTL));
    }

    #[test]
    fn every_variant_exposes_its_secret() {
        let slots = [
            ChallengeSlot::TwoFactorSecret {
                secret: "s".into(),
            },
            ChallengeSlot::EnrollmentChallenge {
                secret: "s".into(),
                action: TwoFactorAction::Enable,
                issued_at: t0(),
            },
            ChallengeSlot::LoginChallenge {
                secret: "s".into(),
                code: "123456".into(),
                issued_at: t0(),
            },
        ];
        for slot in &slots {
            assert_eq!(slot.secret(), "s");
        }
    }

    #[test]
    fn slot_serializes_with_purpose_tag() {
        let slot = ChallengeSlot::EnrollmentChallenge {
            secret: "s".into(),
            action: TwoFactorAction::Disable,
            issued_at: t0(),
        };
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["purpose"], "enrollment_challenge");
        assert_eq!(json["action"], "disable");
    }
}
