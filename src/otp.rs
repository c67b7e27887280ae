//! Emailed one-time codes.
//!
//! Codes are six decimal digits derived from a per-user secret and the
//! current 1-minute time step. They are generated and verified on the same
//! server, so there is no authenticator-app clock to sync against and no
//! RFC 6238 compliance to uphold; the derivation only needs to be fixed,
//! one-way, and unguessable within the validity window.
//!
//! [`OtpEngine::verify`] accepts a code for the current step and the nine
//! steps before it, giving a one-sided window of roughly ten minutes. Codes
//! from future steps are never accepted.

use rand::RngCore;
use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Width of one time step.
const STEP: Duration = Duration::from_secs(60);

/// How many past steps [`OtpEngine::verify`] searches, current step included.
const BACKWARD_STEPS: u64 = 10;

const CODE_DIGITS: usize = 6;

/// A code together with the instant it was derived for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    /// Six decimal digits, zero-padded.
    pub code: String,
    /// The instant the code was generated at.
    pub issued_at: SystemTime,
}

/// Deterministic, secret-keyed time-stepped code generator and verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct OtpEngine;

impl OtpEngine {
    pub fn new() -> Self {
        Self
    }

    /// Generate the code for `secret` at `now`.
    pub fn generate(&self, secret: &str, now: SystemTime) -> IssuedCode {
        IssuedCode {
            code: self.code_at(secret, now),
            issued_at: now,
        }
    }

    /// The code for the time step containing `at`.
    ///
    /// Deterministic: the same `(secret, step)` pair always yields the same
    /// six digits.
    pub fn code_at(&self, secret: &str, at: SystemTime) -> String {
        code_for_step(secret, time_step(at))
    }

    /// Check `input` against the codes of the current step and the nine
    /// steps before it.
    ///
    /// The window is asymmetric on purpose: a code issued in the past stays
    /// valid until its step falls out of the search range, but a code from a
    /// future step never matches.
    pub fn verify(&self, input: &str, secret: &str, now: SystemTime) -> bool {
        let current = time_step(now);
        (0..BACKWARD_STEPS)
            .filter_map(|back| current.checked_sub(back))
            .any(|step| code_for_step(secret, step) == input)
    }
}

/// Generate a fresh per-user secret: 20 random bytes, hex-encoded.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 20];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn time_step(at: SystemTime) -> u64 {
    let millis = at
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64;
    millis / STEP.as_millis() as u64
}

fn code_for_step(secret: &str, step: u64) -> String {
    let digest = Sha256::digest(format!("{secret}{step}").as_bytes());

    // Final byte picks where in the digest to read from, bounded so six
    // bytes always fit.
    let offset = digest[digest.len() - 1] as usize % (digest.len() - CODE_DIGITS);
    let value = digest[offset..offset + CODE_DIGITS]
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));

    format!("{:06}", value % 1_000_000)
}
