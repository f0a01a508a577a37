//! Access gate state machine.
//!
//! # Responsibility
//! - Decide whether callers may use the place store.
//! - Report why authentication could not run.
//!
//! # Invariants
//! - A gate starts `Locked` on every construction.
//! - `Locked -> Unlocked` only through a `Verified` outcome.
//! - No transition leaves `Unlocked`.
//! - Failed or cancelled prompts set no error message; an unavailable
//!   verifier sets the message and the display flag.

use crate::auth::verifier::{BiometricVerifier, VerificationOutcome};
use log::{info, warn};

/// Message shown when the host cannot verify the device owner.
pub const AUTH_UNAVAILABLE_MESSAGE: &str = "An error occurred while trying to authenticate.";
/// Justification passed to the verification prompt.
pub const UNLOCK_REASON: &str = "Please authenticate yourself to unlock your places.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    Locked,
    Unlocked,
}

impl AccessState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
        }
    }
}

/// Two-state authenticator in front of the place store.
pub struct AccessGate<V: BiometricVerifier> {
    verifier: V,
    state: AccessState,
    auth_error_message: String,
    showing_auth_error: bool,
    attempts: u32,
}

impl<V: BiometricVerifier> AccessGate<V> {
    pub fn new(verifier: V) -> Self {
        Self {
            verifier,
            state: AccessState::Locked,
            auth_error_message: String::new(),
            showing_auth_error: false,
            attempts: 0,
        }
    }

    /// Runs one authentication attempt.
    ///
    /// Returns the state after the attempt. Calling this while already
    /// unlocked returns immediately without consulting the verifier.
    pub async fn authenticate(&mut self) -> AccessState {
        if self.is_unlocked() {
            return self.state;
        }
        self.attempts += 1;

        if let Err(reason) = self.verifier.availability() {
            warn!(
                "event=auth_attempt module=auth status=unavailable attempt={} reason={}",
                self.attempts, reason
            );
            self.auth_error_message = AUTH_UNAVAILABLE_MESSAGE.to_string();
            self.showing_auth_error = true;
            return self.state;
        }

        let outcome = self.verifier.verify(UNLOCK_REASON).await;
        self.complete(outcome)
    }

    /// Applies a verification outcome.
    ///
    /// Idempotent: outcomes arriving after the gate is unlocked are ignored.
    pub fn complete(&mut self, outcome: VerificationOutcome) -> AccessState {
        if self.is_unlocked() {
            return self.state;
        }
        match outcome {
            VerificationOutcome::Verified => {
                self.state = AccessState::Unlocked;
                self.showing_auth_error = false;
                info!(
                    "event=auth_attempt module=auth status=ok attempt={}",
                    self.attempts
                );
            }
            VerificationOutcome::Failed | VerificationOutcome::Cancelled => {
                info!(
                    "event=auth_attempt module=auth status=denied attempt={} outcome={}",
                    self.attempts,
                    outcome.as_str()
                );
            }
        }
        self.state
    }

    /// Hides the error alert; the message stays readable.
    pub fn dismiss_auth_error(&mut self) {
        self.showing_auth_error = false;
    }

    pub fn state(&self) -> AccessState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == AccessState::Unlocked
    }

    pub fn auth_error_message(&self) -> &str {
        &self.auth_error_message
    }

    pub fn showing_auth_error(&self) -> bool {
        self.showing_auth_error
    }

    /// Number of attempts made while locked.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessGate, AccessState, AUTH_UNAVAILABLE_MESSAGE};
    use crate::auth::verifier::{StaticVerifier, VerificationOutcome, VerifierUnavailable};

    #[test]
    fn gate_starts_locked_without_error() {
        let gate = AccessGate::new(StaticVerifier::available(VerificationOutcome::Verified));
        assert_eq!(gate.state(), AccessState::Locked);
        assert!(gate.auth_error_message().is_empty());
        assert!(!gate.showing_auth_error());
    }

    #[test]
    fn late_completion_after_unlock_is_ignored() {
        let mut gate = AccessGate::new(StaticVerifier::available(VerificationOutcome::Verified));
        assert_eq!(
            gate.complete(VerificationOutcome::Verified),
            AccessState::Unlocked
        );
        assert_eq!(
            gate.complete(VerificationOutcome::Cancelled),
            AccessState::Unlocked
        );
    }

    #[test]
    fn failed_completion_keeps_gate_locked_silently() {
        let mut gate = AccessGate::new(StaticVerifier::unavailable(
            VerifierUnavailable::NotEnrolled,
        ));
        assert_eq!(
            gate.complete(VerificationOutcome::Failed),
            AccessState::Locked
        );
        assert!(gate.auth_error_message().is_empty());
    }

    #[test]
    fn unlock_clears_error_flag_left_by_unsupported_attempt() {
        let mut gate = AccessGate::new(StaticVerifier::available(VerificationOutcome::Verified));
        gate.auth_error_message = AUTH_UNAVAILABLE_MESSAGE.to_string();
        gate.showing_auth_error = true;

        assert_eq!(
            gate.complete(VerificationOutcome::Verified),
            AccessState::Unlocked
        );
        assert!(!gate.showing_auth_error());
    }

    #[test]
    fn dismiss_keeps_message() {
        let mut gate = AccessGate::new(StaticVerifier::available(VerificationOutcome::Failed));
        gate.auth_error_message = AUTH_UNAVAILABLE_MESSAGE.to_string();
        gate.showing_auth_error = true;

        gate.dismiss_auth_error();
        assert!(!gate.showing_auth_error());
        assert_eq!(gate.auth_error_message(), AUTH_UNAVAILABLE_MESSAGE);
    }
}
