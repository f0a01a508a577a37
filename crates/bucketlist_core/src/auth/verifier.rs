//! Device-owner verification contracts.
//!
//! The platform's biometric prompt lives outside the core. Hosts adapt it to
//! [`BiometricVerifier`] and the gate drives it.

use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};

/// Result of one completed verification prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    /// The prompt ran and the owner was not recognized.
    Failed,
    /// The owner or the system dismissed the prompt.
    Cancelled,
}

impl VerificationOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Reason why verification cannot run on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifierUnavailable {
    NotSupported,
    NotEnrolled,
    Other(String),
}

impl Display for VerifierUnavailable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSupported => write!(f, "biometric verification is not supported"),
            Self::NotEnrolled => write!(f, "no biometric identity is enrolled"),
            Self::Other(message) => write!(f, "biometric verification unavailable: {message}"),
        }
    }
}

impl Error for VerifierUnavailable {}

/// Host verification mechanism.
///
/// `verify` may suspend until the owner answers the prompt.
#[async_trait]
pub trait BiometricVerifier: Send + Sync {
    fn availability(&self) -> Result<(), VerifierUnavailable>;
    async fn verify(&self, reason: &str) -> VerificationOutcome;
}

/// Verifier with fixed availability and outcome.
#[derive(Debug, Clone)]
pub struct StaticVerifier {
    availability: Result<(), VerifierUnavailable>,
    outcome: VerificationOutcome,
}

impl StaticVerifier {
    pub fn available(outcome: VerificationOutcome) -> Self {
        Self {
            availability: Ok(()),
            outcome,
        }
    }

    pub fn unavailable(reason: VerifierUnavailable) -> Self {
        Self {
            availability: Err(reason),
            outcome: VerificationOutcome::Failed,
        }
    }
}

#[async_trait]
impl BiometricVerifier for StaticVerifier {
    fn availability(&self) -> Result<(), VerifierUnavailable> {
        self.availability.clone()
    }

    async fn verify(&self, _reason: &str) -> VerificationOutcome {
        self.outcome
    }
}

/// Verifier fed by a host that already ran the platform prompt.
///
/// Each `report` replaces the previous answer; before the first report the
/// host is treated as unsupported.
#[derive(Debug, Default)]
pub struct HostReportedVerifier {
    report: Mutex<Option<HostReport>>,
}

#[derive(Debug, Clone, Copy)]
struct HostReport {
    available: bool,
    outcome: VerificationOutcome,
}

impl HostReportedVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, available: bool, outcome: VerificationOutcome) {
        let mut slot = self.report.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(HostReport { available, outcome });
    }

    fn current(&self) -> Option<HostReport> {
        *self.report.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BiometricVerifier for HostReportedVerifier {
    fn availability(&self) -> Result<(), VerifierUnavailable> {
        match self.current() {
            Some(report) if report.available => Ok(()),
            _ => Err(VerifierUnavailable::NotSupported),
        }
    }

    async fn verify(&self, _reason: &str) -> VerificationOutcome {
        self.current()
            .map(|report| report.outcome)
            .unwrap_or(VerificationOutcome::Cancelled)
    }
}
