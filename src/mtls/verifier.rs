//! Certificate checks performed when TLS material is loaded.
//!
//! Chain verification itself happens in the handshake; this only rejects
//! material that could never work and warns about upcoming expiry.

use chrono::{DateTime, Utc};
use rustls::pki_types::CertificateDer;
use std::time::Duration;
use tracing::warn;
use x509_parser::prelude::*;

use crate::error::LookupError;

/// Expiry closer than this is logged.
const EXPIRY_WARNING: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Subject and validity window of one certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    /// Distinguished name of the subject
    pub subject: String,
    /// Start of validity
    pub not_before: DateTime<Utc>,
    /// End of validity
    pub not_after: DateTime<Utc>,
}

/// Validity checks against a fixed clock.
pub struct CertificateVerifier {
    now: DateTime<Utc>,
}

impl CertificateVerifier {
    /// Verifier using the current time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Verifier using `now` as the current time.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Parses `der` and checks it is inside its validity window.
    pub fn verify(&self, der: &CertificateDer<'_>) -> Result<CertificateSummary, LookupError> {
        let (_, cert) = X509Certificate::from_der(der.as_ref()).map_err(|e| {
            LookupError::transport_setup(format!("failed to parse certificate: {e}"))
        })?;

        let summary = CertificateSummary {
            subject: cert.subject().to_string(),
            not_before: to_datetime(cert.validity().not_before.timestamp())?,
            not_after: to_datetime(cert.validity().not_after.timestamp())?,
        };

        if self.now < summary.not_before {
            return Err(LookupError::transport_setup(format!(
                "certificate '{}' not valid before {}",
                summary.subject, summary.not_before
            )));
        }
        if self.now > summary.not_after {
            return Err(LookupError::transport_setup(format!(
                "certificate '{}' expired at {}",
                summary.subject, summary.not_after
            )));
        }

        if let Ok(remaining) = (summary.not_after - self.now).to_std() {
            if remaining < EXPIRY_WARNING {
                warn!(
                    subject = %summary.subject,
                    not_after = %summary.not_after,
                    "Certificate expires soon"
                );
            }
        }

        Ok(summary)
    }
}

impl Default for CertificateVerifier {
    fn default() -> Self {
        Self::new()
    }
}

fn to_datetime(timestamp: i64) -> Result<DateTime<Utc>, LookupError> {
    DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
        LookupError::transport_setup(format!("certificate timestamp out of range: {timestamp}"))
    })
}
