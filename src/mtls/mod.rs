//! Mutual TLS material for the server and the caller.

pub mod material;
pub mod verifier;

pub use material::TlsMaterial;
pub use verifier::{CertificateSummary, CertificateVerifier};
