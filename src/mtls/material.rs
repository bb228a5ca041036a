//! PEM-encoded identity and trust root for one side of an mTLS connection.
//!
//! Both sides are built from the same three pieces: a certificate chain, its
//! private key, and the issuer the peer must chain to. Everything is parsed
//! eagerly so broken files fail at startup instead of at the first handshake.

use std::path::Path;

use rustls::pki_types::CertificateDer;
use tonic::transport::{Certificate, ClientTlsConfig, Identity, ServerTlsConfig};
use tracing::info;

use crate::config::TlsPaths;
use crate::error::LookupError;
use crate::mtls::verifier::CertificateVerifier;

/// Validated TLS material.
#[derive(Clone)]
pub struct TlsMaterial {
    cert_pem: Vec<u8>,
    key_pem: Vec<u8>,
    ca_pem: Vec<u8>,
}

impl TlsMaterial {
    /// Reads and validates the files named by `paths`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::TransportSetup`] if a file is unreadable or its
    /// content is not usable.
    pub fn load(paths: &TlsPaths) -> Result<Self, LookupError> {
        let material = Self::from_pem(
            read_pem(&paths.cert, "certificate")?,
            read_pem(&paths.key, "private key")?,
            read_pem(&paths.ca_cert, "trusted issuer bundle")?,
        )?;
        info!(
            cert = %paths.cert.display(),
            ca_cert = %paths.ca_cert.display(),
            "TLS material loaded"
        );
        Ok(material)
    }

    /// Validates in-memory PEM material.
    pub fn from_pem(
        cert_pem: impl Into<Vec<u8>>,
        key_pem: impl Into<Vec<u8>>,
        ca_pem: impl Into<Vec<u8>>,
    ) -> Result<Self, LookupError> {
        let material = Self {
            cert_pem: cert_pem.into(),
            key_pem: key_pem.into(),
            ca_pem: ca_pem.into(),
        };

        let verifier = CertificateVerifier::new();
        for cert in parse_certs(&material.cert_pem, "certificate")? {
            verifier.verify(&cert)?;
        }
        for cert in parse_certs(&material.ca_pem, "trusted issuer bundle")? {
            verifier.verify(&cert)?;
        }
        check_private_key(&material.key_pem)?;

        Ok(material)
    }

    /// Server side: present our identity, require a client certificate
    /// issued by the trusted root.
    pub fn server_tls_config(&self) -> ServerTlsConfig {
        ServerTlsConfig::new()
            .identity(self.identity())
            .client_ca_root(Certificate::from_pem(&self.ca_pem))
    }

    /// Caller side: present our identity, accept only a server certificate
    /// issued by the trusted root for `domain`.
    pub fn client_tls_config(&self, domain: impl Into<String>) -> ClientTlsConfig {
        ClientTlsConfig::new()
            .ca_certificate(Certificate::from_pem(&self.ca_pem))
            .identity(self.identity())
            .domain_name(domain)
    }

    fn identity(&self) -> Identity {
        Identity::from_pem(&self.cert_pem, &self.key_pem)
    }
}

impl std::fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsMaterial").finish_non_exhaustive()
    }
}

fn read_pem(path: &Path, what: &str) -> Result<Vec<u8>, LookupError> {
    std::fs::read(path).map_err(|e| {
        LookupError::transport_setup(format!("failed to read {what} {}: {e}", path.display()))
    })
}

fn parse_certs(pem: &[u8], what: &str) -> Result<Vec<CertificateDer<'static>>, LookupError> {
    let certs = rustls_pemfile::certs(&mut &pem[..])
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| LookupError::transport_setup(format!("failed to parse {what}: {e}")))?;
    if certs.is_empty() {
        return Err(LookupError::transport_setup(format!(
            "no PEM certificate found in {what}"
        )));
    }
    Ok(certs)
}

fn check_private_key(pem: &[u8]) -> Result<(), LookupError> {
    let key = rustls_pemfile::private_key(&mut &pem[..])
        .map_err(|e| LookupError::transport_setup(format!("failed to parse private key: {e}")))?
        .ok_or_else(|| LookupError::transport_setup("no PEM private key found"))?;
    rustls::crypto::ring::sign::any_supported_type(&key)
        .map_err(|e| LookupError::transport_setup(format!("unsupported private key: {e}")))?;
    Ok(())
}
