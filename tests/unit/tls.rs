//! TLS Material Unit Tests

use std::path::PathBuf;

use mccmnc_lookup::config::TlsPaths;
use mccmnc_lookup::mtls::CertificateVerifier;
use mccmnc_lookup::TlsMaterial;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/x509")
        .join(name)
}

#[test]
fn test_load_server_and_client_fixtures() {
    for side in ["server", "client"] {
        let paths = TlsPaths {
            cert: fixture(&format!("{side}-cert.pem")),
            key: fixture(&format!("{side}-key.pem")),
            ca_cert: fixture("ca-cert.pem"),
        };
        assert!(TlsMaterial::load(&paths).is_ok(), "{side}");
    }
}

#[test]
fn test_mismatched_files_are_rejected() {
    let paths = TlsPaths {
        cert: fixture("server-key.pem"),
        key: fixture("server-cert.pem"),
        ca_cert: fixture("ca-cert.pem"),
    };
    assert!(TlsMaterial::load(&paths).is_err());
}

#[test]
fn test_leaf_certificates_are_in_validity_window() {
    let verifier = CertificateVerifier::new();
    for name in ["server-cert.pem", "client-cert.pem", "rogue-client-cert.pem"] {
        let pem = std::fs::read(fixture(name)).unwrap();
        let cert = rustls_pemfile::certs(&mut &pem[..]).next().unwrap().unwrap();
        let summary = verifier.verify(&cert).unwrap();
        assert!(summary.not_before < summary.not_after, "{name}");
    }
}
