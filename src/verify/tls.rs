//! rustls client configurations for each [`TlsPolicy`].

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{ring, CryptoProvider};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::error_handling::InitializationError;

use super::types::TlsPolicy;

/// Builds the client configuration shared by the HTTP and WebSocket probes.
///
/// # Errors
///
/// Fails when the CA bundle cannot be read or holds no usable certificate.
pub fn client_config(policy: &TlsPolicy) -> Result<Arc<ClientConfig>, InitializationError> {
    let provider = Arc::new(ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| InitializationError::TlsConfigError(e.to_string()))?;

    let config = match policy {
        TlsPolicy::Verify => {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            builder.with_root_certificates(roots).with_no_client_auth()
        }
        TlsPolicy::CaBundle(path) => {
            let bundle_error =
                |e: &dyn std::fmt::Display| InitializationError::CaBundleError(format!("{}: {e}", path.display()));
            let mut roots = RootCertStore::empty();
            for cert in CertificateDer::pem_file_iter(path).map_err(|e| bundle_error(&e))? {
                let cert = cert.map_err(|e| bundle_error(&e))?;
                roots.add(cert).map_err(|e| bundle_error(&e))?;
            }
            if roots.is_empty() {
                return Err(bundle_error(&"no certificates found"));
            }
            builder.with_root_certificates(roots).with_no_client_auth()
        }
        TlsPolicy::Insecure => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoCertificateVerification(provider)))
            .with_no_client_auth(),
    };
    Ok(Arc::new(config))
}

/// Accepts every server certificate.
#[derive(Debug)]
struct NoCertificateVerification(Arc<CryptoProvider>);

impl ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_verify_and_insecure_configs_build() {
        assert!(client_config(&TlsPolicy::Verify).is_ok());
        assert!(client_config(&TlsPolicy::Insecure).is_ok());
    }

    #[test]
    fn test_missing_ca_bundle_is_an_error() {
        let err = client_config(&TlsPolicy::CaBundle(PathBuf::from("/nonexistent/ca.pem")))
            .unwrap_err();
        assert!(matches!(err, InitializationError::CaBundleError(_)));
    }

    #[test]
    fn test_ca_bundle_without_certificates_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.pem");
        std::fs::write(&path, "not a certificate\n").unwrap();
        let err = client_config(&TlsPolicy::CaBundle(path)).unwrap_err();
        assert!(err.to_string().contains("no certificates found"));
    }

    #[test]
    fn test_policy_from_flags() {
        let ca = PathBuf::from("ca.pem");
        assert_eq!(TlsPolicy::from_flags(false, None), TlsPolicy::Verify);
        assert_eq!(TlsPolicy::from_flags(false, Some(&ca)), TlsPolicy::CaBundle(ca.clone()));
        assert_eq!(TlsPolicy::from_flags(true, Some(&ca)), TlsPolicy::Insecure);
    }
}
