//! TLS setup for the QUIC endpoint.
//!
//! The server presents either a file-backed certificate pair or a
//! runtime-generated self-signed certificate (CN=localhost, one-year
//! validity). Clients must present a certificate, but it is accepted
//! without validation: the wire protocol's own handshake carries the
//! real identity.

use std::sync::Arc;

use anyhow::Context;
use rustls::client::danger::HandshakeSignatureValid;
use rustls::crypto::WebPkiSupportedAlgorithms;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer, UnixTime};
use rustls::server::danger::{ClientCertVerified, ClientCertVerifier};
use rustls::{DigitallySignedStruct, DistinguishedName, SignatureScheme};

use crate::config::ServerConfig;

/// The application-layer protocol identifier, exactly these eight bytes.
pub const ALPN_PROTOCOL: &[u8] = b"hytale/1";

/// Requests a client certificate and accepts whatever arrives,
/// self-signed included.
#[derive(Debug)]
struct AcceptAnyClientCert {
    algorithms: WebPkiSupportedAlgorithms,
}

impl ClientCertVerifier for AcceptAnyClientCert {
    fn offer_client_auth(&self) -> bool {
        true
    }

    fn client_auth_mandatory(&self) -> bool {
        true
    }

    fn root_hint_subjects(&self) -> &[DistinguishedName] {
        &[]
    }

    fn verify_client_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _now: UnixTime,
    ) -> Result<ClientCertVerified, rustls::Error> {
        Ok(ClientCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

/// Build the rustls server config: configured cert/key files when both
/// are present, a fresh self-signed certificate otherwise.
pub fn build_server_crypto(config: &ServerConfig) -> anyhow::Result<rustls::ServerConfig> {
    let (certs, key) = match (&config.cert_path, &config.key_path) {
        (Some(cert_path), Some(key_path)) => load_credentials(cert_path, key_path)?,
        _ => generate_self_signed()?,
    };

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = Arc::new(AcceptAnyClientCert {
        algorithms: provider.signature_verification_algorithms,
    });
    let mut crypto = rustls::ServerConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS13])?
        .with_client_cert_verifier(verifier)
        .with_single_cert(certs, key)
        .context("invalid TLS credentials")?;
    crypto.alpn_protocols = vec![ALPN_PROTOCOL.to_vec()];
    Ok(crypto)
}

fn load_credentials(
    cert_path: &str,
    key_path: &str,
) -> anyhow::Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let certs = CertificateDer::pem_file_iter(cert_path)
        .with_context(|| format!("reading certificate {cert_path}"))?
        .collect::<Result<Vec<_>, _>>()?;
    let key = PrivateKeyDer::from_pem_file(key_path)
        .with_context(|| format!("reading private key {key_path}"))?;
    Ok((certs, key))
}

fn generate_self_signed() -> anyhow::Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)>
{
    let mut params = rcgen::CertificateParams::new(vec!["localhost".to_owned()])?;
    params.distinguished_name = rcgen::DistinguishedName::new();
    params
        .distinguished_name
        .push(rcgen::DnType::CommonName, "localhost");
    let now = time::OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + time::Duration::days(365);

    let key_pair = rcgen::KeyPair::generate()?;
    let cert = params.self_signed(&key_pair)?;
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));
    Ok((vec![cert.der().clone()], key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_signed_config_builds() {
        let config = ServerConfig::default();
        let crypto = build_server_crypto(&config).unwrap();
        assert_eq!(crypto.alpn_protocols, vec![b"hytale/1".to_vec()]);
    }

    #[test]
    fn alpn_is_eight_ascii_bytes() {
        assert_eq!(ALPN_PROTOCOL.len(), 8);
        assert!(ALPN_PROTOCOL.is_ascii());
    }
}
