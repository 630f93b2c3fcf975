/*
 * tls.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Centralino, an asynchronous HTTP and WebSocket
 * toolkit.
 *
 * Centralino is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Centralino is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Centralino.  If not, see <http://www.gnu.org/licenses/>.
 */

//! TLS configuration: client trust (platform certificate directories with
//! webpki-roots fallback), peer verification modes, and server acceptors
//! built from PEM certificate/key pairs.
//!
//! The root store is a lazy process-wide singleton, read-only after init.
//! rustls drives its own record pump over the async stream, so handshake and
//! record I/O suspend on the connection like any other operation.

use std::sync::{Arc, OnceLock};

use rustls_pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::client::ClientConfig;
use tokio_rustls::rustls::server::ServerConfig;
use tokio_rustls::rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio_rustls::{TlsAcceptor, TlsConnector};

use crate::error::{Error, Result};

/// Build a root certificate store: platform native certs first (standard
/// directories such as /etc/ssl/certs), then webpki-roots as fallback.
fn build_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    if let Ok(certs) = rustls_native_certs::load_native_certs() {
        for cert in certs {
            let _ = root_store.add(cert);
        }
    }
    if root_store.is_empty() {
        root_store.roots = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    }
    root_store
}

static ROOT_STORE: OnceLock<Arc<RootCertStore>> = OnceLock::new();

fn root_store() -> Arc<RootCertStore> {
    ROOT_STORE.get_or_init(|| Arc::new(build_root_store())).clone()
}

/// Peer certificate verification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyMode {
    /// Any chain error is fatal.
    #[default]
    Required,
    /// Chain errors are reported at debug level and ignored.
    Optional,
    /// No verification at all.
    None,
}

/// Client-side TLS configuration.
#[derive(Debug, Clone, Default)]
pub struct ClientTlsConfig {
    verify: VerifyMode,
    server_name: Option<String>,
}

impl ClientTlsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verify_mode(mut self, mode: VerifyMode) -> Self {
        self.verify = mode;
        self
    }

    /// Accept any peer certificate. For test fixtures and self-signed peers.
    pub fn allow_untrusted(mut self) -> Self {
        self.verify = VerifyMode::None;
        self
    }

    /// Override the name presented for SNI and verification; defaults to the
    /// connect host.
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    pub(crate) fn server_name(&self, host: &str) -> Result<ServerName<'static>> {
        let name = self.server_name.as_deref().unwrap_or(host);
        ServerName::try_from(name.to_string())
            .map_err(|_| Error::Tls(format!("invalid server name {:?}", name)))
    }

    pub(crate) fn connector(&self) -> TlsConnector {
        let config = match self.verify {
            VerifyMode::Required => ClientConfig::builder()
                .with_root_certificates(root_store())
                .with_no_client_auth(),
            VerifyMode::Optional | VerifyMode::None => {
                let mut config = ClientConfig::builder()
                    .with_root_certificates(root_store())
                    .with_no_client_auth();
                config
                    .dangerous()
                    .set_certificate_verifier(Arc::new(Unverified {
                        report: self.verify == VerifyMode::Optional,
                    }));
                config
            }
        };
        TlsConnector::from(Arc::new(config))
    }
}

/// Server-side TLS configuration: certificate chain plus private key.
pub struct ServerTlsConfig {
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl ServerTlsConfig {
    /// Decode a PEM certificate chain and PEM private key.
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self> {
        let certs = rustls_pemfile::certs(&mut &cert_pem[..])
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| Error::Tls(format!("invalid certificate PEM: {}", e)))?;
        if certs.is_empty() {
            return Err(Error::Tls("no certificate in PEM".into()));
        }
        let key = rustls_pemfile::private_key(&mut &key_pem[..])
            .map_err(|e| Error::Tls(format!("invalid key PEM: {}", e)))?
            .ok_or_else(|| Error::Tls("no private key in PEM".into()))?;
        Ok(Self { certs, key })
    }

    pub(crate) fn acceptor(&self) -> Result<TlsAcceptor> {
        let config = ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(self.certs.clone(), self.key.clone_key())
            .map_err(|e| Error::Tls(e.to_string()))?;
        Ok(TlsAcceptor::from(Arc::new(config)))
    }
}

/// Verifier that accepts any chain. `report` controls whether skipped
/// verification is noted in the log.
#[derive(Debug)]
struct Unverified {
    report: bool,
}

impl ServerCertVerifier for Unverified {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls_pki_types::UnixTime,
    ) -> std::result::Result<ServerCertVerified, tokio_rustls::rustls::Error> {
        if self.report {
            log::debug!("accepting unverified certificate chain for {:?}", server_name);
        }
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA1,
            SignatureScheme::ECDSA_SHA1_Legacy,
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
            SignatureScheme::ED448,
        ]
    }
}
