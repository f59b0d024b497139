//! TLS upgrade orchestration: take the plain socket the handshake has been
//! speaking on so far, perform the handshake, and hand back a
//! [`ByteHandler`] wrapping the encrypted stream.
//!
//! The socket is upgraded in place: build a connector from the trust
//! store, perform the handshake, and swap the byte handler for one that
//! reads and writes through the TLS session instead of the raw socket.
//! Trust roots come from an injected [`CertificateProvider`] rather than a
//! hard-coded loader.
//!
//! Every `SslMode` that requests TLS at all is verified against a trust
//! root store (the platform-independent `webpki-roots` bundle, plus
//! whatever the `CertificateProvider` supplies); this core does not carry
//! an intentionally-insecure "encrypt but don't authenticate the server"
//! path.

#![cfg(feature = "tls")]

use std::sync::Arc;

use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::error::{Error, Result};
use crate::options::CertificateProvider;
use crate::transport::ByteHandler;

fn build_root_store(cert_provider: Option<&Arc<dyn CertificateProvider>>) -> Result<RootCertStore> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    if let Some(provider) = cert_provider {
        let pem = provider.root_certificates_pem()?;
        for cert in rustls_pemfile::certs(&mut pem.as_slice()) {
            let cert = cert.map_err(|e| Error::Tls(format!("invalid PEM certificate: {e}")))?;
            roots
                .add(cert)
                .map_err(|e| Error::Tls(format!("invalid root certificate: {e}")))?;
        }
    }

    Ok(roots)
}

pub async fn upgrade(
    stream: TcpStream,
    host: &str,
    cert_provider: Option<&Arc<dyn CertificateProvider>>,
) -> Result<ByteHandler> {
    let roots = build_root_store(cert_provider)?;
    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let connector = TlsConnector::from(Arc::new(config));
    let server_name = ServerName::try_from(host.to_owned())
        .map_err(|_| Error::Tls(format!("invalid server name for TLS: {host}")))?;

    let tls_stream = connector
        .connect(server_name, stream)
        .await
        .map_err(|e| Error::Tls(e.to_string()))?;

    Ok(ByteHandler::tls(tls_stream))
}
