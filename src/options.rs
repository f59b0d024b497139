//! The minimal, pre-validated connection configuration `Session::connect`
//! accepts. Parsing a connection string or loading certificates from disk
//! is a collaborator's job; this struct only validates the shape of
//! already-resolved fields.

use std::sync::Arc;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslMode {
    None,
    Preferred,
    Required,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub fn requires_tls(self) -> bool {
        !matches!(self, SslMode::None)
    }

    pub fn verifies_server_identity(self) -> bool {
        matches!(self, SslMode::VerifyCa | SslMode::VerifyFull)
    }
}

/// Supplies the root-of-trust material for a TLS upgrade. Loading files or
/// querying a platform trust store is the implementor's concern; this core
/// only consumes the resulting bytes.
pub trait CertificateProvider: Send + Sync {
    /// PEM-encoded root certificates to trust, in addition to (or instead
    /// of) the platform trust store, depending on `SslMode`.
    fn root_certificates_pem(&self) -> Result<Vec<u8>>;
}

#[derive(Clone)]
pub struct ConnectOptions {
    pub hosts: Vec<String>,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub database: Option<String>,
    pub ssl_mode: SslMode,
    pub cert_provider: Option<Arc<dyn CertificateProvider>>,
}

impl ConnectOptions {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            hosts: Vec::new(),
            port: 3306,
            username: username.into(),
            password: None,
            database: None,
            ssl_mode: SslMode::Preferred,
            cert_provider: None,
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.hosts.push(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn ssl_mode(mut self, ssl_mode: SslMode) -> Self {
        self.ssl_mode = ssl_mode;
        self
    }

    pub fn cert_provider(mut self, provider: Arc<dyn CertificateProvider>) -> Self {
        self.cert_provider = Some(provider);
        self
    }

    /// Pure, in-memory validation; never touches the network or disk.
    pub fn validate(&self) -> Result<()> {
        if self.hosts.is_empty() {
            return Err(Error::Config("hosts must not be empty".into()));
        }
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".into()));
        }
        Ok(())
    }
}
