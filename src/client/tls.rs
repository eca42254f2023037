//! TLS policy for the outbound transport.

use std::path::{Path, PathBuf};

use reqwest::tls::{Certificate, Identity, Version};
use reqwest::ClientBuilder;
use serde::{Deserialize, Serialize};

use crate::client::error::ClientError;

/// TLS protocol versions the transport supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum TlsVersion {
    #[serde(rename = "1.2")]
    Tls12,
    #[serde(rename = "1.3")]
    Tls13,
}

impl From<TlsVersion> for Version {
    fn from(v: TlsVersion) -> Self {
        match v {
            TlsVersion::Tls12 => Version::TLS_1_2,
            TlsVersion::Tls13 => Version::TLS_1_3,
        }
    }
}

/// Client-side TLS behaviour. All paths point at PEM files.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsPolicy {
    /// Extra trust roots.
    pub ca_certs: Vec<PathBuf>,

    /// Keep the bundled root store alongside `ca_certs`.
    pub use_builtin_roots: bool,

    /// Client certificate chain for mutual TLS.
    pub client_cert: Option<PathBuf>,

    /// Private key matching `client_cert`.
    pub client_key: Option<PathBuf>,

    pub min_version: Option<TlsVersion>,
    pub max_version: Option<TlsVersion>,

    /// Accept any server certificate. Test environments only.
    pub insecure_skip_verify: bool,
}

impl Default for TlsPolicy {
    fn default() -> Self {
        Self {
            ca_certs: Vec::new(),
            use_builtin_roots: true,
            client_cert: None,
            client_key: None,
            min_version: None,
            max_version: None,
            insecure_skip_verify: false,
        }
    }
}

impl TlsPolicy {
    /// Configure `builder` with this policy.
    pub fn apply(&self, mut builder: ClientBuilder) -> Result<ClientBuilder, ClientError> {
        builder = builder
            .use_rustls_tls()
            .tls_built_in_root_certs(self.use_builtin_roots);

        for path in &self.ca_certs {
            let pem = read_pem(path)?;
            let cert = Certificate::from_pem(&pem)
                .map_err(|e| ClientError::Config(format!("invalid CA certificate {:?}: {}", path, e)))?;
            builder = builder.add_root_certificate(cert);
        }

        match (&self.client_cert, &self.client_key) {
            (Some(cert_path), Some(key_path)) => {
                let mut pem = read_pem(cert_path)?;
                pem.push(b'\n');
                pem.extend(read_pem(key_path)?);
                let identity = Identity::from_pem(&pem)
                    .map_err(|e| ClientError::Config(format!("invalid client identity: {}", e)))?;
                builder = builder.identity(identity);
            }
            (None, None) => {}
            _ => {
                return Err(ClientError::Config(
                    "client_cert and client_key must be set together".to_string(),
                ))
            }
        }

        if let Some(min) = self.min_version {
            builder = builder.min_tls_version(min.into());
        }
        if let Some(max) = self.max_version {
            builder = builder.max_tls_version(max.into());
        }
        if self.insecure_skip_verify {
            tracing::warn!("TLS certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(builder)
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, ClientError> {
    if !path.exists() {
        return Err(ClientError::Config(format!("PEM file not found: {:?}", path)));
    }
    std::fs::read(path).map_err(|e| ClientError::Config(format!("failed to read {:?}: {}", path, e)))
}
